//! Draft composition: the one step that writes to the customer.
//!
//! Non-reply scenarios get a clarification or disambiguation message and
//! return to the user. Reply scenarios run a four-phase machine keyed by
//! `(issue_type, review_status)`; the phase is recomputed on every call,
//! never stored.
//!
//! Generation failures degrade to deterministic fallback text. The update
//! is built only after the message text is settled, so a failed generator
//! call writes nothing.

use crate::engine::StepContext;
use crate::llm::TextGenerator;
use crate::orders::Order;
use crate::state::{
    ConversationState, Message, Patch, ReviewStatus, Scenario, StateUpdate, StepName,
    issue_is_meaningful,
};

const SYSTEM_PERSONA: &str =
    "You are a concise, friendly customer-support agent. Write a short plain-text \
     message to the customer. Do not invent order data beyond the facts given.";

/// Reply-scenario phase, recomputed from two fields at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    /// An order is resolved but the issue is still unknown.
    Unknown,
    /// Awaiting (or about to request) admin review.
    Pending,
    Approved,
    Rejected,
}

impl DraftPhase {
    /// Pure function of `(issue_type, review_status)`.
    pub fn of(issue_type: Option<&str>, review_status: Option<ReviewStatus>) -> Self {
        if !issue_is_meaningful(issue_type) {
            return DraftPhase::Unknown;
        }
        match review_status {
            None | Some(ReviewStatus::Pending) => DraftPhase::Pending,
            Some(ReviewStatus::Approved) => DraftPhase::Approved,
            Some(ReviewStatus::Rejected) => DraftPhase::Rejected,
        }
    }
}

pub(crate) async fn draft_reply(state: &ConversationState, ctx: &StepContext<'_>) -> StateUpdate {
    match state.scenario {
        Some(Scenario::Reply) => draft_for_reply(state, ctx).await,
        scenario => draft_clarification(state, ctx, scenario).await,
    }
}

/// Clarification / disambiguation messages; never suspend.
async fn draft_clarification(
    state: &ConversationState,
    ctx: &StepContext<'_>,
    scenario: Option<Scenario>,
) -> StateUpdate {
    let (instruction, fallback) = match scenario {
        Some(Scenario::OrderNotFound) => {
            let id = state.order_id.as_deref().unwrap_or("that order");
            (
                format!("tell the customer no order matching {id} was found and ask them to double-check the order number"),
                format!(
                    "I couldn't find an order matching {id}. Could you double-check the order number and send it again?"
                ),
            )
        }
        Some(Scenario::NoOrdersFound) => {
            let email = state.email.as_deref().unwrap_or("that email address");
            (
                format!("tell the customer no orders are registered to {email} and ask them to verify the address or share an order number"),
                format!(
                    "I couldn't find any orders registered to {email}. Could you verify the email address, or share your order number instead?"
                ),
            )
        }
        Some(Scenario::ConfirmOrder) => {
            let listing = candidate_listing(state.candidate_orders.as_deref().unwrap_or(&[]));
            (
                format!("ask the customer which of these orders they mean:\n{listing}"),
                format!("I found several orders under your email:\n{listing}\nWhich one is this about?"),
            )
        }
        // NeedIdentifier, or a turn that never went through resolution
        _ => (
            "ask the customer for their order number or the email address used for the purchase"
                .to_string(),
            "Could you share your order number (like ORD1234) or the email address used for the \
             purchase so I can look into this?"
                .to_string(),
        ),
    };

    let text = generate_or(
        ctx.generator,
        &format!(
            "{}\n\nConversation so far:\n{}",
            instruction,
            transcript_excerpt(state)
        ),
        fallback,
    )
    .await;

    StateUpdate {
        append_messages: vec![Message::agent(text)],
        pending_step: Patch::Clear,
        ..Default::default()
    }
}

/// The reply phase machine.
async fn draft_for_reply(state: &ConversationState, ctx: &StepContext<'_>) -> StateUpdate {
    let phase = DraftPhase::of(state.issue_type.as_deref(), state.review_status);
    tracing::debug!(phase = ?phase, "drafting reply");

    let order = state.order_details.as_ref();
    let customer_name = order.map_or("there", |o| o.customer_name.as_str());
    let order_id = order.map_or("your order", |o| o.order_id.as_str());
    let issue_type = state.issue_type.as_deref().unwrap_or("general");

    match phase {
        DraftPhase::Unknown => {
            let fallback = format!(
                "Thanks for reaching out — could you describe the issue with order {order_id} in \
                 a bit more detail so I can get it to the right team?"
            );
            let text = generate_or(
                ctx.generator,
                &format!(
                    "The order is resolved but the issue is still unclear. Ask the customer to \
                     describe their problem with order {order_id}.\n\nConversation so far:\n{}",
                    transcript_excerpt(state)
                ),
                fallback,
            )
            .await;

            StateUpdate {
                append_messages: vec![Message::agent(text)],
                review_status: Patch::Clear,
                pending_step: Patch::Clear,
                ..Default::default()
            }
        }

        DraftPhase::Pending => {
            let mut fallback = format!(
                "Thanks {customer_name} — I've raised a ticket for the {issue} issue on order \
                 {order_id}. Our support team will review it and follow up shortly.",
                issue = issue_type.replace('_', " "),
            );
            if let Some(feedback) = state.admin_feedback.as_deref() {
                fallback.push_str(&format!("\n\n[Admin note: {feedback}]"));
            }

            let mut context = format!(
                "Acknowledge to {customer_name} that a support ticket was raised for a \
                 {issue_type} issue on order {order_id} and that the team will follow up. Do not \
                 promise a specific outcome.",
            );
            if let Some(feedback) = state.admin_feedback.as_deref() {
                context.push_str(&format!(
                    "\nA reviewer asked for changes to the previous draft: {feedback}. \
                     Address that in the new message."
                ));
            }
            context.push_str(&format!(
                "\n\nConversation so far:\n{}",
                transcript_excerpt(state)
            ));

            let text = generate_or(ctx.generator, &context, fallback).await;

            StateUpdate {
                append_messages: vec![Message::agent(text)],
                review_status: Patch::Set(ReviewStatus::Pending),
                pending_step: Patch::Set(StepName::AdminReview),
                ..Default::default()
            }
        }

        DraftPhase::Approved => {
            let action = state
                .suggested_action
                .as_deref()
                .map(first_line)
                .unwrap_or("the requested resolution");
            let fallback = format!(
                "Hi {customer_name}, good news — the review of order {order_id} is complete and \
                 we're going ahead: {action}"
            );
            let text = generate_or(
                ctx.generator,
                &format!(
                    "The reviewer approved this action for order {order_id}: {}\nConfirm it to \
                     {customer_name} in a warm, personal message.\n\nConversation so far:\n{}",
                    state.suggested_action.as_deref().unwrap_or(action),
                    transcript_excerpt(state)
                ),
                fallback,
            )
            .await;

            StateUpdate {
                append_messages: vec![Message::agent(text)],
                pending_step: Patch::Clear,
                ..Default::default()
            }
        }

        DraftPhase::Rejected => {
            let mut fallback = format!(
                "Hi {customer_name}, thanks for your patience. After review, we're unable to \
                 proceed with the requested action for order {order_id}. Reply here if you'd \
                 like us to take another look."
            );
            if let Some(feedback) = state.admin_feedback.as_deref() {
                fallback.push_str(&format!("\n\n[Admin note: {feedback}]"));
            }
            let text = generate_or(
                ctx.generator,
                &format!(
                    "The reviewer rejected the proposed action for order {order_id}. Let \
                     {customer_name} know politely, without blaming anyone.\n\nConversation so \
                     far:\n{}",
                    transcript_excerpt(state)
                ),
                fallback,
            )
            .await;

            StateUpdate {
                append_messages: vec![Message::agent(text)],
                pending_step: Patch::Clear,
                ..Default::default()
            }
        }
    }
}

/// Generate with the collaborator, fall back to deterministic text on any
/// failure or empty response.
async fn generate_or(
    generator: &dyn TextGenerator,
    user_context: &str,
    fallback: String,
) -> String {
    match generator.generate(SYSTEM_PERSONA, user_context).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => fallback,
        Err(e) => {
            tracing::warn!(error = %e, "draft generation failed, using fallback text");
            fallback
        }
    }
}

fn candidate_listing(candidates: &[Order]) -> String {
    candidates
        .iter()
        .map(|o| {
            let first_item = o
                .items
                .first()
                .map(|i| i.name.as_str())
                .unwrap_or("no items");
            format!("- {} ({}) — {}", o.order_id, o.status, first_item)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recent transcript lines for generator context. Prompt-size trimming is
/// a collaborator concern; the stored transcript itself is never truncated.
fn transcript_excerpt(state: &ConversationState) -> String {
    const EXCERPT: usize = 6;
    let skip = state.messages.len().saturating_sub(EXCERPT);
    state
        .messages
        .iter()
        .skip(skip)
        .map(|m| {
            let who = match m.role {
                crate::state::Role::User => "customer",
                crate::state::Role::Agent => "agent",
            };
            format!("{who}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}
