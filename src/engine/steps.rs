//! Step implementations.
//!
//! Every step is `(state, context) -> StateUpdate`: read-only on the
//! state, with all effects expressed in the returned update. The draft
//! step lives in its own module (`draft.rs`) because of its phase machine.

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{StepContext, draft};
use crate::error::EngineError;
use crate::state::{
    ConversationState, ISSUE_UNKNOWN, Message, Patch, ReviewStatus, RoutePath, Scenario,
    StateUpdate, StepName, issue_is_meaningful,
};

/// Dispatch table from step name to handler.
pub(crate) async fn dispatch(
    step: StepName,
    state: &ConversationState,
    ctx: &StepContext<'_>,
) -> Result<StateUpdate, EngineError> {
    match step {
        StepName::Ingest => Ok(ingest(state, ctx)),
        StepName::Classify => Ok(classify(state, ctx)),
        StepName::ResolveOrder => resolve_order(state, ctx).await,
        StepName::PrepareAction => Ok(prepare_action(state, ctx)),
        StepName::EvaluatePolicy => Ok(evaluate_policy(state, ctx).await),
        StepName::DraftReply => Ok(draft::draft_reply(state, ctx).await),
        StepName::AdminReview => admin_review(state),
        StepName::Finalize => Ok(finalize(state)),
    }
}

static ORDER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bord[0-9]{4}\b").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

/// First order id in the text, normalized to uppercase.
pub(crate) fn extract_order_id(text: &str) -> Option<String> {
    ORDER_ID_RE.find(text).map(|m| m.as_str().to_uppercase())
}

/// First email address in the text, normalized to lowercase.
pub(crate) fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase())
}

/// Ingest: record the user message, extract identifiers, decide the route.
fn ingest(state: &ConversationState, ctx: &StepContext<'_>) -> StateUpdate {
    let mut update = StateUpdate {
        append_messages: vec![Message::user(state.ticket_text.clone())],
        ..Default::default()
    };

    // An explicitly supplied order id counts the same as an extracted one.
    let incoming_id = ctx
        .turn_order_id
        .as_deref()
        .map(str::to_uppercase)
        .or_else(|| extract_order_id(&state.ticket_text));

    let mut issue_cleared = false;
    let mut details_cleared = false;
    if let Some(new_id) = incoming_id {
        match state.order_id.as_deref() {
            // Same order as before: keep all resolved work.
            Some(existing) if existing == new_id => {}
            // The conversation is now about a different order.
            Some(existing) => {
                tracing::info!(old = existing, new = %new_id, "order id changed, fresh start");
                update.order_id = Patch::Set(new_id);
                update.order_details = Patch::Clear;
                update.candidate_orders = Patch::Clear;
                update.scenario = Patch::Clear;
                update.issue_type = Patch::Clear;
                details_cleared = true;
                issue_cleared = true;
            }
            None => update.order_id = Patch::Set(new_id),
        }
    }

    if let Some(email) = extract_email(&state.ticket_text) {
        update.email = Patch::Set(email);
    }

    // Route precedence, evaluated against the post-clear view of the state.
    let issue_known = !issue_cleared && issue_is_meaningful(state.issue_type.as_deref());
    let order_resolved = !details_cleared && state.order_details.is_some();
    let route = match (issue_known, order_resolved) {
        (false, false) => RoutePath::Full,
        (true, false) => RoutePath::Resolve,
        (false, true) => RoutePath::Reclassify,
        (true, true) => RoutePath::Draft,
    };
    tracing::debug!(route = ?route, "ingest routed turn");
    update.route = Patch::Set(route);

    update
}

/// Classify: keyword-table classification of the ticket text.
fn classify(state: &ConversationState, ctx: &StepContext<'_>) -> StateUpdate {
    let result = ctx.classifier.classify(&state.ticket_text);
    tracing::debug!(issue_type = %result.issue_type, evidence = %result.evidence, "classified");
    StateUpdate {
        issue_type: Patch::Set(result.issue_type),
        ..Default::default()
    }
}

/// Resolve: branch on which identifier is present. Owns only the policy,
/// not the storage; lookup errors propagate and fail the turn.
async fn resolve_order(
    state: &ConversationState,
    ctx: &StepContext<'_>,
) -> Result<StateUpdate, EngineError> {
    let mut update = StateUpdate::default();

    if let Some(order_id) = state.order_id.as_deref() {
        match ctx.orders.fetch_by_id(order_id).await? {
            Some(order) => {
                update.order_details = Patch::Set(order);
                update.candidate_orders = Patch::Clear;
                update.scenario = Patch::Set(Scenario::Reply);
            }
            None => {
                update.order_details = Patch::Clear;
                update.scenario = Patch::Set(Scenario::OrderNotFound);
            }
        }
    } else if let Some(email) = state.email.as_deref() {
        let mut matches = ctx.orders.search_by_email(email).await?;
        match matches.len() {
            0 => update.scenario = Patch::Set(Scenario::NoOrdersFound),
            1 => {
                // Single match: auto-select it.
                let order = matches.remove(0);
                update.order_id = Patch::Set(order.order_id.clone());
                update.order_details = Patch::Set(order);
                update.candidate_orders = Patch::Clear;
                update.scenario = Patch::Set(Scenario::Reply);
            }
            n => {
                tracing::debug!(candidates = n, "email matched multiple orders");
                update.candidate_orders = Patch::Set(matches);
                update.scenario = Patch::Set(Scenario::ConfirmOrder);
            }
        }
    } else {
        update.scenario = Patch::Set(Scenario::NeedIdentifier);
    }

    Ok(update)
}

/// Prepare the reviewer-facing action from the template table. Reply-only
/// (the router guarantees a resolved order here).
fn prepare_action(state: &ConversationState, ctx: &StepContext<'_>) -> StateUpdate {
    let (customer_name, order_id) = match state.order_details.as_ref() {
        Some(order) => (order.customer_name.as_str(), order.order_id.as_str()),
        None => ("Customer", state.order_id.as_deref().unwrap_or("")),
    };
    let issue_type = state.issue_type.as_deref().unwrap_or(ISSUE_UNKNOWN);

    let action = ctx.templates.action_for(issue_type, customer_name, order_id);
    tracing::debug!(issue_type, "prepared suggested action");

    StateUpdate {
        suggested_action: Patch::Set(action),
        review_status: Patch::Set(ReviewStatus::Pending),
        ..Default::default()
    }
}

/// Attach a policy compliance note to the suggested action. Degrades to an
/// explicit no-citations note on any collaborator trouble; never fails the
/// turn.
async fn evaluate_policy(state: &ConversationState, ctx: &StepContext<'_>) -> StateUpdate {
    let issue_type = state.issue_type.as_deref().unwrap_or(ISSUE_UNKNOWN);
    let action = state.suggested_action.clone().unwrap_or_default();
    let query = format!(
        "Issue type: {issue_type}\nTicket: {}\nProposed action: {action}",
        state.ticket_text
    );

    let citations = match ctx.policies.citations(Some(issue_type), &query).await {
        Ok(citations) => citations,
        Err(e) => {
            tracing::warn!(error = %e, "policy retrieval failed, proceeding without citations");
            Vec::new()
        }
    };

    let note = crate::policy::compose_evaluation(ctx.generator, issue_type, &action, &citations).await;

    StateUpdate {
        suggested_action: Patch::Set(format!("{action}\n\n{note}")),
        ..Default::default()
    }
}

/// Admin-review checkpoint: a pass-through that only validates the fields
/// the resume injected. Normal forward flow never executes this; the
/// executor suspends first.
fn admin_review(state: &ConversationState) -> Result<StateUpdate, EngineError> {
    match state.review_status {
        Some(status) => {
            tracing::info!(
                status = ?status,
                feedback = state.admin_feedback.as_deref().unwrap_or(""),
                "admin review decision received"
            );
            Ok(StateUpdate::default())
        }
        None => Err(EngineError::InvalidReview {
            reason: "review decision is missing a status".to_string(),
        }),
    }
}

/// Terminal bookkeeping. Preserves `review_status` as the draft step left
/// it and appends nothing to the transcript: the reviewed message itself
/// was the draft step's single append.
fn finalize(state: &ConversationState) -> StateUpdate {
    tracing::info!(
        review_status = ?state.review_status,
        order_id = state.order_id.as_deref().unwrap_or(""),
        "turn finalized"
    );
    StateUpdate::default()
}
