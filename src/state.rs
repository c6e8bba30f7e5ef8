//! Conversation state: the typed, per-thread record the engine reads and
//! mutates, plus the partial-update machinery steps use to change it.
//!
//! Steps never touch state directly. Each step returns a [`StateUpdate`]
//! and the executor applies it with [`ConversationState::apply`] only after
//! the step succeeded, so a failed step commits nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::Order;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One entry in the append-only conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// What kind of response the current turn needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Normal issue response; the only scenario that goes through admin review.
    Reply,
    /// Neither an order id nor an email is known yet.
    NeedIdentifier,
    /// The given order id matched nothing.
    OrderNotFound,
    /// The given email has no orders.
    NoOrdersFound,
    /// Multiple orders matched the email; the customer must pick one.
    ConfirmOrder,
}

/// Per-turn routing decision after ingest. Transient: recomputed every turn
/// and not meaningful across turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePath {
    /// Both issue type and order details missing: run the full pipeline.
    Full,
    /// Only the issue type is missing (or "unknown").
    Reclassify,
    /// Only the order details are missing.
    Resolve,
    /// Both present: skip straight to drafting.
    Draft,
}

/// Status of the admin review, set externally by the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// Named processing steps. The executor dispatches on this tag; routing
/// predicates return the next one to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Ingest,
    Classify,
    ResolveOrder,
    PrepareAction,
    EvaluatePolicy,
    DraftReply,
    AdminReview,
    Finalize,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Ingest => "ingest",
            StepName::Classify => "classify",
            StepName::ResolveOrder => "resolve_order",
            StepName::PrepareAction => "prepare_action",
            StepName::EvaluatePolicy => "evaluate_policy",
            StepName::DraftReply => "draft_reply",
            StepName::AdminReview => "admin_review",
            StepName::Finalize => "finalize",
        }
    }
}

/// The issue-type value the classifier emits when nothing matched.
/// Explicitly distinct from "not classified yet" (`None`).
pub const ISSUE_UNKNOWN: &str = "unknown";

/// Whether an issue type is meaningfully set (present and not "unknown").
pub fn issue_is_meaningful(issue_type: Option<&str>) -> bool {
    matches!(issue_type, Some(t) if t != ISSUE_UNKNOWN)
}

/// Long-lived conversation state for one thread.
///
/// Snapshots of this struct (including `pending_step`) are what the state
/// store persists; resume after a process restart works from the snapshot
/// alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Current turn's raw input.
    pub ticket_text: String,
    /// Resolved customer identifiers; persist across turns until replaced.
    pub order_id: Option<String>,
    pub email: Option<String>,
    /// Classification result; `"unknown"` is a valid explicit value.
    pub issue_type: Option<String>,
    /// Fetched order record; presence implies a resolved conversation.
    pub order_details: Option<Order>,
    /// Populated only when an email search yields more than one match.
    pub candidate_orders: Option<Vec<Order>>,
    pub scenario: Option<Scenario>,
    /// Transient per-turn routing decision.
    pub route: Option<RoutePath>,
    /// Template-derived action description shown to the reviewer.
    pub suggested_action: Option<String>,
    pub review_status: Option<ReviewStatus>,
    pub admin_feedback: Option<String>,
    /// Append-only transcript; never truncated by the engine.
    pub messages: Vec<Message>,
    /// The step execution is suspended before; `None` means the turn ran to
    /// a terminal step or a return-to-user point.
    pub pending_step: Option<StepName>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Fresh state for a new thread.
    pub fn new() -> Self {
        Self {
            ticket_text: String::new(),
            order_id: None,
            email: None,
            issue_type: None,
            order_details: None,
            candidate_orders: None,
            scenario: None,
            route: None,
            suggested_action: None,
            review_status: None,
            admin_feedback: None,
            messages: Vec::new(),
            pending_step: None,
            updated_at: Utc::now(),
        }
    }

    /// Shallow-merge a partial update into this state.
    ///
    /// `Patch::Clear` is the explicit null; messages are append-only.
    pub fn apply(&mut self, update: StateUpdate) {
        update.order_id.apply_to(&mut self.order_id);
        update.email.apply_to(&mut self.email);
        update.issue_type.apply_to(&mut self.issue_type);
        update.order_details.apply_to(&mut self.order_details);
        update.candidate_orders.apply_to(&mut self.candidate_orders);
        update.scenario.apply_to(&mut self.scenario);
        update.route.apply_to(&mut self.route);
        update.suggested_action.apply_to(&mut self.suggested_action);
        update.review_status.apply_to(&mut self.review_status);
        update.admin_feedback.apply_to(&mut self.admin_feedback);
        update.pending_step.apply_to(&mut self.pending_step);
        self.messages.extend(update.append_messages);
        self.updated_at = Utc::now();
    }

    /// The most recent agent message, if any (the "draft" the caller sees).
    pub fn last_agent_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Agent)
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Three-valued field patch: leave alone, set, or explicitly clear.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Keep,
    Set(T),
    Clear,
}

// Manual impl: the derive would demand `T: Default` for a defaultless variant.
impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *slot = Some(value),
            Patch::Clear => *slot = None,
        }
    }
}

/// Partial state update produced by a single step.
///
/// Applied atomically by the executor: either the whole update lands or,
/// when the step errored, none of it does.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub order_id: Patch<String>,
    pub email: Patch<String>,
    pub issue_type: Patch<String>,
    pub order_details: Patch<Order>,
    pub candidate_orders: Patch<Vec<Order>>,
    pub scenario: Patch<Scenario>,
    pub route: Patch<RoutePath>,
    pub suggested_action: Patch<String>,
    pub review_status: Patch<ReviewStatus>,
    pub admin_feedback: Patch<String>,
    pub pending_step: Patch<StepName>,
    pub append_messages: Vec<Message>,
}
