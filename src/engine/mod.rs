//! The triage engine: typed per-thread state, a fixed set of named steps,
//! pure routing predicates, and a durable suspend/resume protocol around
//! the admin-review checkpoint.
//!
//! All collaborators are injected at construction; the engine holds no
//! process-wide state, so independent instances can coexist in one
//! process.

mod draft;
mod executor;
mod router;
mod steps;

pub use draft::DraftPhase;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::classify::Classifier;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::llm::TextGenerator;
use crate::orders::OrderStore;
use crate::policy::PolicyRetriever;
use crate::state::{
    ConversationState, Message, Patch, ReviewStatus, Scenario, StateUpdate, StepName,
};
use crate::store::ThreadStore;
use crate::templates::TemplateTable;

/// Collaborators and tables a step may use, borrowed for one turn.
pub(crate) struct StepContext<'a> {
    pub orders: &'a dyn OrderStore,
    pub generator: &'a dyn TextGenerator,
    pub policies: &'a dyn PolicyRetriever,
    pub classifier: &'a Classifier,
    pub templates: &'a TemplateTable,
    /// Order id supplied explicitly with the turn, if any.
    pub turn_order_id: Option<String>,
}

/// One inbound user turn.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    /// Continue this thread, or start a new one when absent.
    pub thread_id: Option<String>,
    pub ticket_text: String,
    /// Optional explicit order id, treated like an extracted one.
    pub order_id: Option<String>,
}

/// The reviewer's verdict on a pending ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    /// Re-draft with the attached feedback and suspend again.
    RequestChanges,
}

/// Candidate order summary surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateOrder {
    pub order_id: String,
    pub status: String,
    pub first_item: Option<String>,
}

/// State view returned after every turn.
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub thread_id: String,
    pub order_id: Option<String>,
    pub email: Option<String>,
    pub issue_type: Option<String>,
    pub scenario: Option<Scenario>,
    /// The latest agent message (the draft the customer would see).
    pub draft_reply: Option<String>,
    pub suggested_action: Option<String>,
    pub review_status: Option<ReviewStatus>,
    pub candidate_orders: Option<Vec<CandidateOrder>>,
    pub messages: Vec<Message>,
    /// Whether the thread is suspended before the admin-review checkpoint.
    pub awaiting_review: bool,
}

/// One ticket awaiting admin review.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTicket {
    pub thread_id: String,
    pub order_id: Option<String>,
    pub customer_name: Option<String>,
    pub issue_type: Option<String>,
    pub suggested_action: Option<String>,
    pub draft_reply: Option<String>,
    pub since: DateTime<Utc>,
}

/// The workflow engine.
pub struct Engine {
    store: Arc<dyn ThreadStore>,
    orders: Arc<dyn OrderStore>,
    generator: Arc<dyn TextGenerator>,
    policies: Arc<dyn PolicyRetriever>,
    classifier: Classifier,
    templates: TemplateTable,
    config: EngineConfig,
    /// Per-thread turn locks: at most one in-flight execution per thread.
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        orders: Arc<dyn OrderStore>,
        generator: Arc<dyn TextGenerator>,
        policies: Arc<dyn PolicyRetriever>,
        classifier: Classifier,
        templates: TemplateTable,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            orders,
            generator,
            policies,
            classifier,
            templates,
            config,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process one user turn: load or initialize the thread, merge the new
    /// input, run steps until a suspend or terminal point, persist, and
    /// return the resulting view.
    ///
    /// A failed turn persists nothing, so retrying the same turn is safe.
    pub async fn start_or_continue(&self, request: TurnRequest) -> Result<StateView, EngineError> {
        let ticket_text = request.ticket_text.trim().to_string();
        if ticket_text.is_empty() {
            return Err(EngineError::EmptyTicket);
        }

        let thread_id = request
            .thread_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let _turn = self.lock_thread(&thread_id).await;

        let mut state = self
            .store
            .load(&thread_id)
            .await?
            .unwrap_or_else(ConversationState::new);

        // Merge the turn input. A terminal review verdict was consumed by
        // the turn that delivered it; a follow-up starts a fresh cycle.
        state.ticket_text = ticket_text;
        state.route = None;
        if matches!(
            state.review_status,
            Some(ReviewStatus::Approved) | Some(ReviewStatus::Rejected)
        ) {
            state.review_status = None;
            state.admin_feedback = None;
        }

        let ctx = self.step_context(request.order_id);
        let stop = executor::run(
            &mut state,
            StepName::Ingest,
            &ctx,
            self.config.max_steps_per_turn,
        )
        .await?;
        tracing::debug!(thread_id = %thread_id, stop = ?stop, "turn finished");

        self.store.save(&thread_id, &state).await?;
        Ok(self.view(thread_id, &state))
    }

    /// Inject an admin decision into a suspended thread and resume it from
    /// the checkpoint.
    pub async fn submit_review_decision(
        &self,
        thread_id: &str,
        decision: ReviewDecision,
        feedback: Option<String>,
    ) -> Result<StateView, EngineError> {
        let _turn = self.lock_thread(thread_id).await;

        let mut state =
            self.store
                .load(thread_id)
                .await?
                .ok_or_else(|| EngineError::UnknownThread {
                    thread_id: thread_id.to_string(),
                })?;

        if state.pending_step != Some(StepName::AdminReview) {
            return Err(EngineError::NoPendingReview {
                thread_id: thread_id.to_string(),
            });
        }

        let status = match decision {
            ReviewDecision::Approved => ReviewStatus::Approved,
            ReviewDecision::Rejected => ReviewStatus::Rejected,
            // Re-enter the pending phase; the draft step sees the feedback
            // and suspends again.
            ReviewDecision::RequestChanges => ReviewStatus::Pending,
        };

        state.apply(StateUpdate {
            review_status: Patch::Set(status),
            admin_feedback: match feedback {
                Some(f) if !f.trim().is_empty() => Patch::Set(f.trim().to_string()),
                _ => Patch::Clear,
            },
            // The checkpoint is consumed; drafting re-sets it if it needs
            // another round.
            pending_step: Patch::Clear,
            ..Default::default()
        });

        let ctx = self.step_context(None);
        let stop = executor::run(
            &mut state,
            StepName::AdminReview,
            &ctx,
            self.config.max_steps_per_turn,
        )
        .await?;
        tracing::debug!(thread_id = %thread_id, stop = ?stop, "review decision processed");

        self.store.save(thread_id, &state).await?;
        Ok(self.view(thread_id.to_string(), &state))
    }

    /// Snapshot of all threads suspended at the admin-review checkpoint,
    /// oldest first.
    pub async fn pending_reviews(&self) -> Result<Vec<PendingTicket>, EngineError> {
        let mut tickets: Vec<PendingTicket> = self
            .store
            .list_pending()
            .await?
            .into_iter()
            .filter(|(_, state)| state.pending_step == Some(StepName::AdminReview))
            .map(|(thread_id, state)| PendingTicket {
                thread_id,
                order_id: state.order_id.clone(),
                customer_name: state
                    .order_details
                    .as_ref()
                    .map(|o| o.customer_name.clone()),
                issue_type: state.issue_type.clone(),
                suggested_action: state.suggested_action.clone(),
                draft_reply: state.last_agent_message().map(|m| m.content.clone()),
                since: state.updated_at,
            })
            .collect();

        tickets.sort_by_key(|t| t.since);
        Ok(tickets)
    }

    fn step_context(&self, turn_order_id: Option<String>) -> StepContext<'_> {
        StepContext {
            orders: self.orders.as_ref(),
            generator: self.generator.as_ref(),
            policies: self.policies.as_ref(),
            classifier: &self.classifier,
            templates: &self.templates,
            turn_order_id,
        }
    }

    async fn lock_thread(&self, thread_id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.turn_locks.lock().await;
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    fn view(&self, thread_id: String, state: &ConversationState) -> StateView {
        StateView {
            thread_id,
            order_id: state.order_id.clone(),
            email: state.email.clone(),
            issue_type: state.issue_type.clone(),
            scenario: state.scenario,
            draft_reply: state.last_agent_message().map(|m| m.content.clone()),
            suggested_action: state.suggested_action.clone(),
            review_status: state.review_status,
            candidate_orders: state.candidate_orders.as_ref().map(|orders| {
                orders
                    .iter()
                    .map(|o| CandidateOrder {
                        order_id: o.order_id.clone(),
                        status: o.status.clone(),
                        first_item: o.items.first().map(|i| i.name.clone()),
                    })
                    .collect()
            }),
            messages: state.messages.clone(),
            awaiting_review: state.pending_step == Some(StepName::AdminReview),
        }
    }
}
