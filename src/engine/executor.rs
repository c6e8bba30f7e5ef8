//! The step walk: Step → Router → Step … until a terminal point or the
//! admin-review suspend point.
//!
//! Updates apply only after a step returns `Ok`, so a failed step commits
//! nothing. Suspension happens when the router selects the admin-review
//! checkpoint: the checkpoint step itself is *not* executed. The caller
//! persists the state (whose `pending_step` the draft step already set)
//! and a later review decision resumes with `entry = AdminReview`.

use crate::engine::StepContext;
use crate::engine::router::{self, Next};
use crate::engine::steps;
use crate::error::EngineError;
use crate::state::{ConversationState, StepName};

/// How a turn segment stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnStop {
    /// Ran to a terminal step or a return-to-user point.
    Completed,
    /// Paused before the admin-review checkpoint.
    Suspended,
}

pub(crate) async fn run(
    state: &mut ConversationState,
    entry: StepName,
    ctx: &StepContext<'_>,
    max_steps: u32,
) -> Result<TurnStop, EngineError> {
    let mut current = entry;
    let mut executed = 0u32;

    loop {
        if executed >= max_steps {
            return Err(EngineError::StepBudgetExceeded { limit: max_steps });
        }
        executed += 1;

        tracing::debug!(step = current.as_str(), "executing step");
        let update = steps::dispatch(current, state, ctx).await?;
        state.apply(update);

        match router::next_after(current, state) {
            Next::End => {
                tracing::debug!(last_step = current.as_str(), executed, "turn completed");
                return Ok(TurnStop::Completed);
            }
            Next::Step(StepName::AdminReview) => {
                tracing::info!(executed, "suspending before admin review");
                return Ok(TurnStop::Suspended);
            }
            Next::Step(next) => current = next,
        }
    }
}
