//! Routing predicates: pure functions from state to the next step.
//!
//! Each predicate is named for the step it follows. None of them touch
//! collaborators or mutate anything; the executor consults them after a
//! step's update has been applied.

use crate::state::{ConversationState, ReviewStatus, RoutePath, Scenario, StepName};

/// Where to go after a step: another step, or back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Next {
    Step(StepName),
    End,
}

/// Routing table: one arm per step that has a successor decision.
pub(crate) fn next_after(step: StepName, state: &ConversationState) -> Next {
    match step {
        StepName::Ingest => route_after_ingest(state),
        StepName::Classify => Next::Step(StepName::ResolveOrder),
        StepName::ResolveOrder => route_after_resolve(state),
        StepName::PrepareAction => route_after_prepare(state),
        StepName::EvaluatePolicy => Next::Step(StepName::DraftReply),
        StepName::DraftReply => route_after_draft(state),
        StepName::AdminReview => Next::Step(StepName::DraftReply),
        StepName::Finalize => Next::End,
    }
}

/// Multi-turn routing: never repeat work a previous turn already did.
fn route_after_ingest(state: &ConversationState) -> Next {
    match state.route.unwrap_or(RoutePath::Full) {
        RoutePath::Full | RoutePath::Reclassify => Next::Step(StepName::Classify),
        RoutePath::Resolve => Next::Step(StepName::ResolveOrder),
        RoutePath::Draft => Next::Step(StepName::DraftReply),
    }
}

/// Action preparation and policy evaluation are reply-only; every other
/// scenario goes straight to drafting the clarification.
fn route_after_resolve(state: &ConversationState) -> Next {
    if state.scenario == Some(Scenario::Reply) {
        Next::Step(StepName::PrepareAction)
    } else {
        Next::Step(StepName::DraftReply)
    }
}

fn route_after_prepare(state: &ConversationState) -> Next {
    if state.scenario == Some(Scenario::Reply) {
        Next::Step(StepName::EvaluatePolicy)
    } else {
        Next::Step(StepName::DraftReply)
    }
}

/// After drafting, a reply either suspends for admin review, finalizes a
/// reviewed decision, or returns to the user when the draft asked the
/// customer for more detail. Non-reply scenarios always return.
fn route_after_draft(state: &ConversationState) -> Next {
    if state.scenario != Some(Scenario::Reply) {
        return Next::End;
    }
    match state.review_status {
        Some(ReviewStatus::Approved) | Some(ReviewStatus::Rejected) => {
            Next::Step(StepName::Finalize)
        }
        Some(ReviewStatus::Pending) => Next::Step(StepName::AdminReview),
        // the unknown-issue draft clears the status and asks the customer
        None => Next::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConversationState {
        ConversationState::new()
    }

    #[test]
    fn ingest_routes_by_route_path() {
        let mut s = state();
        s.route = Some(RoutePath::Full);
        assert_eq!(
            next_after(StepName::Ingest, &s),
            Next::Step(StepName::Classify)
        );
        s.route = Some(RoutePath::Reclassify);
        assert_eq!(
            next_after(StepName::Ingest, &s),
            Next::Step(StepName::Classify)
        );
        s.route = Some(RoutePath::Resolve);
        assert_eq!(
            next_after(StepName::Ingest, &s),
            Next::Step(StepName::ResolveOrder)
        );
        s.route = Some(RoutePath::Draft);
        assert_eq!(
            next_after(StepName::Ingest, &s),
            Next::Step(StepName::DraftReply)
        );
    }

    #[test]
    fn non_reply_scenarios_skip_preparation() {
        let mut s = state();
        s.scenario = Some(Scenario::OrderNotFound);
        assert_eq!(
            next_after(StepName::ResolveOrder, &s),
            Next::Step(StepName::DraftReply)
        );

        s.scenario = Some(Scenario::Reply);
        assert_eq!(
            next_after(StepName::ResolveOrder, &s),
            Next::Step(StepName::PrepareAction)
        );
    }

    #[test]
    fn draft_suspends_only_pending_replies() {
        let mut s = state();
        s.scenario = Some(Scenario::Reply);
        s.review_status = Some(ReviewStatus::Pending);
        assert_eq!(
            next_after(StepName::DraftReply, &s),
            Next::Step(StepName::AdminReview)
        );

        s.review_status = Some(ReviewStatus::Approved);
        assert_eq!(
            next_after(StepName::DraftReply, &s),
            Next::Step(StepName::Finalize)
        );

        s.review_status = Some(ReviewStatus::Rejected);
        assert_eq!(
            next_after(StepName::DraftReply, &s),
            Next::Step(StepName::Finalize)
        );

        // unknown-issue draft cleared the status: back to the user
        s.review_status = None;
        assert_eq!(next_after(StepName::DraftReply, &s), Next::End);

        s.scenario = Some(Scenario::ConfirmOrder);
        s.review_status = Some(ReviewStatus::Pending);
        assert_eq!(next_after(StepName::DraftReply, &s), Next::End);
    }

    #[test]
    fn admin_review_re_enters_drafting() {
        assert_eq!(
            next_after(StepName::AdminReview, &state()),
            Next::Step(StepName::DraftReply)
        );
    }

    #[test]
    fn finalize_is_terminal() {
        assert_eq!(next_after(StepName::Finalize, &state()), Next::End);
    }
}
