//! Suspend/resume protocol around the admin-review checkpoint.

mod common;

use common::{harness, turn};
use pretty_assertions::assert_eq;

use triagent::engine::ReviewDecision;
use triagent::error::EngineError;
use triagent::state::{ReviewStatus, StepName};
use triagent::store::ThreadStore;

/// Run one reply-scenario turn to the suspend point and return its thread id
/// and message count at suspension.
async fn suspend_one(h: &common::TestHarness) -> (String, usize) {
    let view = h
        .engine
        .start_or_continue(turn(None, "I want a refund for ORD1001"))
        .await
        .unwrap();
    assert!(view.awaiting_review);
    assert_eq!(view.review_status, Some(ReviewStatus::Pending));
    (view.thread_id, view.messages.len())
}

#[tokio::test]
async fn suspension_is_persisted_with_the_pending_step() {
    let h = harness();
    let (thread_id, _) = suspend_one(&h).await;

    let snapshot = h.thread_store.load(&thread_id).await.unwrap().unwrap();
    assert_eq!(snapshot.pending_step, Some(StepName::AdminReview));
    assert_eq!(snapshot.review_status, Some(ReviewStatus::Pending));
}

#[tokio::test]
async fn approval_resumes_and_appends_exactly_one_message() {
    let h = harness();
    let (thread_id, before) = suspend_one(&h).await;

    let view = h
        .engine
        .submit_review_decision(&thread_id, ReviewDecision::Approved, None)
        .await
        .unwrap();

    assert_eq!(view.review_status, Some(ReviewStatus::Approved));
    assert!(!view.awaiting_review);
    assert_eq!(view.messages.len(), before + 1);
    assert!(view.draft_reply.unwrap().contains("good news"));

    let snapshot = h.thread_store.load(&thread_id).await.unwrap().unwrap();
    assert_eq!(snapshot.pending_step, None);
}

#[tokio::test]
async fn rejection_resumes_and_appends_exactly_one_message() {
    let h = harness();
    let (thread_id, before) = suspend_one(&h).await;

    let view = h
        .engine
        .submit_review_decision(
            &thread_id,
            ReviewDecision::Rejected,
            Some("outside the refund window".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(view.review_status, Some(ReviewStatus::Rejected));
    assert!(!view.awaiting_review);
    assert_eq!(view.messages.len(), before + 1);
    assert!(view.draft_reply.unwrap().contains("unable to proceed"));
}

#[tokio::test]
async fn request_changes_re_drafts_and_suspends_again() {
    let h = harness();
    let (thread_id, before) = suspend_one(&h).await;

    let view = h
        .engine
        .submit_review_decision(
            &thread_id,
            ReviewDecision::RequestChanges,
            Some("mention the 30-day window".to_string()),
        )
        .await
        .unwrap();

    // back in the pending phase, waiting for the next verdict
    assert!(view.awaiting_review);
    assert_eq!(view.review_status, Some(ReviewStatus::Pending));
    assert_eq!(view.messages.len(), before + 1);
    // the fallback draft surfaces the reviewer note
    assert!(view.draft_reply.unwrap().contains("mention the 30-day window"));

    // an approval afterwards still works
    let approved = h
        .engine
        .submit_review_decision(&thread_id, ReviewDecision::Approved, None)
        .await
        .unwrap();
    assert_eq!(approved.review_status, Some(ReviewStatus::Approved));
    assert!(!approved.awaiting_review);
}

#[tokio::test]
async fn decision_for_unknown_thread_is_rejected() {
    let h = harness();
    let err = h
        .engine
        .submit_review_decision("no-such-thread", ReviewDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownThread { .. }));
}

#[tokio::test]
async fn decision_without_pending_checkpoint_is_rejected() {
    let h = harness();
    // A clarification turn completes without suspending.
    let view = h
        .engine
        .start_or_continue(turn(None, "my delivery is late"))
        .await
        .unwrap();
    assert!(!view.awaiting_review);

    let err = h
        .engine
        .submit_review_decision(&view.thread_id, ReviewDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoPendingReview { .. }));

    // and the rejection did not mutate the thread
    let snapshot = h.thread_store.load(&view.thread_id).await.unwrap().unwrap();
    assert_eq!(snapshot.messages.len(), view.messages.len());
}

#[tokio::test]
async fn double_decision_is_rejected() {
    let h = harness();
    let (thread_id, _) = suspend_one(&h).await;

    h.engine
        .submit_review_decision(&thread_id, ReviewDecision::Approved, None)
        .await
        .unwrap();

    let err = h
        .engine
        .submit_review_decision(&thread_id, ReviewDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoPendingReview { .. }));
}

#[tokio::test]
async fn follow_up_after_approval_starts_a_fresh_review_cycle() {
    let h = harness();
    let (thread_id, _) = suspend_one(&h).await;

    h.engine
        .submit_review_decision(&thread_id, ReviewDecision::Approved, None)
        .await
        .unwrap();

    // The approved verdict was consumed; a follow-up goes through review
    // again rather than replaying the approval.
    let view = h
        .engine
        .start_or_continue(turn(Some(&thread_id), "one more thing about that refund"))
        .await
        .unwrap();
    assert_eq!(view.review_status, Some(ReviewStatus::Pending));
    assert!(view.awaiting_review);
}

#[tokio::test]
async fn pending_queue_lists_suspended_threads_only() {
    let h = harness();
    let (suspended_id, _) = suspend_one(&h).await;

    // a thread that ran to completion
    let done = h
        .engine
        .start_or_continue(turn(None, "my delivery is late"))
        .await
        .unwrap();
    assert!(!done.awaiting_review);

    let pending = h.engine.pending_reviews().await.unwrap();
    assert_eq!(pending.len(), 1);
    let ticket = &pending[0];
    assert_eq!(ticket.thread_id, suspended_id);
    assert_eq!(ticket.order_id.as_deref(), Some("ORD1001"));
    assert_eq!(ticket.customer_name.as_deref(), Some("Dana Reyes"));
    assert_eq!(ticket.issue_type.as_deref(), Some("refund_request"));
    assert!(ticket.suggested_action.is_some());

    // after the verdict the queue is empty again
    h.engine
        .submit_review_decision(&suspended_id, ReviewDecision::Rejected, None)
        .await
        .unwrap();
    assert!(h.engine.pending_reviews().await.unwrap().is_empty());
}
