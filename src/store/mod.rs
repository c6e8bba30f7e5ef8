//! Per-thread persistence of conversation state.
//!
//! The store maps a thread id to the latest [`ConversationState`] snapshot;
//! `pending_step` inside the snapshot records where a suspended thread
//! resumes. The contract is deliberately small so a durable backend can
//! implement it without engine changes; snapshots are plain serde values.
//!
//! At-most-one in-flight turn per thread is the engine's job (it holds a
//! per-thread mutex across the whole turn), so implementations only need
//! individually consistent load/save operations.

mod memory;

pub use memory::InMemoryThreadStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::state::ConversationState;

/// Durable mapping from thread id to the latest state snapshot.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Latest snapshot for a thread, or `None` for an unknown thread.
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, StoreError>;

    /// Replace the snapshot for a thread.
    async fn save(&self, thread_id: &str, state: &ConversationState) -> Result<(), StoreError>;

    /// All threads currently suspended before a step, for the admin queue.
    async fn list_pending(&self) -> Result<Vec<(String, ConversationState)>, StoreError>;
}
