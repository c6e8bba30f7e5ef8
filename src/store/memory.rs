//! In-memory thread store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::state::ConversationState;
use crate::store::ThreadStore;

/// Reference [`ThreadStore`] implementation backed by a `HashMap`.
///
/// Suits tests and single-process deployments; suspended threads survive
/// as long as the process does.
#[derive(Default)]
pub struct InMemoryThreadStore {
    threads: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, StoreError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, state: &ConversationState) -> Result<(), StoreError> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), state.clone());
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<(String, ConversationState)>, StoreError> {
        Ok(self
            .threads
            .read()
            .await
            .iter()
            .filter(|(_, state)| state.pending_step.is_some())
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StepName;

    #[tokio::test]
    async fn load_save_round_trip() {
        let store = InMemoryThreadStore::new();
        assert!(store.load("t1").await.unwrap().is_none());

        let mut state = ConversationState::new();
        state.ticket_text = "where is my order".to_string();
        store.save("t1", &state).await.unwrap();

        let loaded = store.load("t1").await.unwrap().unwrap();
        assert_eq!(loaded.ticket_text, "where is my order");
    }

    #[tokio::test]
    async fn list_pending_only_returns_suspended_threads() {
        let store = InMemoryThreadStore::new();

        let running = ConversationState::new();
        store.save("done", &running).await.unwrap();

        let mut suspended = ConversationState::new();
        suspended.pending_step = Some(StepName::AdminReview);
        store.save("waiting", &suspended).await.unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, "waiting");
    }
}
