//! In-process transcript store.
//!
//! Records live for the lifetime of the process. Saving a record whose
//! session id already exists replaces it.

use agora_application::{StoreError, TranscriptStore};
use agora_domain::DeliberationRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryTranscriptStore {
    records: RwLock<HashMap<String, DeliberationRecord>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn save(&self, record: &DeliberationRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<DeliberationRecord>, StoreError> {
        Ok(self.records.read().await.get(session_id).cloned())
    }

    async fn list(&self) -> Result<Vec<DeliberationRecord>, StoreError> {
        let mut records: Vec<DeliberationRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(records)
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        match self.records.write().await.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(session_id.to_string())),
        }
    }
}
