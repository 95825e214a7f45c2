//! Transcript store port
//!
//! Persistence collaborator that receives the finished run. Storage itself
//! is an adapter concern; the core only hands over [`DeliberationRecord`]s.

use agora_domain::DeliberationRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by transcript store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Store for finished deliberation records, keyed by session id
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Save a record, replacing any record with the same session id
    async fn save(&self, record: &DeliberationRecord) -> Result<(), StoreError>;

    async fn get(&self, session_id: &str) -> Result<Option<DeliberationRecord>, StoreError>;

    /// All records, newest first
    async fn list(&self) -> Result<Vec<DeliberationRecord>, StoreError>;

    /// Delete a record; returns `NotFound` when nothing was stored
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}
