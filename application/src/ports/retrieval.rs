//! Retrieval port
//!
//! Grounding lookup used by agents before composing their prompt. The port
//! is infallible from the caller's point of view: adapters swallow their own
//! failures and return an empty list.

use agora_domain::{ReferenceSnippet, RoleId};
use async_trait::async_trait;

/// Query for reference material on behalf of one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub role: RoleId,
    pub query: String,
    /// Result cap; `0` means retrieval is disabled
    pub max_results: usize,
    pub session_id: String,
}

impl RetrievalRequest {
    pub fn is_disabled(&self) -> bool {
        self.max_results == 0
    }
}

/// Port for reference-snippet retrieval
#[async_trait]
pub trait RetrievalPort: Send + Sync {
    /// Return at most `request.max_results` snippets, best first.
    ///
    /// Must return an empty list without any external call when the cap is
    /// zero, and must degrade to an empty list on failure.
    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<ReferenceSnippet>;
}

/// Retrieval adapter that never returns anything.
pub struct NoRetrieval;

#[async_trait]
impl RetrievalPort for NoRetrieval {
    async fn retrieve(&self, _request: &RetrievalRequest) -> Vec<ReferenceSnippet> {
        Vec::new()
    }
}
