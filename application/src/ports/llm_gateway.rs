//! LLM Gateway port
//!
//! Defines the interface for the language-generation capability.

use agora_domain::{Message, RoleId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during generation
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// A single generation call: role-tagged messages for one agent turn.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Role the output will be committed for
    pub role: RoleId,
    /// System instruction, prior dialogue, then the current prompt
    pub messages: Vec<Message>,
    /// Correlation id for observability only
    pub session_id: String,
}

/// Gateway for language generation
///
/// Implementations (adapters) live in the infrastructure layer. Retry
/// policy, if any, belongs to the adapter; callers forward errors as-is.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate the text for one turn
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError>;
}
