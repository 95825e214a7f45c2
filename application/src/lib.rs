//! Application layer for agora
//!
//! This crate contains the agent pipeline, the deliberation state machine,
//! the event stream adapter, port definitions, and application settings.
//! It depends only on the domain layer.

pub mod agent;
pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use agent::{Agent, AgentError};
pub use config::DeliberationSettings;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, GenerationRequest, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
    retrieval::{NoRetrieval, RetrievalPort, RetrievalRequest},
    transcript_store::{StoreError, TranscriptStore},
};
pub use use_cases::event_stream::{
    DeliberationEvent, EventStream, UpdatePayload, spawn_event_stream,
};
pub use use_cases::run_deliberation::{
    DeliberationRun, RunDeliberationError, RunDeliberationInput, RunDeliberationUseCase, Stage,
    StepOutcome, strategy_for,
};
