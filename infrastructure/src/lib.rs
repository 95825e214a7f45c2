//! Infrastructure layer for agora
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the generation endpoint, retrieval backends, the
//! conversation log, the transcript store and configuration file loading.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod providers;
pub mod retrieval;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDeliberationConfig, FileLoggingConfig,
    FileProviderConfig, FileRetrievalConfig, RetrievalBackend,
};
pub use logging::JsonlConversationLogger;
pub use persistence::InMemoryTranscriptStore;
pub use providers::OpenAiCompatibleGateway;
pub use retrieval::{CorpusChunk, CorpusError, CorpusRetrieval, WebSearchRetrieval};
