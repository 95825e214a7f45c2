//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application types by
//! [`FileConfig::to_settings`].

mod deliberation;
mod logging;
mod provider;
mod retrieval;

pub use deliberation::FileDeliberationConfig;
pub use logging::FileLoggingConfig;
pub use provider::FileProviderConfig;
pub use retrieval::{FileRetrievalConfig, RetrievalBackend};

use agora_application::DeliberationSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration validation errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    InvalidTimeout { field: &'static str },

    #[error("provider.model cannot be empty")]
    EmptyModelName,

    #[error("deliberation.{field} must be at least 1")]
    ZeroCeiling { field: &'static str },

    #[error("retrieval.backend: unknown value '{value}' (expected one of: {})", RetrievalBackend::VALID.join(", "))]
    UnknownRetrievalBackend { value: String },

    #[error("retrieval.corpus_path is required when retrieval.backend = \"corpus\"")]
    MissingCorpusPath,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Generation endpoint
    pub provider: FileProviderConfig,
    /// Grounding backend and caps
    pub retrieval: FileRetrievalConfig,
    /// Ceilings, completion phrases and pacing
    pub deliberation: FileDeliberationConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.provider.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.provider.timeout_seconds == Some(0) {
            return Err(ConfigValidationError::InvalidTimeout {
                field: "provider.timeout_seconds",
            });
        }
        if self.retrieval.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout {
                field: "retrieval.timeout_seconds",
            });
        }
        if self.deliberation.max_rounds == 0 {
            return Err(ConfigValidationError::ZeroCeiling { field: "max_rounds" });
        }
        if self.deliberation.max_turns == 0 {
            return Err(ConfigValidationError::ZeroCeiling { field: "max_turns" });
        }
        if self.retrieval_backend()? == RetrievalBackend::Corpus
            && self.retrieval.corpus_path.is_none()
        {
            return Err(ConfigValidationError::MissingCorpusPath);
        }
        Ok(())
    }

    pub fn retrieval_backend(&self) -> Result<RetrievalBackend, ConfigValidationError> {
        RetrievalBackend::parse(&self.retrieval.backend).ok_or_else(|| {
            ConfigValidationError::UnknownRetrievalBackend {
                value: self.retrieval.backend.clone(),
            }
        })
    }

    /// Build the use case settings from `[retrieval]` and `[deliberation]`.
    ///
    /// A `none` backend zeroes every cap.
    pub fn to_settings(&self) -> DeliberationSettings {
        let mut settings = DeliberationSettings::default()
            .with_retrieval_cap(self.retrieval.max_results)
            .with_synthesis_retrieval_cap(self.retrieval.synthesis_max_results)
            .with_max_rounds(self.deliberation.max_rounds)
            .with_max_turns(self.deliberation.max_turns)
            .with_step_delay(Duration::from_millis(self.deliberation.step_delay_ms));

        if let Some(phrases) = &self.deliberation.completion_phrases {
            settings = settings.with_completion_phrases(phrases.clone());
        }
        if matches!(self.retrieval_backend(), Ok(RetrievalBackend::None)) {
            settings = settings.without_retrieval();
        }
        settings
    }
}
