//! Retrieval configuration from TOML (`[retrieval]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which retrieval adapter backs the agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalBackend {
    /// Grounding disabled
    None,
    /// DuckDuckGo Instant Answer API
    Web,
    /// Local pre-chunked JSON corpus
    Corpus,
}

impl RetrievalBackend {
    pub const VALID: &'static [&'static str] = &["none", "web", "corpus"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "web" => Some(Self::Web),
            "corpus" => Some(Self::Corpus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    /// `none`, `web` or `corpus`
    pub backend: String,
    /// Cap for ordinary agents (and the adversarial mediator)
    pub max_results: usize,
    /// Cap for the dialogic coordinator
    pub synthesis_max_results: usize,
    /// JSON corpus file for the `corpus` backend
    pub corpus_path: Option<PathBuf>,
    /// DuckDuckGo region code (`kl` parameter)
    pub region: String,
    pub timeout_seconds: u64,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            backend: "web".to_string(),
            max_results: 2,
            synthesis_max_results: 1,
            corpus_path: None,
            region: "wt-wt".to_string(),
            timeout_seconds: 10,
        }
    }
}
