//! Deliberation configuration from TOML (`[deliberation]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    /// Default ceiling for the adversarial flavor
    pub max_rounds: u32,
    /// Default ceiling for the dialogic flavor
    pub max_turns: u32,
    /// Replaces the built-in completion phrases when set
    pub completion_phrases: Option<Vec<String>>,
    /// Pause after each streamed update
    pub step_delay_ms: u64,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            max_turns: 6,
            completion_phrases: None,
            step_delay_ms: 10,
        }
    }
}
