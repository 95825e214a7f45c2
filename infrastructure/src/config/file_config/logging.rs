//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for `<session_id>.conversation.jsonl` files; unset disables
    pub conversation_log_dir: Option<PathBuf>,
    /// Diagnostic log file; unset logs to stderr
    pub log_file: Option<PathBuf>,
}
