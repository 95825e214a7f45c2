//! JSONL file writer for deliberation events.
//!
//! Each [`ConversationEvent`] becomes one JSON line: the payload's fields
//! plus `type` and `timestamp`. One file per session:
//! `<dir>/<session_id>.conversation.jsonl`.

use agora_application::{ConversationEvent, ConversationLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

const FILE_SUFFIX: &str = ".conversation.jsonl";

/// JSONL conversation logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Each line is flushed as it is
/// written; `Drop` flushes once more.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open (or create) the log file at `path` in append mode.
    ///
    /// Creates parent directories. Returns `None` if the file cannot be
    /// opened; callers fall back to no logging.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open conversation log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Logger for one deliberation session inside `dir`.
    pub fn for_session(dir: impl AsRef<Path>, session_id: &str) -> Option<Self> {
        Self::new(Self::session_path(dir, session_id))
    }

    pub fn session_path(dir: impl AsRef<Path>, session_id: &str) -> PathBuf {
        dir.as_ref().join(format!("{}{}", session_id, FILE_SUFFIX))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_record(event: ConversationEvent, timestamp: String) -> Value {
        let mut map = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert(
            "type".to_string(),
            Value::String(event.event_type.to_string()),
        );
        map.insert("timestamp".to_string(), Value::String(timestamp));
        Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = Self::to_record(event, timestamp);

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JsonlConversationLogger::for_session(dir.path(), "abc").unwrap();
        let path = logger.path().to_path_buf();
        assert!(path.ends_with("abc.conversation.jsonl"));

        logger.log(ConversationEvent::new(
            "turn_committed",
            json!({
                "session_id": "abc",
                "role": "RATIONAL_AGENT",
                "content": "Choose the quieter district.",
            }),
        ));
        logger.log(ConversationEvent::new(
            "cycle_advanced",
            json!({"session_id": "abc", "counter": 2, "terminated": false}),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "turn_committed");
        assert_eq!(lines[0]["role"], "RATIONAL_AGENT");
        assert_eq!(lines[0]["session_id"], "abc");
        assert_eq!(lines[1]["type"], "cycle_advanced");
        assert_eq!(lines[1]["counter"], 2);

        let ts = lines[0]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapped.jsonl");
        let logger = JsonlConversationLogger::new(&path).unwrap();

        logger.log(ConversationEvent::new("run_failed", json!("boom")));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "run_failed");
        assert_eq!(lines[0]["data"], "boom");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("s.conversation.jsonl");

        let first = JsonlConversationLogger::new(&path).unwrap();
        first.log(ConversationEvent::new("run_started", json!({})));
        drop(first);

        let second = JsonlConversationLogger::new(&path).unwrap();
        second.log(ConversationEvent::new("run_started", json!({})));
        drop(second);

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_directory_path_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlConversationLogger::new(dir.path()).is_none());
    }
}
