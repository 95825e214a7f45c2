//! Server-sent event framing for deliberation events
//!
//! Each event becomes one `data: {json}` line followed by a blank line,
//! the framing an HTTP `text/event-stream` response uses.

use agora_application::DeliberationEvent;

pub struct SseEncoder;

impl SseEncoder {
    /// Encode one event as an SSE frame.
    pub fn encode(event: &DeliberationEvent) -> String {
        let json = serde_json::to_string(event).unwrap_or_else(|e| {
            serde_json::json!({"type": "error", "data": {"message": e.to_string()}}).to_string()
        });
        format!("data: {}\n\n", json)
    }
}
