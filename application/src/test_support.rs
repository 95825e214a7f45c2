//! Scripted collaborators shared by the application tests.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use crate::ports::retrieval::{RetrievalPort, RetrievalRequest};
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use agora_domain::{DeliberationRecord, ReferenceSnippet};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Gateway returning queued texts (or failures) in call order.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            responses: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GatewayError::RequestFailed(message)),
            None => Err(GatewayError::Other("No more responses".to_string())),
        }
    }
}

/// Retrieval stub that records every request.
pub struct RecordingRetrieval {
    snippets: Vec<ReferenceSnippet>,
    requests: Mutex<Vec<RetrievalRequest>>,
}

impl RecordingRetrieval {
    pub fn empty() -> Self {
        Self::with_snippets(Vec::new())
    }

    pub fn with_snippets(snippets: Vec<ReferenceSnippet>) -> Self {
        Self {
            snippets,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RetrievalRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalPort for RecordingRetrieval {
    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<ReferenceSnippet> {
        self.requests.lock().unwrap().push(request.clone());
        self.snippets
            .iter()
            .take(request.max_results)
            .cloned()
            .collect()
    }
}

/// Logger keeping event types in order.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn payloads(&self, event_type: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == event_type)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}

/// Store keeping every saved record in save order.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<DeliberationRecord>>,
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn save(&self, record: &DeliberationRecord) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<DeliberationRecord>, StoreError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<DeliberationRecord>, StoreError> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        Err(StoreError::NotFound(session_id.to_string()))
    }
}
