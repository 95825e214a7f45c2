//! Event stream adapter
//!
//! Bridges [`DeliberationRun::step`] to a consumer that wants incremental
//! updates. A producer task drives the run and sends one event per committed
//! turn plus one for the synthesis, then exactly one terminal event:
//!
//! - success: `update`* then `end`
//! - failure: `update`* then `error` (never followed by `end`); a panic in
//!   an agent's collaborators is reported the same way
//! - cancellation or a dropped receiver: the producer stops silently
//!
//! Field names in [`UpdatePayload`] mirror [`DeliberationState`] so a
//! consumer can rebuild the full state from the stream alone.

use crate::ports::llm_gateway::LlmGateway;
use crate::ports::retrieval::RetrievalPort;
use crate::ports::transcript_store::TranscriptStore;
use crate::use_cases::run_deliberation::{
    DeliberationRun, RunDeliberationError, RunDeliberationInput, RunDeliberationUseCase,
    StepOutcome,
};
use agora_domain::{
    DeliberationState, FinalArtifacts, Parameters, ReferenceSnippet, RoleId, Turn,
};
use futures::{FutureExt, Stream};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 16;

/// Snapshot carried by every `update` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub session_id: String,
    /// Role that produced `response`
    pub role: RoleId,
    /// Newly generated text (the summary for the synthesis update)
    pub response: String,
    pub parameters: Parameters,
    pub transcript: Vec<Turn>,
    pub round_or_turn_counter: u32,
    pub max_rounds_or_turns: u32,
    pub retrieved_docs: BTreeMap<RoleId, Vec<ReferenceSnippet>>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_artifacts: Option<FinalArtifacts>,
}

impl UpdatePayload {
    pub fn from_state(
        session_id: impl Into<String>,
        role: RoleId,
        response: impl Into<String>,
        state: &DeliberationState,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            role,
            response: response.into(),
            parameters: state.parameters().clone(),
            transcript: state.transcript().to_vec(),
            round_or_turn_counter: state.round_or_turn_counter(),
            max_rounds_or_turns: state.max_rounds_or_turns(),
            retrieved_docs: state.retrieved_docs().clone(),
            completed: state.is_completed(),
            final_artifacts: state.final_artifacts().cloned(),
        }
    }
}

/// Externally consumable progress event.
///
/// Serialized as `{"type": "update" | "end" | "error", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum DeliberationEvent {
    Update(Box<UpdatePayload>),
    End {},
    Error { message: String },
}

impl DeliberationEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliberationEvent::Update(_))
    }
}

/// Receiving half of a running deliberation.
///
/// Dropping it stops the producer at its next emission.
pub struct EventStream {
    session_id: String,
    receiver: mpsc::Receiver<DeliberationEvent>,
}

impl EventStream {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Next event, or `None` once the producer has stopped.
    pub async fn recv(&mut self) -> Option<DeliberationEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream to completion.
    pub async fn collect(mut self) -> Vec<DeliberationEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }

    pub fn into_stream(self) -> impl Stream<Item = DeliberationEvent> {
        futures::stream::unfold(self.receiver, |mut receiver| async move {
            receiver.recv().await.map(|event| (event, receiver))
        })
    }
}

/// Drive `run` on a background task and return its event stream.
///
/// `store`, when given, receives the finished record before `end` is sent.
pub fn spawn_event_stream(
    run: DeliberationRun,
    step_delay: Duration,
    store: Option<Arc<dyn TranscriptStore>>,
) -> EventStream {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let session_id = run.session_id().to_string();
    tokio::spawn(produce(run, tx, step_delay, store));
    EventStream {
        session_id,
        receiver: rx,
    }
}

async fn produce(
    mut run: DeliberationRun,
    tx: mpsc::Sender<DeliberationEvent>,
    step_delay: Duration,
    store: Option<Arc<dyn TranscriptStore>>,
) {
    loop {
        let outcome = match AssertUnwindSafe(run.step()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(session_id = %run.session_id(), "Deliberation step panicked: {}", message);
                let _ = tx
                    .send(DeliberationEvent::Error {
                        message: format!("internal error: {}", message),
                    })
                    .await;
                return;
            }
        };

        let update = match outcome {
            Ok(StepOutcome::CycleAdvanced { .. }) => continue,
            Ok(StepOutcome::TurnCommitted { role }) => {
                let response = run
                    .state()
                    .last_turn()
                    .map(|t| t.content.clone())
                    .unwrap_or_default();
                UpdatePayload::from_state(run.session_id(), role, response, run.state())
            }
            Ok(StepOutcome::Synthesized { role }) => {
                let summary = run
                    .state()
                    .final_artifacts()
                    .map(|a| a.summary.clone())
                    .unwrap_or_default();
                UpdatePayload::from_state(run.session_id(), role, summary, run.state())
            }
            Err(RunDeliberationError::Cancelled) => {
                info!(session_id = %run.session_id(), "Event stream closed by cancellation");
                return;
            }
            Err(e) => {
                let _ = tx
                    .send(DeliberationEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        if tx
            .send(DeliberationEvent::Update(Box::new(update)))
            .await
            .is_err()
        {
            debug!(session_id = %run.session_id(), "Event receiver dropped, stopping run");
            return;
        }

        if run.is_done() {
            if let Some(store) = &store
                && let Err(e) = store.save(&run.record()).await
            {
                warn!(session_id = %run.session_id(), "Failed to save transcript: {}", e);
            }
            let _ = tx.send(DeliberationEvent::End {}).await;
            return;
        }

        if !step_delay.is_zero() {
            tokio::time::sleep(step_delay).await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent step panicked".to_string()
    }
}

impl<G: LlmGateway + 'static, R: RetrievalPort + 'static> RunDeliberationUseCase<G, R> {
    /// Start a run and stream its progress as [`DeliberationEvent`]s.
    ///
    /// Input validation errors are returned directly; everything after the
    /// run has started is reported through the stream.
    pub fn stream(&self, input: RunDeliberationInput) -> Result<EventStream, RunDeliberationError> {
        let run = self.start(input)?;
        Ok(spawn_event_stream(
            run,
            self.settings().step_delay,
            self.transcript_store(),
        ))
    }
}
