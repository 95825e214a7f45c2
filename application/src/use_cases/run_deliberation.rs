//! Run Deliberation use case
//!
//! A single generic state machine drives every flavor:
//!
//! ```text
//! Turn(0) -> Turn(1) -> ... -> Turn(n-1) -> CycleAdvance --(continue)--> Turn(0)
//!                                                 |
//!                                            (terminate)
//!                                                 v
//!                                      TerminalSynthesis -> Done
//! ```
//!
//! Any agent error moves the run to `Failed`; there is no resume or skip.
//! [`DeliberationRun::step`] advances exactly one state so callers (the
//! event stream, progress display) observe every transition in order.

use crate::agent::{Agent, AgentError};
use crate::config::DeliberationSettings;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::retrieval::RetrievalPort;
use crate::ports::transcript_store::TranscriptStore;
use agora_domain::prompt::advisory::{EmotionalAdvisor, Mediator, RationalAdvisor};
use agora_domain::prompt::consultation::{Coordinator, Doctor, Patient};
use agora_domain::{
    DeliberationRecord, DeliberationState, DomainError, Flavor, Parameters, PromptStrategy,
    RoleId, TerminationReason, TerminationRule,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors that abort a deliberation run
#[derive(Error, Debug)]
pub enum RunDeliberationError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] DomainError),

    #[error("Generation failed for {role}: {source}")]
    Generation {
        role: RoleId,
        #[source]
        source: GatewayError,
    },

    #[error("Deliberation cancelled")]
    Cancelled,

    #[error("Deliberation already finished")]
    AlreadyFinished,
}

impl RunDeliberationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunDeliberationError::Cancelled)
    }
}

impl From<AgentError> for RunDeliberationError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Generation { role, source } => Self::Generation { role, source },
            AgentError::State(DomainError::Cancelled) => Self::Cancelled,
            AgentError::State(_) => Self::AlreadyFinished,
        }
    }
}

/// Position of a run in the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Ordinary agent at this index is next
    Turn(usize),
    CycleAdvance,
    TerminalSynthesis,
    Done,
    Failed,
}

/// What a single [`DeliberationRun::step`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    TurnCommitted {
        role: RoleId,
    },
    CycleAdvanced {
        counter: u32,
        termination: Option<TerminationReason>,
    },
    Synthesized {
        role: RoleId,
    },
}

/// One deliberation in progress. Owns its state exclusively.
pub struct DeliberationRun {
    flavor: Flavor,
    session_id: String,
    state: DeliberationState,
    agents: Vec<Agent>,
    synthesizer: Agent,
    rule: TerminationRule,
    extract_artifacts: bool,
    stage: Stage,
    logger: Arc<dyn ConversationLogger>,
    cancellation: Option<CancellationToken>,
}

impl DeliberationRun {
    /// Build a run over an ordered, non-empty list of distinct roles.
    pub fn new(
        flavor: Flavor,
        state: DeliberationState,
        agents: Vec<Agent>,
        synthesizer: Agent,
        rule: TerminationRule,
    ) -> Result<Self, DomainError> {
        if agents.is_empty() {
            return Err(DomainError::EmptyRoleSequence);
        }
        let mut seen = BTreeSet::new();
        for agent in &agents {
            if !seen.insert(agent.role().clone()) {
                return Err(DomainError::DuplicateRole(agent.role().to_string()));
            }
        }

        Ok(Self {
            flavor,
            session_id: Uuid::new_v4().to_string(),
            state,
            agents,
            synthesizer,
            rule,
            extract_artifacts: flavor.extracts_artifacts(),
            stage: Stage::Turn(0),
            logger: Arc::new(NoConversationLogger),
            cancellation: None,
        })
    }

    // ==================== Builder Methods ====================

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    // ==================== Accessors ====================

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &DeliberationState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Done | Stage::Failed)
    }

    /// Role that the next step will invoke, if the next step is an agent.
    pub fn pending_role(&self) -> Option<&RoleId> {
        match self.stage {
            Stage::Turn(index) => self.agents.get(index).map(Agent::role),
            Stage::TerminalSynthesis => Some(self.synthesizer.role()),
            _ => None,
        }
    }

    /// Snapshot for the persistence collaborator.
    pub fn record(&self) -> DeliberationRecord {
        DeliberationRecord::from_state(self.session_id.clone(), self.flavor, &self.state)
    }

    pub fn into_record(self) -> DeliberationRecord {
        self.record()
    }

    // ==================== Transitions ====================

    /// Advance the state machine by exactly one state.
    pub async fn step(&mut self) -> Result<StepOutcome, RunDeliberationError> {
        if self.is_finished() {
            return Err(RunDeliberationError::AlreadyFinished);
        }
        if let Some(token) = &self.cancellation
            && token.is_cancelled()
        {
            self.fail(&RunDeliberationError::Cancelled);
            return Err(RunDeliberationError::Cancelled);
        }

        let result = match self.stage {
            Stage::Turn(index) => self.run_turn(index).await,
            Stage::CycleAdvance => Ok(self.advance_cycle()),
            Stage::TerminalSynthesis => self.run_synthesis().await,
            Stage::Done | Stage::Failed => Err(RunDeliberationError::AlreadyFinished),
        };

        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    async fn run_turn(&mut self, index: usize) -> Result<StepOutcome, RunDeliberationError> {
        let agent = &self.agents[index];
        let role = agent.role().clone();
        debug!(role = %role, counter = self.state.round_or_turn_counter(), "Running turn");

        cancellable(
            self.cancellation.as_ref(),
            agent.run(&mut self.state, &self.session_id),
        )
        .await??;

        if agent.retrieval_cap() > 0 {
            self.log_retrieval(&role);
        }
        if let Some(turn) = self.state.last_turn() {
            self.logger.log(ConversationEvent::new(
                "turn_committed",
                json!({
                    "session_id": self.session_id,
                    "role": turn.role,
                    "round_or_turn": turn.round_or_turn,
                    "content": turn.content,
                }),
            ));
        }

        self.stage = if index + 1 < self.agents.len() {
            Stage::Turn(index + 1)
        } else {
            Stage::CycleAdvance
        };
        Ok(StepOutcome::TurnCommitted { role })
    }

    fn advance_cycle(&mut self) -> StepOutcome {
        let counter = self.state.advance_cycle();
        let termination = self.rule.evaluate(&self.state);

        match &termination {
            Some(reason) => info!(counter, ?reason, "Deliberation loop finished"),
            None => debug!(counter, "Starting next cycle"),
        }
        self.logger.log(ConversationEvent::new(
            "cycle_advanced",
            json!({
                "session_id": self.session_id,
                "counter": counter,
                "max_rounds_or_turns": self.state.max_rounds_or_turns(),
                "termination": termination,
            }),
        ));

        self.stage = if termination.is_some() {
            Stage::TerminalSynthesis
        } else {
            Stage::Turn(0)
        };
        StepOutcome::CycleAdvanced {
            counter,
            termination,
        }
    }

    async fn run_synthesis(&mut self) -> Result<StepOutcome, RunDeliberationError> {
        let role = self.synthesizer.role().clone();
        info!(role = %role, "Running terminal synthesis");

        cancellable(
            self.cancellation.as_ref(),
            self.synthesizer
                .synthesize(&mut self.state, &self.session_id, self.extract_artifacts),
        )
        .await??;

        if self.synthesizer.retrieval_cap() > 0 {
            self.log_retrieval(&role);
        }
        if let Some(artifacts) = self.state.final_artifacts() {
            self.logger.log(ConversationEvent::new(
                "synthesis_completed",
                json!({
                    "session_id": self.session_id,
                    "role": artifacts.role,
                    "summary": artifacts.summary,
                    "recommended_items": artifacts.recommended_items,
                    "follow_up_options": artifacts.follow_up_options,
                }),
            ));
        }

        self.stage = Stage::Done;
        Ok(StepOutcome::Synthesized { role })
    }

    fn log_retrieval(&self, role: &RoleId) {
        let docs = self
            .state
            .retrieved_docs()
            .get(role)
            .cloned()
            .unwrap_or_default();
        self.logger.log(ConversationEvent::new(
            "retrieval",
            json!({
                "session_id": self.session_id,
                "role": role,
                "count": docs.len(),
                "docs": docs,
            }),
        ));
    }

    fn fail(&mut self, error: &RunDeliberationError) {
        self.stage = Stage::Failed;
        if error.is_cancelled() {
            info!(session_id = %self.session_id, "Deliberation cancelled");
        } else {
            warn!(session_id = %self.session_id, "Deliberation failed: {}", error);
        }
        self.logger.log(ConversationEvent::new(
            "run_failed",
            json!({
                "session_id": self.session_id,
                "error": error.to_string(),
                "counter": self.state.round_or_turn_counter(),
                "transcript_len": self.state.transcript().len(),
            }),
        ));
    }
}

/// Race `fut` against the cancellation token, if any.
async fn cancellable<T>(
    token: Option<&CancellationToken>,
    fut: impl Future<Output = T>,
) -> Result<T, RunDeliberationError> {
    match token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(RunDeliberationError::Cancelled),
                out = fut => Ok(out),
            }
        }
        None => Ok(fut.await),
    }
}

/// Built-in prompt strategy for a role.
pub fn strategy_for(role: &RoleId) -> Result<Arc<dyn PromptStrategy>, DomainError> {
    let strategy: Arc<dyn PromptStrategy> = match role.as_str() {
        RoleId::RATIONAL => Arc::new(RationalAdvisor),
        RoleId::EMOTIONAL => Arc::new(EmotionalAdvisor),
        RoleId::MEDIATOR => Arc::new(Mediator),
        RoleId::DOCTOR => Arc::new(Doctor),
        RoleId::PATIENT => Arc::new(Patient),
        RoleId::COORDINATOR => Arc::new(Coordinator),
        other => {
            return Err(DomainError::InvalidParameters(format!(
                "no prompt strategy for role '{other}'"
            )));
        }
    };
    Ok(strategy)
}

/// Input for the RunDeliberation use case
#[derive(Debug, Clone)]
pub struct RunDeliberationInput {
    pub flavor: Flavor,
    /// Free-form subject parameters for the flavor
    pub parameters: Parameters,
    /// Round/turn ceiling; falls back to the configured default
    pub max_rounds_or_turns: Option<u32>,
    pub enable_retrieval: bool,
    /// Generated when absent
    pub session_id: Option<String>,
}

impl RunDeliberationInput {
    pub fn new(flavor: Flavor, parameters: Parameters) -> Self {
        Self {
            flavor,
            parameters,
            max_rounds_or_turns: None,
            enable_retrieval: true,
            session_id: None,
        }
    }

    pub fn with_max_rounds_or_turns(mut self, max: u32) -> Self {
        self.max_rounds_or_turns = Some(max);
        self
    }

    pub fn without_retrieval(mut self) -> Self {
        self.enable_retrieval = false;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Use case for running a deliberation
pub struct RunDeliberationUseCase<G: LlmGateway + 'static, R: RetrievalPort + 'static> {
    gateway: Arc<G>,
    retrieval: Arc<R>,
    settings: DeliberationSettings,
    logger: Arc<dyn ConversationLogger>,
    store: Option<Arc<dyn TranscriptStore>>,
    cancellation: Option<CancellationToken>,
}

impl<G: LlmGateway + 'static, R: RetrievalPort + 'static> RunDeliberationUseCase<G, R> {
    pub fn new(gateway: Arc<G>, retrieval: Arc<R>) -> Self {
        Self {
            gateway,
            retrieval,
            settings: DeliberationSettings::default(),
            logger: Arc::new(NoConversationLogger),
            store: None,
            cancellation: None,
        }
    }

    pub fn with_settings(mut self, settings: DeliberationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Store that receives the record of every successfully finished stream
    pub fn with_transcript_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn settings(&self) -> &DeliberationSettings {
        &self.settings
    }

    pub(crate) fn transcript_store(&self) -> Option<Arc<dyn TranscriptStore>> {
        self.store.clone()
    }

    /// Validate the input and build a run positioned at its first turn.
    pub fn start(&self, input: RunDeliberationInput) -> Result<DeliberationRun, DomainError> {
        let flavor = input.flavor;
        let parameters = flavor.prepare_parameters(input.parameters)?;
        let max = input
            .max_rounds_or_turns
            .unwrap_or_else(|| self.settings.default_ceiling(flavor));
        if max == 0 {
            return Err(DomainError::InvalidParameters(
                "round/turn ceiling must be at least 1".to_string(),
            ));
        }

        let (cap, synthesis_cap) = if input.enable_retrieval {
            (
                self.settings.retrieval_cap,
                self.settings.synthesis_cap(flavor),
            )
        } else {
            (0, 0)
        };

        let gateway: Arc<dyn LlmGateway> = self.gateway.clone();
        let retrieval: Arc<dyn RetrievalPort> = self.retrieval.clone();

        let agents = flavor
            .ordinary_roles()
            .into_iter()
            .map(|role| {
                let strategy = strategy_for(&role)?;
                Ok(
                    Agent::new(role, strategy, gateway.clone(), retrieval.clone())
                        .with_retrieval_cap(cap),
                )
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let synthesizer_role = flavor.synthesizer();
        let synthesizer = Agent::new(
            synthesizer_role.clone(),
            strategy_for(&synthesizer_role)?,
            gateway,
            retrieval,
        )
        .with_retrieval_cap(synthesis_cap)
        .with_dialogue(false);

        let rule = flavor
            .termination_rule()
            .with_completion_phrases(self.settings.completion_phrases.clone());
        let state = DeliberationState::new(parameters, flavor.initial_counter(), max);
        let session_id = input
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(
            flavor = %flavor,
            session_id = %session_id,
            max_rounds_or_turns = max,
            retrieval_cap = cap,
            "Starting deliberation"
        );
        self.logger.log(ConversationEvent::new(
            "run_started",
            json!({
                "session_id": session_id,
                "flavor": flavor,
                "parameters": state.parameters(),
                "max_rounds_or_turns": max,
                "retrieval_cap": cap,
                "synthesis_retrieval_cap": synthesis_cap,
            }),
        ));

        let mut run = DeliberationRun::new(flavor, state, agents, synthesizer, rule)?
            .with_session_id(session_id)
            .with_conversation_logger(self.logger.clone());
        if let Some(token) = &self.cancellation {
            run = run.with_cancellation(token.clone());
        }
        Ok(run)
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunDeliberationInput,
    ) -> Result<DeliberationRecord, RunDeliberationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunDeliberationInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<DeliberationRecord, RunDeliberationError> {
        let mut run = self.start(input)?;
        progress.on_run_start(run.flavor(), run.state().max_rounds_or_turns());

        while !run.is_finished() {
            let stage = run.stage();
            let counter = run.state().round_or_turn_counter();
            let pending = run.pending_role().cloned();
            if let Some(role) = &pending {
                if stage == Stage::TerminalSynthesis {
                    progress.on_synthesis_start(role);
                } else {
                    progress.on_turn_start(role, counter);
                }
            }

            match run.step().await {
                Ok(StepOutcome::TurnCommitted { role }) => {
                    progress.on_turn_complete(&role, counter, true)
                }
                Ok(StepOutcome::CycleAdvanced {
                    counter,
                    termination,
                }) => progress.on_cycle_advance(counter, termination.as_ref()),
                Ok(StepOutcome::Synthesized { role }) => {
                    progress.on_synthesis_complete(&role, true)
                }
                Err(e) => {
                    if let Some(role) = &pending {
                        if stage == Stage::TerminalSynthesis {
                            progress.on_synthesis_complete(role, false);
                        } else {
                            progress.on_turn_complete(role, counter, false);
                        }
                    }
                    return Err(e);
                }
            }
        }

        let record = run.into_record();
        if let Some(store) = &self.store
            && let Err(e) = store.save(&record).await
        {
            warn!(session_id = %record.session_id, "Failed to save transcript: {}", e);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, RecordingLogger, RecordingRetrieval, ScriptedGateway};
    use agora_domain::{ReferenceSnippet, Turn};
    use std::sync::Mutex;

    fn property_params() -> Parameters {
        Parameters::new()
            .with("budget", "500M")
            .with("property_type", "apartment")
            .with("preference1", "near subway")
    }

    fn use_case(
        gateway: &Arc<ScriptedGateway>,
        retrieval: &Arc<RecordingRetrieval>,
    ) -> RunDeliberationUseCase<ScriptedGateway, RecordingRetrieval> {
        RunDeliberationUseCase::new(gateway.clone(), retrieval.clone())
    }

    fn turn(role: RoleId, content: &str, n: u32) -> Turn {
        Turn {
            role,
            content: content.to_string(),
            round_or_turn: n,
        }
    }

    // ==================== End-to-end Scenarios ====================

    #[tokio::test]
    async fn test_adversarial_single_round() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Ok("Y"), Ok("Verdict")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());

        let record = use_case(&gateway, &retrieval)
            .execute(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(1)
                    .with_session_id("abc"),
            )
            .await
            .unwrap();

        assert_eq!(
            record.transcript,
            vec![
                turn(RoleId::rational(), "X", 1),
                turn(RoleId::emotional(), "Y", 1)
            ]
        );
        assert_eq!(record.rounds, 2);
        assert!(record.completed);
        assert_eq!(record.session_id, "abc");
        assert_eq!(record.summary(), Some("Verdict"));
        assert_eq!(gateway.requests().len(), 3);
        assert_eq!(gateway.requests()[2].role, RoleId::mediator());
    }

    #[tokio::test]
    async fn test_dialogic_two_turns() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("d1"),
            Ok("p1"),
            Ok("d2"),
            Ok("p2"),
            Ok("summary"),
        ]));
        let retrieval = Arc::new(RecordingRetrieval::empty());

        let record = use_case(&gateway, &retrieval)
            .execute(
                RunDeliberationInput::new(
                    Flavor::Dialogic,
                    Parameters::new().with("patient_query", "Can I lift my kids?"),
                )
                .with_max_rounds_or_turns(2),
            )
            .await
            .unwrap();

        let roles: Vec<_> = record.transcript.iter().map(|t| t.role.clone()).collect();
        assert_eq!(
            roles,
            vec![
                RoleId::doctor(),
                RoleId::patient(),
                RoleId::doctor(),
                RoleId::patient()
            ]
        );
        assert_eq!(record.transcript[2].round_or_turn, 1);
        assert_eq!(record.rounds, 2);
        assert_eq!(
            record.final_artifacts.as_ref().unwrap().role,
            RoleId::coordinator()
        );
        assert!(!record.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_second_call_keeps_first_turn() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Err("provider down")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let uc = use_case(&gateway, &retrieval);

        let mut run = uc
            .start(RunDeliberationInput::new(Flavor::Adversarial, property_params()))
            .unwrap();
        run.step().await.unwrap();
        let err = run.step().await.unwrap_err();

        assert!(matches!(
            err,
            RunDeliberationError::Generation { ref role, .. } if *role == RoleId::emotional()
        ));
        assert_eq!(run.stage(), Stage::Failed);
        assert_eq!(run.state().transcript().len(), 1);
        assert!(!run.state().is_completed());
        assert!(run.state().final_artifacts().is_none());
        assert!(matches!(
            run.step().await,
            Err(RunDeliberationError::AlreadyFinished)
        ));
    }

    // ==================== Properties ====================

    #[tokio::test]
    async fn test_disabled_retrieval_never_calls_port() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("X1"),
            Ok("Y1"),
            Ok("X2"),
            Ok("Y2"),
            Ok("Verdict"),
        ]));
        let retrieval = Arc::new(RecordingRetrieval::with_snippets(vec![
            ReferenceSnippet::new("unused", "src"),
        ]));

        let record = use_case(&gateway, &retrieval)
            .execute(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(2)
                    .without_retrieval(),
            )
            .await
            .unwrap();

        assert_eq!(retrieval.call_count(), 0);
        assert!(record.retrieved_docs.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_caps_per_role() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("d1"),
            Ok("p1"),
            Ok("summary"),
        ]));
        let retrieval = Arc::new(RecordingRetrieval::with_snippets(vec![
            ReferenceSnippet::new("a", "s1"),
            ReferenceSnippet::new("b", "s2"),
            ReferenceSnippet::new("c", "s3"),
        ]));

        let record = use_case(&gateway, &retrieval)
            .execute(
                RunDeliberationInput::new(
                    Flavor::Dialogic,
                    Parameters::new().with("patient_query", "q"),
                )
                .with_max_rounds_or_turns(1),
            )
            .await
            .unwrap();

        let caps: Vec<_> = retrieval.requests().iter().map(|r| r.max_results).collect();
        assert_eq!(caps, vec![2, 2, 1]);
        assert_eq!(record.retrieved_docs[&RoleId::doctor()].len(), 2);
        assert_eq!(record.retrieved_docs[&RoleId::coordinator()].len(), 1);
    }

    #[tokio::test]
    async fn test_replay_is_deterministic() {
        let script = || vec![Ok("X1"), Ok("Y1"), Ok("X2"), Ok("Y2"), Ok("Verdict")];
        let mut records = Vec::new();
        for _ in 0..2 {
            let gateway = Arc::new(ScriptedGateway::new(script()));
            let retrieval = Arc::new(RecordingRetrieval::with_snippets(vec![
                ReferenceSnippet::new("fact", "src"),
            ]));
            records.push(
                use_case(&gateway, &retrieval)
                    .execute(
                        RunDeliberationInput::new(Flavor::Adversarial, property_params())
                            .with_max_rounds_or_turns(2),
                    )
                    .await
                    .unwrap(),
            );
        }

        assert_eq!(records[0].transcript, records[1].transcript);
        assert_eq!(records[0].rounds, records[1].rounds);
        assert_eq!(records[0].retrieved_docs, records[1].retrieved_docs);
        assert_eq!(records[0].final_artifacts, records[1].final_artifacts);
    }

    #[tokio::test]
    async fn test_completion_phrase_ends_after_current_cycle() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("Walk ten minutes a day."),
            Ok("Okay. Thank you, that was helpful."),
            Ok("summary"),
        ]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let uc = use_case(&gateway, &retrieval);

        let mut run = uc
            .start(
                RunDeliberationInput::new(
                    Flavor::Dialogic,
                    Parameters::new().with("patient_query", "Is walking okay?"),
                )
                .with_max_rounds_or_turns(6),
            )
            .unwrap();

        run.step().await.unwrap();
        run.step().await.unwrap();
        let outcome = run.step().await.unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::CycleAdvanced {
                counter: 1,
                termination: Some(TerminationReason::CompletionSignal { .. })
            }
        ));
        assert_eq!(run.stage(), Stage::TerminalSynthesis);

        run.step().await.unwrap();
        assert!(run.is_done());
        assert_eq!(run.state().transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_completion_phrases() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("d1"),
            Ok("Thank you"),
            Ok("d2"),
            Ok("All sorted."),
            Ok("summary"),
        ]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let settings =
            DeliberationSettings::default().with_completion_phrases(vec!["all sorted".into()]);

        let record = use_case(&gateway, &retrieval)
            .with_settings(settings)
            .execute(RunDeliberationInput::new(
                Flavor::Dialogic,
                Parameters::new().with("patient_query", "q"),
            ))
            .await
            .unwrap();

        assert_eq!(record.transcript.len(), 4);
        assert_eq!(record.rounds, 2);
    }

    fn strict_run(
        rule: TerminationRule,
        gateway: &Arc<ScriptedGateway>,
    ) -> DeliberationRun {
        let gateway: Arc<dyn LlmGateway> = gateway.clone();
        let retrieval: Arc<dyn RetrievalPort> = Arc::new(RecordingRetrieval::empty());
        let agent = |role: RoleId| {
            let strategy = strategy_for(&role).unwrap();
            Agent::new(role, strategy, gateway.clone(), retrieval.clone())
        };
        DeliberationRun::new(
            Flavor::Dialogic,
            DeliberationState::new(Parameters::new().with("patient_query", "q"), 1, 2),
            vec![agent(RoleId::doctor()), agent(RoleId::patient())],
            agent(RoleId::coordinator()),
            rule,
        )
        .unwrap()
    }

    async fn drive(run: &mut DeliberationRun) {
        while !run.is_finished() {
            run.step().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_round_and_turn_ceilings_differ_from_same_start() {
        let replies = || vec![Ok("a"), Ok("b"), Ok("c"), Ok("d"), Ok("s")];

        let gateway = Arc::new(ScriptedGateway::new(replies()));
        let mut rounds = strict_run(TerminationRule::RoundCeiling, &gateway);
        drive(&mut rounds).await;
        assert_eq!(rounds.state().transcript().len(), 4);
        assert_eq!(rounds.state().round_or_turn_counter(), 3);

        let gateway = Arc::new(ScriptedGateway::new(replies()));
        let mut turns = strict_run(TerminationRule::turn_ceiling(RoleId::patient()), &gateway);
        drive(&mut turns).await;
        assert_eq!(turns.state().transcript().len(), 2);
        assert_eq!(turns.state().round_or_turn_counter(), 2);
    }

    #[tokio::test]
    async fn test_counter_equals_initial_plus_cycles() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("X1"),
            Ok("Y1"),
            Ok("X2"),
            Ok("Y2"),
            Ok("X3"),
            Ok("Y3"),
            Ok("Verdict"),
        ]));
        let retrieval = Arc::new(RecordingRetrieval::empty());

        let record = use_case(&gateway, &retrieval)
            .execute(RunDeliberationInput::new(
                Flavor::Adversarial,
                property_params(),
            ))
            .await
            .unwrap();

        assert_eq!(record.transcript.len(), 6);
        assert_eq!(record.rounds, 1 + 3);
        for (i, t) in record.transcript.iter().enumerate() {
            assert_eq!(t.round_or_turn, 1 + (i as u32) / 2);
        }
    }

    // ==================== Validation ====================

    #[tokio::test]
    async fn test_rejects_missing_parameters_and_zero_ceiling() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let uc = use_case(&gateway, &retrieval);

        let err = uc
            .execute(RunDeliberationInput::new(
                Flavor::Dialogic,
                Parameters::new(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, RunDeliberationError::InvalidInput(_)));

        let err = uc
            .execute(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunDeliberationError::InvalidInput(_)));
        assert!(gateway.requests().is_empty());
    }

    #[test]
    fn test_run_rejects_bad_role_sequences() {
        let gateway: Arc<dyn LlmGateway> = Arc::new(ScriptedGateway::new(vec![]));
        let retrieval: Arc<dyn RetrievalPort> = Arc::new(RecordingRetrieval::empty());
        let agent = |role: RoleId| {
            let strategy = strategy_for(&role).unwrap();
            Agent::new(role, strategy, gateway.clone(), retrieval.clone())
        };
        let state = || DeliberationState::new(Parameters::new(), 1, 1);

        let empty = DeliberationRun::new(
            Flavor::Adversarial,
            state(),
            vec![],
            agent(RoleId::mediator()),
            TerminationRule::RoundCeiling,
        );
        assert!(matches!(empty, Err(DomainError::EmptyRoleSequence)));

        let duplicate = DeliberationRun::new(
            Flavor::Adversarial,
            state(),
            vec![agent(RoleId::rational()), agent(RoleId::rational())],
            agent(RoleId::mediator()),
            TerminationRule::RoundCeiling,
        );
        assert!(matches!(duplicate, Err(DomainError::DuplicateRole(_))));
    }

    #[test]
    fn test_unknown_role_has_no_strategy() {
        assert!(strategy_for(&RoleId::new("JUDGE_AGENT")).is_err());
    }

    // ==================== Cancellation / Logging / Progress ====================

    #[tokio::test]
    async fn test_cancelled_run_stops() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Ok("Y"), Ok("V")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let token = CancellationToken::new();
        token.cancel();

        let err = use_case(&gateway, &retrieval)
            .with_cancellation(token)
            .execute(RunDeliberationInput::new(
                Flavor::Adversarial,
                property_params(),
            ))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_conversation_log_sequence() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Ok("Y"), Ok("V")]));
        let retrieval = Arc::new(RecordingRetrieval::with_snippets(vec![
            ReferenceSnippet::new("fact", "src"),
        ]));
        let logger = Arc::new(RecordingLogger::default());

        use_case(&gateway, &retrieval)
            .with_conversation_logger(logger.clone())
            .execute(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(1)
                    .with_session_id("s-1"),
            )
            .await
            .unwrap();

        assert_eq!(
            logger.event_types(),
            vec![
                "run_started",
                "retrieval",
                "turn_committed",
                "retrieval",
                "turn_committed",
                "cycle_advanced",
                "retrieval",
                "synthesis_completed",
            ]
        );
        let committed = logger.payloads("turn_committed");
        assert_eq!(committed[0]["session_id"], "s-1");
        assert_eq!(committed[0]["role"], "RATIONAL_AGENT");
        assert_eq!(committed[1]["content"], "Y");
    }

    #[tokio::test]
    async fn test_failure_is_logged() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err("boom")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let logger = Arc::new(RecordingLogger::default());

        let _ = use_case(&gateway, &retrieval)
            .with_conversation_logger(logger.clone())
            .execute(RunDeliberationInput::new(
                Flavor::Adversarial,
                property_params(),
            ))
            .await;

        assert_eq!(logger.event_types(), vec!["run_started", "run_failed"]);
        assert_eq!(logger.payloads("run_failed")[0]["transcript_len"], 0);
    }

    #[derive(Default)]
    struct RecordingProgress {
        calls: Mutex<Vec<String>>,
    }

    impl ProgressNotifier for RecordingProgress {
        fn on_turn_start(&self, role: &RoleId, counter: u32) {
            self.calls.lock().unwrap().push(format!("start {role} {counter}"));
        }

        fn on_turn_complete(&self, role: &RoleId, _counter: u32, success: bool) {
            self.calls.lock().unwrap().push(format!("done {role} {success}"));
        }

        fn on_cycle_advance(&self, counter: u32, reason: Option<&TerminationReason>) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("cycle {counter} {}", reason.is_some()));
        }

        fn on_synthesis_complete(&self, role: &RoleId, success: bool) {
            self.calls.lock().unwrap().push(format!("synth {role} {success}"));
        }
    }

    #[tokio::test]
    async fn test_progress_callbacks_in_order() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Ok("Y"), Ok("V")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let progress = RecordingProgress::default();

        use_case(&gateway, &retrieval)
            .execute_with_progress(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(1),
                &progress,
            )
            .await
            .unwrap();

        assert_eq!(
            *progress.calls.lock().unwrap(),
            vec![
                "start RATIONAL_AGENT 1",
                "done RATIONAL_AGENT true",
                "start EMOTIONAL_AGENT 1",
                "done EMOTIONAL_AGENT true",
                "cycle 2 true",
                "synth MEDIATOR_AGENT true",
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_saves_finished_record() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Ok("Y"), Ok("V")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let store = Arc::new(MemoryStore::default());

        let record = use_case(&gateway, &retrieval)
            .with_transcript_store(store.clone())
            .execute(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(1)
                    .with_session_id("exec-1"),
            )
            .await
            .unwrap();

        assert_eq!(store.get("exec-1").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_execute_failure_saves_nothing() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X"), Err("down")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let store = Arc::new(MemoryStore::default());

        let result = use_case(&gateway, &retrieval)
            .with_transcript_store(store.clone())
            .execute(
                RunDeliberationInput::new(Flavor::Adversarial, property_params())
                    .with_max_rounds_or_turns(1),
            )
            .await;

        assert!(result.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }
}
