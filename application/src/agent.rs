//! Role-parameterized agent
//!
//! Every participant runs the same four-stage pipeline:
//!
//! | Stage | Ordinary turn | Terminal synthesis |
//! |-------|---------------|--------------------|
//! | 1. Retrieve | role query, capped | role query, capped (usually smaller) |
//! | 2. Compose | system + dialogue + prompt | system + prompt |
//! | 3. Generate | [`LlmGateway::generate`] | [`LlmGateway::generate`] |
//! | 4. Commit | append to transcript | store final artifacts |
//!
//! Only the [`PromptStrategy`] and role identity vary between agents.

use crate::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use crate::ports::retrieval::{RetrievalPort, RetrievalRequest};
use agora_domain::prompt::format_references;
use agora_domain::{
    DeliberationState, DomainError, FinalArtifacts, Message, PromptContext, PromptStrategy,
    RoleId, parse_synthesis_artifacts,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by a single agent invocation
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Generation failed for {role}: {source}")]
    Generation {
        role: RoleId,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    State(#[from] DomainError),
}

/// A deliberation participant
pub struct Agent {
    role: RoleId,
    strategy: Arc<dyn PromptStrategy>,
    gateway: Arc<dyn LlmGateway>,
    retrieval: Arc<dyn RetrievalPort>,
    retrieval_cap: usize,
    include_dialogue: bool,
    own_turns_as_assistant: bool,
}

impl Agent {
    pub fn new(
        role: RoleId,
        strategy: Arc<dyn PromptStrategy>,
        gateway: Arc<dyn LlmGateway>,
        retrieval: Arc<dyn RetrievalPort>,
    ) -> Self {
        Self {
            role,
            strategy,
            gateway,
            retrieval,
            retrieval_cap: 0,
            include_dialogue: true,
            own_turns_as_assistant: true,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_retrieval_cap(mut self, cap: usize) -> Self {
        self.retrieval_cap = cap;
        self
    }

    /// Whether prior turns are sent as dialogue messages
    pub fn with_dialogue(mut self, include: bool) -> Self {
        self.include_dialogue = include;
        self
    }

    /// Whether this role's own prior turns are sent as assistant messages
    /// (otherwise they are labeled user messages like everyone else's)
    pub fn with_own_turns_as_assistant(mut self, enabled: bool) -> Self {
        self.own_turns_as_assistant = enabled;
        self
    }

    pub fn role(&self) -> &RoleId {
        &self.role
    }

    pub fn retrieval_cap(&self) -> usize {
        self.retrieval_cap
    }

    // ==================== Pipeline ====================

    /// Run an ordinary turn: exactly one transcript entry is appended on
    /// success, none on failure.
    pub async fn run(
        &self,
        state: &mut DeliberationState,
        session_id: &str,
    ) -> Result<(), AgentError> {
        if state.is_completed() {
            return Err(DomainError::AlreadyCompleted.into());
        }

        self.retrieve(state, session_id).await;
        let messages = self.compose(state);
        let content = self.generate(messages, session_id).await?;

        let turn = state.commit_turn(self.role.clone(), content)?;
        info!(
            role = %turn.role,
            counter = turn.round_or_turn,
            chars = turn.content.len(),
            "Turn committed"
        );
        Ok(())
    }

    /// Run the terminal synthesis: populates `final_artifacts` and marks the
    /// state completed. The transcript is left untouched.
    pub async fn synthesize(
        &self,
        state: &mut DeliberationState,
        session_id: &str,
        extract_artifacts: bool,
    ) -> Result<(), AgentError> {
        if state.is_completed() {
            return Err(DomainError::AlreadyCompleted.into());
        }

        self.retrieve(state, session_id).await;
        let messages = self.compose(state);
        let summary = self.generate(messages, session_id).await?;

        let mut artifacts =
            FinalArtifacts::new(self.role.clone(), summary, state.round_or_turn_counter());
        if extract_artifacts {
            let (items, options) = parse_synthesis_artifacts(&artifacts.summary);
            debug!(
                items = items.len(),
                options = options.len(),
                "Extracted synthesis artifacts"
            );
            artifacts = artifacts
                .with_recommended_items(items)
                .with_follow_up_options(options);
        }

        state.complete(artifacts)?;
        info!(role = %self.role, "Synthesis completed");
        Ok(())
    }

    /// Stage 1: fetch references for this role, skipped when the cap is 0.
    async fn retrieve(&self, state: &mut DeliberationState, session_id: &str) {
        if self.retrieval_cap == 0 {
            return;
        }

        let request = RetrievalRequest {
            role: self.role.clone(),
            query: self.strategy.retrieval_query(state),
            max_results: self.retrieval_cap,
            session_id: session_id.to_string(),
        };
        debug!(role = %self.role, query = %request.query, "Retrieving references");

        let mut docs = self.retrieval.retrieve(&request).await;
        docs.truncate(self.retrieval_cap);
        state.record_retrieval(self.role.clone(), docs);
    }

    /// Stage 2: system instruction, prior dialogue, then the role prompt.
    fn compose(&self, state: &DeliberationState) -> Vec<Message> {
        let mut messages = vec![Message::system(self.strategy.system_instruction())];

        if self.include_dialogue {
            for turn in state.transcript() {
                if turn.role == self.role && self.own_turns_as_assistant {
                    messages.push(Message::assistant(turn.content.clone()));
                } else {
                    messages.push(Message::user(format!(
                        "{}: {}",
                        turn.role.display_name(),
                        turn.content
                    )));
                }
            }
        }

        let references = if self.retrieval_cap == 0 {
            String::new()
        } else {
            state
                .retrieved_docs()
                .get(&self.role)
                .map(|docs| format_references(docs))
                .unwrap_or_default()
        };
        let prompt = self.strategy.compose(&PromptContext {
            state,
            references: &references,
        });
        messages.push(Message::user(prompt));
        messages
    }

    /// Stage 3: one generation call, no retries.
    async fn generate(
        &self,
        messages: Vec<Message>,
        session_id: &str,
    ) -> Result<String, AgentError> {
        let request = GenerationRequest {
            role: self.role.clone(),
            messages,
            session_id: session_id.to_string(),
        };
        self.gateway
            .generate(&request)
            .await
            .map_err(|source| AgentError::Generation {
                role: self.role.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingRetrieval, ScriptedGateway};
    use agora_domain::prompt::advisory::{EmotionalAdvisor, Mediator, RationalAdvisor};
    use agora_domain::{Parameters, ReferenceSnippet, Role};

    fn state() -> DeliberationState {
        let params = Parameters::new()
            .with("budget", "500M")
            .with("property_type", "apartment");
        DeliberationState::new(params, 1, 3)
    }

    fn agent(
        role: RoleId,
        strategy: Arc<dyn PromptStrategy>,
        gateway: &Arc<ScriptedGateway>,
        retrieval: &Arc<RecordingRetrieval>,
    ) -> Agent {
        Agent::new(role, strategy, gateway.clone(), retrieval.clone())
    }

    #[tokio::test]
    async fn test_run_appends_exactly_one_turn() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let rational = agent(
            RoleId::rational(),
            Arc::new(RationalAdvisor),
            &gateway,
            &retrieval,
        );

        let mut s = state();
        rational.run(&mut s, "session-1").await.unwrap();

        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.transcript()[0].content, "X");
        assert_eq!(s.transcript()[0].round_or_turn, 1);
        assert_eq!(gateway.requests()[0].session_id, "session-1");
    }

    #[tokio::test]
    async fn test_cap_zero_skips_retrieval() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let rational = agent(
            RoleId::rational(),
            Arc::new(RationalAdvisor),
            &gateway,
            &retrieval,
        );

        let mut s = state();
        rational.run(&mut s, "s").await.unwrap();

        assert_eq!(retrieval.call_count(), 0);
        assert!(s.retrieved_docs().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_snapshot_and_prompt_references() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X")]));
        let retrieval = Arc::new(RecordingRetrieval::with_snippets(vec![
            ReferenceSnippet::new("Line 9 extension opens in May.", "transit-news"),
            ReferenceSnippet::new("Prices flat.", "market"),
            ReferenceSnippet::new("ignored", "extra"),
        ]));
        let rational = agent(
            RoleId::rational(),
            Arc::new(RationalAdvisor),
            &gateway,
            &retrieval,
        )
        .with_retrieval_cap(2);

        let mut s = state();
        rational.run(&mut s, "s").await.unwrap();

        assert_eq!(retrieval.call_count(), 1);
        let request = &retrieval.requests()[0];
        assert_eq!(request.max_results, 2);
        assert!(request.query.contains("financial stability"));

        let docs = &s.retrieved_docs()[&RoleId::rational()];
        assert_eq!(docs.len(), 2);

        let requests = gateway.requests();
        let prompt = &requests[0].messages.last().unwrap().content;
        assert!(prompt.contains("[Document 1] Source: transit-news\nLine 9 extension"));
    }

    #[tokio::test]
    async fn test_dialogue_rendering() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("Y2")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let emotional = agent(
            RoleId::emotional(),
            Arc::new(EmotionalAdvisor),
            &gateway,
            &retrieval,
        );

        let mut s = state();
        s.commit_turn(RoleId::rational(), "X1").unwrap();
        s.commit_turn(RoleId::emotional(), "Y1").unwrap();
        s.advance_cycle();
        s.commit_turn(RoleId::rational(), "X2").unwrap();
        emotional.run(&mut s, "s").await.unwrap();

        let requests = gateway.requests();
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], Message::user("Rational Advisor: X1"));
        assert_eq!(messages[2], Message::assistant("Y1"));
        assert_eq!(messages[3], Message::user("Rational Advisor: X2"));
        assert_eq!(messages[4].role, Role::User);
        assert!(messages[4].content.contains("Rebut the rational advisor"));
    }

    #[tokio::test]
    async fn test_own_turns_as_user_when_disabled() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("X2")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let rational = agent(
            RoleId::rational(),
            Arc::new(RationalAdvisor),
            &gateway,
            &retrieval,
        )
        .with_own_turns_as_assistant(false);

        let mut s = state();
        s.commit_turn(RoleId::rational(), "X1").unwrap();
        rational.run(&mut s, "s").await.unwrap();

        assert_eq!(
            gateway.requests()[0].messages[1],
            Message::user("Rational Advisor: X1")
        );
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_transcript_untouched() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err("boom")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let rational = agent(
            RoleId::rational(),
            Arc::new(RationalAdvisor),
            &gateway,
            &retrieval,
        );

        let mut s = state();
        let err = rational.run(&mut s, "s").await.unwrap_err();

        assert!(matches!(
            err,
            AgentError::Generation { ref role, .. } if *role == RoleId::rational()
        ));
        assert!(s.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_sets_artifacts_without_transcript_entry() {
        let summary = "Both sides agree.\n\n## Recommended Properties\n- Maple Court: quiet\n\n## Follow-up Options\n- Widen the budget";
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(summary)]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let mediator = agent(RoleId::mediator(), Arc::new(Mediator), &gateway, &retrieval)
            .with_dialogue(false);

        let mut s = state();
        s.commit_turn(RoleId::rational(), "X").unwrap();
        s.commit_turn(RoleId::emotional(), "Y").unwrap();
        s.advance_cycle();
        mediator.synthesize(&mut s, "s", true).await.unwrap();

        assert!(s.is_completed());
        assert_eq!(s.transcript().len(), 2);
        let artifacts = s.final_artifacts().unwrap();
        assert_eq!(artifacts.role, RoleId::mediator());
        assert_eq!(artifacts.round_or_turn, 2);
        assert_eq!(artifacts.recommended_items[0].name, "Maple Court");
        assert_eq!(artifacts.follow_up_options, vec!["Widen the budget".to_string()]);

        // System instruction plus the composed prompt only
        assert_eq!(gateway.requests()[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_synthesis_without_extraction_keeps_lists_empty() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(
            "## Recommended Properties\n- Maple Court",
        )]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let mediator = agent(RoleId::mediator(), Arc::new(Mediator), &gateway, &retrieval);

        let mut s = state();
        mediator.synthesize(&mut s, "s", false).await.unwrap();
        assert!(s.final_artifacts().unwrap().recommended_items.is_empty());
    }

    #[tokio::test]
    async fn test_no_turn_after_completion() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("summary"), Ok("late")]));
        let retrieval = Arc::new(RecordingRetrieval::empty());
        let mediator = agent(RoleId::mediator(), Arc::new(Mediator), &gateway, &retrieval);
        let rational = agent(
            RoleId::rational(),
            Arc::new(RationalAdvisor),
            &gateway,
            &retrieval,
        );

        let mut s = state();
        mediator.synthesize(&mut s, "s", false).await.unwrap();
        let err = rational.run(&mut s, "s").await.unwrap_err();

        assert!(matches!(err, AgentError::State(DomainError::AlreadyCompleted)));
        assert_eq!(gateway.requests().len(), 1);
    }
}
