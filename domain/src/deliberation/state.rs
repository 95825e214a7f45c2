//! Deliberation state: the single record threaded through a run.
//!
//! [`DeliberationState`] is owned by exactly one run. Agents borrow it
//! mutably for the length of their turn and append to it through
//! [`DeliberationState::commit_turn`]; the orchestrator advances the counter
//! between cycles. Field names are part of the external event
//! contract and are serialized verbatim.

use crate::core::error::DomainError;
use crate::core::parameters::Parameters;
use crate::core::role::RoleId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committed agent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: RoleId,
    pub content: String,
    /// Counter value at which the turn was produced.
    pub round_or_turn: u32,
}

/// A reference snippet returned by retrieval, with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSnippet {
    pub text: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
}

impl ReferenceSnippet {
    pub fn new(text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            section_label: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section_label = Some(section.into());
        self
    }
}

/// A recommended item extracted from the synthesis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Outputs produced only by the terminal synthesis agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalArtifacts {
    /// The synthesizer role (mediator / coordinator)
    pub role: RoleId,
    pub summary: String,
    /// Counter value at synthesis time
    pub round_or_turn: u32,
    #[serde(default)]
    pub recommended_items: Vec<RecommendedItem>,
    #[serde(default)]
    pub follow_up_options: Vec<String>,
}

impl FinalArtifacts {
    pub fn new(role: RoleId, summary: impl Into<String>, round_or_turn: u32) -> Self {
        Self {
            role,
            summary: summary.into(),
            round_or_turn,
            recommended_items: Vec::new(),
            follow_up_options: Vec::new(),
        }
    }

    pub fn with_recommended_items(mut self, items: Vec<RecommendedItem>) -> Self {
        self.recommended_items = items;
        self
    }

    pub fn with_follow_up_options(mut self, options: Vec<String>) -> Self {
        self.follow_up_options = options;
        self
    }
}

/// Shared mutable record of a single deliberation run (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationState {
    parameters: Parameters,
    transcript: Vec<Turn>,
    round_or_turn_counter: u32,
    max_rounds_or_turns: u32,
    retrieved_docs: BTreeMap<RoleId, Vec<ReferenceSnippet>>,
    completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_artifacts: Option<FinalArtifacts>,
}

impl DeliberationState {
    pub fn new(parameters: Parameters, initial_counter: u32, max_rounds_or_turns: u32) -> Self {
        Self {
            parameters,
            transcript: Vec::new(),
            round_or_turn_counter: initial_counter,
            max_rounds_or_turns,
            retrieved_docs: BTreeMap::new(),
            completed: false,
            final_artifacts: None,
        }
    }

    // ==================== Accessors ====================

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn round_or_turn_counter(&self) -> u32 {
        self.round_or_turn_counter
    }

    pub fn max_rounds_or_turns(&self) -> u32 {
        self.max_rounds_or_turns
    }

    pub fn retrieved_docs(&self) -> &BTreeMap<RoleId, Vec<ReferenceSnippet>> {
        &self.retrieved_docs
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn final_artifacts(&self) -> Option<&FinalArtifacts> {
        self.final_artifacts.as_ref()
    }

    /// Most recent turn committed by `role`, if any.
    pub fn last_turn_by(&self, role: &RoleId) -> Option<&Turn> {
        self.transcript.iter().rev().find(|t| &t.role == role)
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.transcript.last()
    }

    // ==================== Transitions ====================

    /// Append a turn for `role` stamped with the current counter.
    pub fn commit_turn(
        &mut self,
        role: RoleId,
        content: impl Into<String>,
    ) -> Result<&Turn, DomainError> {
        if self.completed {
            return Err(DomainError::AlreadyCompleted);
        }
        self.transcript.push(Turn {
            role,
            content: content.into(),
            round_or_turn: self.round_or_turn_counter,
        });
        // Just pushed, so the transcript is non-empty.
        Ok(&self.transcript[self.transcript.len() - 1])
    }

    /// Replace the retrieval snapshot for `role`.
    pub fn record_retrieval(&mut self, role: RoleId, docs: Vec<ReferenceSnippet>) {
        self.retrieved_docs.insert(role, docs);
    }

    /// Advance the counter by exactly one completed cycle.
    pub fn advance_cycle(&mut self) -> u32 {
        self.round_or_turn_counter += 1;
        self.round_or_turn_counter
    }

    /// Store the terminal synthesis output and mark the run completed.
    pub fn complete(&mut self, artifacts: FinalArtifacts) -> Result<(), DomainError> {
        if self.completed {
            return Err(DomainError::AlreadyCompleted);
        }
        self.final_artifacts = Some(artifacts);
        self.completed = true;
        Ok(())
    }
}
