//! Finished-run snapshot handed to persistence collaborators

use crate::core::parameters::Parameters;
use crate::core::role::RoleId;
use crate::deliberation::flavor::Flavor;
use crate::deliberation::state::{DeliberationState, FinalArtifacts, ReferenceSnippet, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete result of a deliberation (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationRecord {
    pub session_id: String,
    pub flavor: Flavor,
    pub parameters: Parameters,
    pub transcript: Vec<Turn>,
    pub retrieved_docs: BTreeMap<RoleId, Vec<ReferenceSnippet>>,
    pub final_artifacts: Option<FinalArtifacts>,
    /// Counter value when the run finished
    pub rounds: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl DeliberationRecord {
    pub fn from_state(
        session_id: impl Into<String>,
        flavor: Flavor,
        state: &DeliberationState,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            flavor,
            parameters: state.parameters().clone(),
            transcript: state.transcript().to_vec(),
            retrieved_docs: state.retrieved_docs().clone(),
            final_artifacts: state.final_artifacts().cloned(),
            rounds: state.round_or_turn_counter(),
            completed: state.is_completed(),
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> Option<&str> {
        self.final_artifacts.as_ref().map(|a| a.summary.as_str())
    }
}
