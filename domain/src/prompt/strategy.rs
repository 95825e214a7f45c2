//! Prompt-building strategy injected into every agent.
//!
//! All agents share one pipeline (retrieve → compose → generate → commit);
//! a [`PromptStrategy`] supplies the only parts that vary per role.

use crate::deliberation::state::DeliberationState;

/// Inputs available while composing the current prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub state: &'a DeliberationState,
    /// Retrieved references already rendered with [`format_references`](super::format_references).
    /// Empty when retrieval is disabled or returned nothing.
    pub references: &'a str,
}

/// Role-specific prompt construction
pub trait PromptStrategy: Send + Sync {
    /// Fixed system instruction for the role.
    fn system_instruction(&self) -> &str;

    /// Retrieval query built from the run parameters plus role bias terms.
    fn retrieval_query(&self, state: &DeliberationState) -> String;

    /// The role- and round-dependent instruction for this turn.
    fn compose(&self, ctx: &PromptContext<'_>) -> String;
}
