//! Termination predicates evaluated once per completed cycle.
//!
//! The two built-in flavors compare the counter against the ceiling
//! differently, and only the turn-based rule has an early exit:
//!
//! | Rule | Ceiling check | Early exit |
//! |------|---------------|------------|
//! | [`TerminationRule::RoundCeiling`] | `counter > max` | none |
//! | [`TerminationRule::TurnCeiling`] | `counter >= max` | completion phrase from the responder |

use crate::core::role::RoleId;
use crate::deliberation::state::DeliberationState;
use serde::{Deserialize, Serialize};

/// Phrases that signal the responding role considers the consultation done.
pub const DEFAULT_COMPLETION_PHRASES: &[&str] = &[
    "thank you",
    "that was helpful",
    "i feel reassured",
    "i understand now",
    "that's clear enough",
    "no more questions",
];

/// Why a deliberation stopped looping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum TerminationReason {
    CeilingReached { counter: u32, max: u32 },
    CompletionSignal { role: RoleId, phrase: String },
}

/// Pluggable termination predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationRule {
    /// Stop once `counter > max` (allows exactly `max` full cycles when
    /// starting from 1).
    RoundCeiling,
    /// Stop once `counter >= max`, or as soon as the responder's latest turn
    /// contains one of `completion_phrases` (case-insensitive).
    TurnCeiling {
        responder: RoleId,
        completion_phrases: Vec<String>,
    },
}

impl TerminationRule {
    pub fn turn_ceiling(responder: RoleId) -> Self {
        Self::TurnCeiling {
            responder,
            completion_phrases: DEFAULT_COMPLETION_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Replace the completion phrases (no-op for `RoundCeiling`).
    pub fn with_completion_phrases(self, phrases: Vec<String>) -> Self {
        match self {
            Self::TurnCeiling { responder, .. } => Self::TurnCeiling {
                responder,
                completion_phrases: phrases,
            },
            other => other,
        }
    }

    /// Evaluate the predicate against the state after the counter advanced.
    pub fn evaluate(&self, state: &DeliberationState) -> Option<TerminationReason> {
        let counter = state.round_or_turn_counter();
        let max = state.max_rounds_or_turns();

        match self {
            Self::RoundCeiling => {
                (counter > max).then_some(TerminationReason::CeilingReached { counter, max })
            }
            Self::TurnCeiling {
                responder,
                completion_phrases,
            } => {
                if counter >= max {
                    return Some(TerminationReason::CeilingReached { counter, max });
                }

                let content = state.last_turn_by(responder)?.content.to_lowercase();
                completion_phrases
                    .iter()
                    .find(|p| !p.is_empty() && content.contains(&p.to_lowercase()))
                    .map(|phrase| TerminationReason::CompletionSignal {
                        role: responder.clone(),
                        phrase: phrase.clone(),
                    })
            }
        }
    }
}
