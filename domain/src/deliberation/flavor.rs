//! Built-in deliberation flavors.
//!
//! Both flavors are the same state machine shape: a fixed sequence of
//! ordinary roles, a cycle-advance step, then either another cycle or the
//! terminal synthesis. They differ in roles, starting counter and
//! termination rule.

use crate::core::error::DomainError;
use crate::core::parameters::Parameters;
use crate::core::role::RoleId;
use crate::deliberation::termination::TerminationRule;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Flavor of a deliberation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// Two advisors with opposing perspectives, then a mediator (round-based).
    Adversarial,
    /// Doctor / patient dialogue, then a coordinator (turn-based).
    Dialogic,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Adversarial => "adversarial",
            Flavor::Dialogic => "dialogic",
        }
    }

    /// Ordinary roles in scheduling order.
    pub fn ordinary_roles(&self) -> Vec<RoleId> {
        match self {
            Flavor::Adversarial => vec![RoleId::rational(), RoleId::emotional()],
            Flavor::Dialogic => vec![RoleId::doctor(), RoleId::patient()],
        }
    }

    pub fn synthesizer(&self) -> RoleId {
        match self {
            Flavor::Adversarial => RoleId::mediator(),
            Flavor::Dialogic => RoleId::coordinator(),
        }
    }

    pub fn initial_counter(&self) -> u32 {
        match self {
            Flavor::Adversarial => 1,
            Flavor::Dialogic => 0,
        }
    }

    pub fn default_ceiling(&self) -> u32 {
        match self {
            Flavor::Adversarial => 3,
            Flavor::Dialogic => 6,
        }
    }

    pub fn termination_rule(&self) -> TerminationRule {
        match self {
            Flavor::Adversarial => TerminationRule::RoundCeiling,
            Flavor::Dialogic => TerminationRule::turn_ceiling(RoleId::patient()),
        }
    }

    /// Whether the synthesis output is mined for recommended items and
    /// follow-up options.
    pub fn extracts_artifacts(&self) -> bool {
        matches!(self, Flavor::Adversarial)
    }

    /// Validate caller parameters and fill flavor defaults.
    pub fn prepare_parameters(&self, parameters: Parameters) -> Result<Parameters, DomainError> {
        match self {
            Flavor::Adversarial => {
                for key in ["budget", "property_type"] {
                    if parameters.text(key).trim().is_empty() {
                        return Err(DomainError::InvalidParameters(format!(
                            "'{key}' is required"
                        )));
                    }
                }
                Ok(parameters)
            }
            Flavor::Dialogic => {
                if parameters.text("patient_query").trim().is_empty() {
                    return Err(DomainError::InvalidParameters(
                        "'patient_query' is required".to_string(),
                    ));
                }
                let mut parameters = parameters;
                if !parameters.contains_key("consultation_type") {
                    parameters = parameters.with("consultation_type", "general");
                }
                if !parameters.contains_key("patient_info") {
                    parameters = parameters.with(
                        "patient_info",
                        json!({
                            "age": "50",
                            "occupation": "office worker",
                            "family": "spouse and two children",
                            "post_surgery_period": "surgery scheduled",
                            "symptoms": "lower back pain"
                        }),
                    );
                }
                Ok(parameters)
            }
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
