//! Consultation types for the dialogic flavor

use serde::{Deserialize, Serialize};

/// Kind of clinical consultation being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    PreSurgery,
    PostSurgery,
    Rehabilitation,
    Complications,
    #[default]
    General,
}

impl ConsultationType {
    pub const ALL: [ConsultationType; 5] = [
        ConsultationType::PreSurgery,
        ConsultationType::PostSurgery,
        ConsultationType::Rehabilitation,
        ConsultationType::Complications,
        ConsultationType::General,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ConsultationType::PreSurgery => "pre_surgery",
            ConsultationType::PostSurgery => "post_surgery",
            ConsultationType::Rehabilitation => "rehabilitation",
            ConsultationType::Complications => "complications",
            ConsultationType::General => "general",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConsultationType::PreSurgery => "Pre-surgery consultation",
            ConsultationType::PostSurgery => "Post-surgery consultation",
            ConsultationType::Rehabilitation => "Rehabilitation consultation",
            ConsultationType::Complications => "Complications consultation",
            ConsultationType::General => "General consultation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConsultationType::PreSurgery => "Preparation and precautions before surgery",
            ConsultationType::PostSurgery => "Post-operative care and the recovery process",
            ConsultationType::Rehabilitation => "Rehabilitation exercise and physical therapy",
            ConsultationType::Complications => "Complications and emergency response",
            ConsultationType::General => "General information about spinal fusion",
        }
    }

    /// Parse a type code; unknown codes map to [`ConsultationType::General`].
    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(code.trim()))
            .unwrap_or_default()
    }

    /// `(code, display name, description)` for every known type.
    pub fn catalogue() -> Vec<(&'static str, &'static str, &'static str)> {
        Self::ALL
            .iter()
            .map(|t| (t.code(), t.display_name(), t.description()))
            .collect()
    }
}

impl std::fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
