//! Role identifier value object

use serde::{Deserialize, Serialize};

/// Identifier of a participant role in a deliberation (Value Object)
///
/// Roles are plain string identifiers so that a caller can define new
/// participants without touching the domain. The well-known roles used by
/// the built-in flavors are exposed as associated constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub const RATIONAL: &'static str = "RATIONAL_AGENT";
    pub const EMOTIONAL: &'static str = "EMOTIONAL_AGENT";
    pub const MEDIATOR: &'static str = "MEDIATOR_AGENT";
    pub const DOCTOR: &'static str = "DOCTOR_AGENT";
    pub const PATIENT: &'static str = "PATIENT_AGENT";
    pub const COORDINATOR: &'static str = "COORDINATOR_AGENT";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn rational() -> Self {
        Self::new(Self::RATIONAL)
    }

    pub fn emotional() -> Self {
        Self::new(Self::EMOTIONAL)
    }

    pub fn mediator() -> Self {
        Self::new(Self::MEDIATOR)
    }

    pub fn doctor() -> Self {
        Self::new(Self::DOCTOR)
    }

    pub fn patient() -> Self {
        Self::new(Self::PATIENT)
    }

    pub fn coordinator() -> Self {
        Self::new(Self::COORDINATOR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable label used in prompts and console output.
    ///
    /// Unknown roles are displayed by their identifier.
    pub fn display_name(&self) -> &str {
        match self.0.as_str() {
            Self::RATIONAL => "Rational Advisor",
            Self::EMOTIONAL => "Emotional Advisor",
            Self::MEDIATOR => "Mediator",
            Self::DOCTOR => "Doctor",
            Self::PATIENT => "Patient",
            Self::COORDINATOR => "Coordinator",
            other => other,
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        RoleId::new(s)
    }
}

impl From<String> for RoleId {
    fn from(s: String) -> Self {
        RoleId(s)
    }
}
