//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("At least one ordinary role is required")]
    EmptyRoleSequence,

    #[error("Role appears more than once in the sequence: {0}")]
    DuplicateRole(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deliberation already completed")]
    AlreadyCompleted,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyRoleSequence.is_cancelled());
        assert!(!DomainError::AlreadyCompleted.is_cancelled());
        assert!(!DomainError::InvalidParameters("test".to_string()).is_cancelled());
    }

    #[test]
    fn test_duplicate_role_display() {
        let error = DomainError::DuplicateRole("DOCTOR_AGENT".to_string());
        assert!(error.to_string().contains("DOCTOR_AGENT"));
    }
}
