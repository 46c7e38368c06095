//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// The `Display` text of each variant is the message surfaced to API
/// clients, so variants carry the full human-readable sentence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    LimitExceeded(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        DomainError::InvalidState(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    /// Check if this error represents a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }

    /// Check if this error was caused by bad input rather than state
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_) | DomainError::Duplicate(_) | DomainError::LimitExceeded(_)
        )
    }
}

/// Errors raised by repository implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_message() {
        let error = DomainError::not_found("Collaboration not found");
        assert_eq!(error.to_string(), "Collaboration not found");
    }

    #[test]
    fn test_error_classification() {
        assert!(DomainError::not_found("x").is_not_found());
        assert!(!DomainError::invalid_state("x").is_not_found());
        assert!(DomainError::validation("x").is_validation());
        assert!(DomainError::Duplicate("x".into()).is_validation());
        assert!(!DomainError::invalid_state("x").is_validation());
    }

    #[test]
    fn test_repository_corrupt_display() {
        let error = RepositoryError::Corrupt("bad mode".into());
        assert_eq!(error.to_string(), "Stored record is corrupt: bad mode");
        assert!(!error.is_not_found());
    }
}
