//! Structured validation issues.
//!
//! Used wherever a check can produce several findings at once
//! (strategy validation, schema validation, configuration validation)
//! instead of failing on the first problem.

use serde::{Deserialize, Serialize};

/// Severity level of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fatal: the checked value cannot be used.
    Error,
    /// Non-fatal: usable, but likely to behave poorly.
    Warning,
}

/// A detected issue with a machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Returns true when none of the issues is an error.
pub fn is_valid(issues: &[ValidationIssue]) -> bool {
    !issues.iter().any(ValidationIssue::is_error)
}
