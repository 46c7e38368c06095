//! Configuration issues found while validating a loaded [`FileConfig`](super::FileConfig)

use mplp_domain::core::validation::Severity;
use std::fmt;
use thiserror::Error;

/// Machine-readable reason for a [`ConfigIssue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// Numeric value outside its accepted range
    OutOfRange { field: String, value: String },
    /// Not a `major.minor.patch` version
    InvalidVersion { field: String, value: String },
    /// Not a parseable socket address
    InvalidAddress { field: String, value: String },
}

impl ConfigIssueCode {
    pub fn field(&self) -> &str {
        match self {
            ConfigIssueCode::OutOfRange { field, .. }
            | ConfigIssueCode::InvalidVersion { field, .. }
            | ConfigIssueCode::InvalidAddress { field, .. } => field,
        }
    }
}

/// A detected configuration problem.
///
/// Every issue is recoverable: the offending value has already been
/// replaced by a fallback when the issue is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub(crate) fn out_of_range(severity: Severity, field: &str, value: impl fmt::Display, fallback: impl fmt::Display) -> Self {
        Self {
            severity,
            code: ConfigIssueCode::OutOfRange {
                field: field.to_string(),
                value: value.to_string(),
            },
            message: format!("{}: value {} is out of range, using {}", field, value, fallback),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
