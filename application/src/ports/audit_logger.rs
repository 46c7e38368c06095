//! Port for structured audit logging.
//!
//! Defines the [`AuditLogger`] trait for recording security-relevant events
//! (access decisions, compliance checks, lifecycle changes) to a durable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! diagnostic messages, while this port captures the audit record in a
//! machine-readable format (JSONL).

use serde_json::{Value, json};

/// A structured audit record.
pub struct AuditRecord {
    /// Record type identifier (e.g., "access_granted", "compliance_check").
    pub event_type: &'static str,
    /// JSON payload with record-specific data.
    pub payload: Value,
}

impl AuditRecord {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn access(granted: bool, user_id: &str, collaboration_id: &str, action: &str) -> Self {
        Self::new(
            if granted { "access_granted" } else { "access_denied" },
            json!({
                "user_id": user_id,
                "collaboration_id": collaboration_id,
                "action": action,
            }),
        )
    }

    pub fn compliance_check(collaboration_id: &str, check_type: &str, compliant: bool, violations: &[String]) -> Self {
        Self::new(
            "compliance_check",
            json!({
                "collaboration_id": collaboration_id,
                "check_type": check_type,
                "compliant": compliant,
                "violations": violations,
            }),
        )
    }

    pub fn security_event(collaboration_id: &str, description: &str) -> Self {
        Self::new(
            "security_event",
            json!({
                "collaboration_id": collaboration_id,
                "description": description,
            }),
        )
    }
}

/// Port for writing audit records.
///
/// `log` is synchronous and non-fallible so an audit sink failure never
/// interrupts the operation being audited.
pub trait AuditLogger: Send + Sync {
    fn log(&self, record: AuditRecord);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _record: AuditRecord) {}
}
