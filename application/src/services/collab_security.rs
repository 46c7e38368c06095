//! Collaboration access control and governance checks
//!
//! Decisions come from the [`SecurityManager`] and [`GovernanceEngine`]
//! ports. Every decision is written to the [`AuditLogger`]. A port failure
//! is audited as a security event and treated as a denial.

use crate::ports::audit_logger::{AuditLogger, AuditRecord, NoAuditLogger};
use crate::ports::governance_engine::{ComplianceReport, GovernanceEngine, NoGovernance};
use crate::ports::security_manager::{PermitAll, PolicyError, SecurityManager};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

const COLLABORATION_RESOURCE: &str = "collaboration";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub reason: Option<String>,
}

impl AccessDecision {
    fn granted() -> Self {
        Self {
            granted: true,
            reason: None,
        }
    }

    fn denied(reason: impl Into<String>) -> Self {
        Self {
            granted: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernanceCheckResult {
    pub check_type: String,
    pub compliant: bool,
    pub violations: Vec<String>,
}

pub struct CollabSecurityService {
    security: Arc<dyn SecurityManager>,
    governance: Arc<dyn GovernanceEngine>,
    audit: Arc<dyn AuditLogger>,
}

impl Default for CollabSecurityService {
    fn default() -> Self {
        Self::new(Arc::new(PermitAll), Arc::new(NoGovernance), Arc::new(NoAuditLogger))
    }
}

impl CollabSecurityService {
    pub fn new(
        security: Arc<dyn SecurityManager>,
        governance: Arc<dyn GovernanceEngine>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self {
            security,
            governance,
            audit,
        }
    }

    /// Check that `user_id` may access the collaboration and perform `action` on it
    pub async fn validate_access(&self, action: &str, collaboration_id: &str, user_id: &str) -> AccessDecision {
        let decision = match self.evaluate_access(action, collaboration_id, user_id).await {
            Ok(decision) => decision,
            Err(e) => return self.policy_failure(collaboration_id, &e, || AccessDecision::denied(e.to_string())),
        };
        self.audit
            .log(AuditRecord::access(decision.granted, user_id, collaboration_id, action));
        if decision.granted {
            info!("Access granted: {} {} on {}", user_id, action, collaboration_id);
        } else {
            warn!("Access denied: {} {} on {}", user_id, action, collaboration_id);
        }
        decision
    }

    async fn evaluate_access(
        &self,
        action: &str,
        collaboration_id: &str,
        user_id: &str,
    ) -> Result<AccessDecision, PolicyError> {
        if !self.security.check_access(user_id, collaboration_id).await? {
            return Ok(AccessDecision::denied("User has no access to this collaboration"));
        }
        let resource = format!("{}:{}", COLLABORATION_RESOURCE, collaboration_id);
        if !self.security.validate_permission(user_id, &resource, action).await? {
            return Ok(AccessDecision::denied(format!("Permission denied for action: {}", action)));
        }
        Ok(AccessDecision::granted())
    }

    /// Run a governance check. `check_type` of `"compliance"` validates
    /// overall compliance; any other value is evaluated as a named policy.
    pub async fn perform_governance_check(
        &self,
        collaboration_id: &str,
        check_type: &str,
        context: &Value,
    ) -> GovernanceCheckResult {
        let outcome = if check_type == "compliance" {
            self.governance.validate_compliance(collaboration_id, context).await
        } else {
            self.governance
                .check_policy(collaboration_id, check_type, context)
                .await
                .map(|passed| ComplianceReport {
                    compliant: passed,
                    violations: if passed {
                        Vec::new()
                    } else {
                        vec![format!("Policy violated: {}", check_type)]
                    },
                })
        };

        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                return self.policy_failure(collaboration_id, &e, || GovernanceCheckResult {
                    check_type: check_type.to_string(),
                    compliant: false,
                    violations: vec![e.to_string()],
                });
            }
        };

        self.audit.log(AuditRecord::compliance_check(
            collaboration_id,
            check_type,
            report.compliant,
            &report.violations,
        ));
        GovernanceCheckResult {
            check_type: check_type.to_string(),
            compliant: report.compliant,
            violations: report.violations,
        }
    }

    fn policy_failure<T>(&self, collaboration_id: &str, error: &PolicyError, deny: impl FnOnce() -> T) -> T {
        warn!("Policy check failed for {}: {}", collaboration_id, error);
        self.audit
            .log(AuditRecord::security_event(collaboration_id, &error.to_string()));
        deny()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAudit {
        types: Mutex<Vec<&'static str>>,
    }

    impl AuditLogger for RecordingAudit {
        fn log(&self, record: AuditRecord) {
            self.types.lock().unwrap().push(record.event_type);
        }
    }

    struct ReadOnly;

    #[async_trait]
    impl SecurityManager for ReadOnly {
        async fn validate_permission(&self, _user: &str, _resource: &str, action: &str) -> Result<bool, PolicyError> {
            Ok(action == "read")
        }

        async fn check_access(&self, user: &str, _collaboration_id: &str) -> Result<bool, PolicyError> {
            if user == "broken" {
                return Err(PolicyError::Unavailable("timeout".into()));
            }
            Ok(user != "stranger")
        }
    }

    struct Strict;

    #[async_trait]
    impl GovernanceEngine for Strict {
        async fn validate_compliance(&self, _id: &str, context: &Value) -> Result<ComplianceReport, PolicyError> {
            let approved = context["approved"].as_bool().unwrap_or(false);
            Ok(ComplianceReport {
                compliant: approved,
                violations: if approved { vec![] } else { vec!["approval missing".into()] },
            })
        }

        async fn check_policy(&self, _id: &str, policy: &str, _context: &Value) -> Result<bool, PolicyError> {
            match policy {
                "data_residency" => Ok(false),
                "explode" => Err(PolicyError::Evaluation("bad rule".into())),
                _ => Ok(true),
            }
        }
    }

    fn service() -> (CollabSecurityService, Arc<RecordingAudit>) {
        let audit = Arc::new(RecordingAudit::default());
        (
            CollabSecurityService::new(Arc::new(ReadOnly), Arc::new(Strict), audit.clone()),
            audit,
        )
    }

    #[tokio::test]
    async fn test_access_decisions_are_audited() {
        let (svc, audit) = service();
        assert!(svc.validate_access("read", "c-1", "alice").await.granted);
        let denied = svc.validate_access("delete", "c-1", "alice").await;
        assert!(!denied.granted);
        assert_eq!(denied.reason.as_deref(), Some("Permission denied for action: delete"));
        assert!(!svc.validate_access("read", "c-1", "stranger").await.granted);

        assert_eq!(
            *audit.types.lock().unwrap(),
            vec!["access_granted", "access_denied", "access_denied"]
        );
    }

    #[tokio::test]
    async fn test_port_failure_denies() {
        let (svc, audit) = service();
        let decision = svc.validate_access("read", "c-1", "broken").await;
        assert!(!decision.granted);
        assert_eq!(*audit.types.lock().unwrap(), vec!["security_event"]);
    }

    #[tokio::test]
    async fn test_governance_checks() {
        let (svc, audit) = service();
        let ok = svc
            .perform_governance_check("c-1", "compliance", &json!({"approved": true}))
            .await;
        assert!(ok.compliant);

        let policy = svc.perform_governance_check("c-1", "data_residency", &json!({})).await;
        assert!(!policy.compliant);
        assert_eq!(policy.violations, vec!["Policy violated: data_residency".to_string()]);

        let failed = svc.perform_governance_check("c-1", "explode", &json!({})).await;
        assert!(!failed.compliant);

        assert_eq!(
            *audit.types.lock().unwrap(),
            vec!["compliance_check", "compliance_check", "security_event"]
        );
    }

    #[tokio::test]
    async fn test_default_permits() {
        let svc = CollabSecurityService::default();
        assert!(svc.validate_access("write", "c-1", "anyone").await.granted);
    }
}
