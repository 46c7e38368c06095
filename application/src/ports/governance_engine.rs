//! Governance engine port

use super::security_manager::PolicyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub compliant: bool,
    pub violations: Vec<String>,
}

/// Compliance and policy checks for collaborations
#[async_trait]
pub trait GovernanceEngine: Send + Sync {
    async fn validate_compliance(
        &self,
        collaboration_id: &str,
        context: &Value,
    ) -> Result<ComplianceReport, PolicyError>;

    /// Evaluate a single named policy
    async fn check_policy(&self, collaboration_id: &str, policy: &str, context: &Value) -> Result<bool, PolicyError>;
}

/// Reports everything as compliant
pub struct NoGovernance;

#[async_trait]
impl GovernanceEngine for NoGovernance {
    async fn validate_compliance(&self, _collaboration_id: &str, _context: &Value) -> Result<ComplianceReport, PolicyError> {
        Ok(ComplianceReport {
            compliant: true,
            violations: Vec::new(),
        })
    }

    async fn check_policy(&self, _collaboration_id: &str, _policy: &str, _context: &Value) -> Result<bool, PolicyError> {
        Ok(true)
    }
}
