//! Security manager port
//!
//! Defines how the application layer asks an external authority whether a
//! user may perform an action on a collaboration.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from security and governance adapters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("Policy service unavailable: {0}")]
    Unavailable(String),

    #[error("Policy evaluation failed: {0}")]
    Evaluation(String),
}

/// Permission authority for collaborations
#[async_trait]
pub trait SecurityManager: Send + Sync {
    /// Whether `user_id` holds the permission for `action` on `resource`
    async fn validate_permission(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, PolicyError>;

    /// Whether `user_id` may access the collaboration at all
    async fn check_access(&self, user_id: &str, collaboration_id: &str) -> Result<bool, PolicyError>;
}

/// Grants every request. For tests and single-user deployments.
pub struct PermitAll;

#[async_trait]
impl SecurityManager for PermitAll {
    async fn validate_permission(&self, _user_id: &str, _resource: &str, _action: &str) -> Result<bool, PolicyError> {
        Ok(true)
    }

    async fn check_access(&self, _user_id: &str, _collaboration_id: &str) -> Result<bool, PolicyError> {
        Ok(true)
    }
}
