//! Collaboration policy: limits applied on top of the aggregate's own rules.

use serde::{Deserialize, Serialize};

/// Organisation-level limits for collaborations.
///
/// The aggregate itself allows up to 100 participants; this policy can
/// tighten that for a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabPolicy {
    /// Maximum participants accepted by `create_collaboration`.
    pub max_participants: usize,
    /// Page size used when a list request leaves `limit` unset.
    pub default_page_size: usize,
    /// Replace the requested strategy with the advisor's recommendation
    /// on create.
    pub optimize_strategy: bool,
}

impl Default for CollabPolicy {
    fn default() -> Self {
        Self {
            max_participants: 50,
            default_page_size: 10,
            optimize_strategy: false,
        }
    }
}

impl CollabPolicy {
    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_optimize_strategy(mut self, enabled: bool) -> Self {
        self.optimize_strategy = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let policy = CollabPolicy::default();
        assert_eq!(policy.max_participants, 50);
        assert_eq!(policy.default_page_size, 10);
        assert!(!policy.optimize_strategy);
    }

    #[test]
    fn test_builder() {
        let policy = CollabPolicy::default()
            .with_max_participants(8)
            .with_optimize_strategy(true);
        assert_eq!(policy.max_participants, 8);
        assert!(policy.optimize_strategy);
    }
}
