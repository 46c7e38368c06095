//! Collaboration configuration from TOML (`[collab]` section)

use crate::config::issue::ConfigIssue;
use mplp_application::config::CollabPolicy;
use mplp_domain::collab::repository::MAX_PAGE_SIZE;
use mplp_domain::collab::{MAX_PARTICIPANTS, MIN_PARTICIPANTS};
use mplp_domain::core::validation::Severity;
use serde::{Deserialize, Serialize};

/// Raw collab configuration from TOML
///
/// # Example
///
/// ```toml
/// [collab]
/// max_participants = 20      # 2..=100
/// default_page_size = 10     # 1..=100
/// optimize_strategy = false  # replace requested strategies with the advisor's pick
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCollabConfig {
    pub max_participants: usize,
    pub default_page_size: usize,
    pub optimize_strategy: bool,
}

impl Default for FileCollabConfig {
    fn default() -> Self {
        let policy = CollabPolicy::default();
        Self {
            max_participants: policy.max_participants,
            default_page_size: policy.default_page_size,
            optimize_strategy: policy.optimize_strategy,
        }
    }
}

impl FileCollabConfig {
    /// Convert to a [`CollabPolicy`], clamping out-of-range limits.
    pub fn to_policy(&self) -> (CollabPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let max_participants = self.max_participants.clamp(MIN_PARTICIPANTS, MAX_PARTICIPANTS);
        if max_participants != self.max_participants {
            issues.push(ConfigIssue::out_of_range(
                Severity::Warning,
                "collab.max_participants",
                self.max_participants,
                max_participants,
            ));
        }

        let page_size = self.default_page_size.clamp(1, MAX_PAGE_SIZE);
        if page_size != self.default_page_size {
            issues.push(ConfigIssue::out_of_range(
                Severity::Warning,
                "collab.default_page_size",
                self.default_page_size,
                page_size,
            ));
        }

        let policy = CollabPolicy::default()
            .with_max_participants(max_participants)
            .with_default_page_size(page_size)
            .with_optimize_strategy(self.optimize_strategy);
        (policy, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy() {
        let (policy, issues) = FileCollabConfig::default().to_policy();
        assert!(issues.is_empty());
        assert_eq!(policy, CollabPolicy::default());
    }

    #[test]
    fn test_limits_are_clamped() {
        let config = FileCollabConfig {
            max_participants: 500,
            default_page_size: 0,
            optimize_strategy: true,
        };
        let (policy, issues) = config.to_policy();
        assert_eq!(policy.max_participants, MAX_PARTICIPANTS);
        assert_eq!(policy.default_page_size, 1);
        assert!(policy.optimize_strategy);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code.field(), "collab.max_participants");
        assert!(!issues[0].is_error());
    }
}
