//! Extension configuration from TOML (`[extension]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use mplp_application::config::ExtensionPolicy;
use mplp_domain::core::validation::Severity;
use mplp_domain::extension::is_valid_version;
use serde::{Deserialize, Serialize};

/// Raw extension configuration from TOML
///
/// # Example
///
/// ```toml
/// [extension]
/// platform_version = "1.0.0"
/// backup_retention_days = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExtensionConfig {
    pub platform_version: String,
    pub backup_retention_days: i64,
}

impl Default for FileExtensionConfig {
    fn default() -> Self {
        let policy = ExtensionPolicy::default();
        Self {
            platform_version: policy.platform_version,
            backup_retention_days: policy.backup_retention_days,
        }
    }
}

impl FileExtensionConfig {
    pub fn to_policy(&self) -> (ExtensionPolicy, Vec<ConfigIssue>) {
        let mut policy = ExtensionPolicy::default();
        let mut issues = Vec::new();

        if is_valid_version(&self.platform_version) {
            policy.platform_version = self.platform_version.clone();
        } else {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::InvalidVersion {
                    field: "extension.platform_version".to_string(),
                    value: self.platform_version.clone(),
                },
                message: format!(
                    "extension.platform_version: '{}' is not a semantic version, using '{}'",
                    self.platform_version, policy.platform_version
                ),
            });
        }

        if self.backup_retention_days >= 1 {
            policy.backup_retention_days = self.backup_retention_days;
        } else {
            issues.push(ConfigIssue::out_of_range(
                Severity::Warning,
                "extension.backup_retention_days",
                self.backup_retention_days,
                policy.backup_retention_days,
            ));
        }

        (policy, issues)
    }
}
