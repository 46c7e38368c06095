//! Extension policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPolicy {
    /// Platform version extensions are checked against
    pub platform_version: String,
    /// Days a configuration backup is kept
    pub backup_retention_days: i64,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            platform_version: "1.0.0".to_string(),
            backup_retention_days: 30,
        }
    }
}
