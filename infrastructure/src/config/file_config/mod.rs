//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application policy
//! types, reporting any value that had to be replaced.

mod audit;
mod collab;
mod extension;
mod monitoring;
mod server;

pub use audit::FileAuditConfig;
pub use collab::FileCollabConfig;
pub use extension::FileExtensionConfig;
pub use monitoring::FileMonitoringConfig;
pub use server::{DEFAULT_BIND, FileServerConfig};

use super::issue::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Collaboration limits and listing defaults
    pub collab: FileCollabConfig,
    /// Alert thresholds
    pub monitoring: FileMonitoringConfig,
    /// Platform version and configuration backups
    pub extension: FileExtensionConfig,
    /// HTTP bind address for `mplp serve`
    pub server: FileServerConfig,
    /// JSONL audit trail
    pub audit: FileAuditConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.collab.to_policy().1);
        issues.extend(self.monitoring.to_thresholds().1);
        issues.extend(self.extension.to_policy().1);
        issues.extend(self.server.parse_bind().1);
        issues
    }
}
