//! Audit log configuration from TOML (`[audit]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw audit configuration from TOML
///
/// ```toml
/// [audit]
/// enabled = true
/// path = "/var/log/mplp/audit.jsonl"   # defaults to the user data dir
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

impl FileAuditConfig {
    /// Where audit records go, if auditing is enabled.
    ///
    /// Falls back to `$XDG_DATA_HOME/mplp/audit.jsonl` when no path is set.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("mplp").join("audit.jsonl")))
    }
}
