//! Configuration file loading for mplp
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MPLP_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./mplp.toml` or `./.mplp.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/mplp/config.toml`
//! 5. Default values

mod file_config;
mod issue;
mod loader;

pub use file_config::{
    DEFAULT_BIND, FileAuditConfig, FileCollabConfig, FileConfig, FileExtensionConfig,
    FileMonitoringConfig, FileServerConfig,
};
pub use issue::{ConfigIssue, ConfigIssueCode};
pub use loader::{ConfigLoader, ConfigSource};
