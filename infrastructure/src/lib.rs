//! Infrastructure layer for mplp
//!
//! This crate contains adapters that implement the ports and repository
//! traits defined in the inner layers: Schema mappers, in-memory
//! repositories, configuration file loading, and the JSONL audit log.

pub mod config;
pub mod logging;
pub mod mappers;
pub mod repositories;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, ConfigLoader, ConfigSource, FileConfig};
pub use logging::JsonlAuditLogger;
pub use mappers::{CollabMapper, ExtensionMapper};
pub use repositories::{InMemoryCollabRepository, InMemoryExtensionRepository};
