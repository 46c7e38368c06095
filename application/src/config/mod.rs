//! Application-level configuration.
//!
//! These types control how services behave:
//!
//! - [`CollabPolicy`]: participant limits and listing defaults
//! - [`MonitoringThresholds`]: alert thresholds for collaboration monitoring
//! - [`ExtensionPolicy`]: platform version and configuration backup retention

pub mod collab_policy;
pub mod extension_policy;
pub mod monitoring_thresholds;

pub use collab_policy::CollabPolicy;
pub use extension_policy::ExtensionPolicy;
pub use monitoring_thresholds::MonitoringThresholds;
