//! Application services
//!
//! Orchestrate repositories, domain services, and ports.

pub mod collab_analytics;
pub mod collab_management;
pub mod collab_monitoring;
pub mod collab_security;
pub mod estimates;
pub mod extension_configuration;
pub mod extension_management;

#[cfg(test)]
pub(crate) mod test_support;
