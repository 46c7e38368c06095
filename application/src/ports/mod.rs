//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod audit_logger;
pub mod governance_engine;
pub mod metrics_source;
pub mod security_manager;
