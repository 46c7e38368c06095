//! Domain layer for the MPLP collab and extension modules
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Collab
//!
//! A collaboration groups agents (participants) within a context and plan
//! under a coordination strategy:
//!
//! - **Mode**: how work flows (sequential, parallel, hybrid, pipeline, mesh)
//! - **Coordination strategy**: who decides and how (type + decision making)
//!
//! ## Extension
//!
//! Extensions are installable units (plugins, adapters, hooks, ...) with a
//! guarded lifecycle: installed → active ⇄ inactive → uninstalling.

pub mod collab;
pub mod core;
pub mod extension;
pub mod util;

// Re-export commonly used types
pub use collab::{
    CollabCoordinationService, CollabEntity, CollabMode, CollabParticipant, CollabRepository,
    CollabStatus, CoordinationStrategy, CoordinationType, DecisionMaking, ParticipantStatus,
};
pub use core::{
    error::{DomainError, RepositoryError},
    validation::{Severity, ValidationIssue},
};
pub use extension::{
    ExtensionEntity, ExtensionLifecycleManagementService, ExtensionRepository, ExtensionStatus,
    ExtensionType, NewExtension,
};
