//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] and [`error::RepositoryError`]
//! - [`validation::ValidationIssue`] for multi-finding checks

pub mod error;
pub mod validation;
