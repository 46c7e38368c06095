//! Presentation layer for mplp
//!
//! This crate contains the HTTP controllers and axum router, CLI
//! definitions, and console output formatting.

pub mod api;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use api::{ApiState, CollabController, ExtensionController, router};
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleFormatter;
