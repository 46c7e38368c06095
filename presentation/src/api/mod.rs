//! HTTP surface: controllers, response envelope, and the axum router

pub mod collab_controller;
pub mod envelope;
pub mod extension_controller;
pub mod router;

pub use collab_controller::CollabController;
pub use envelope::{ApiEnvelope, ApiError, ControllerResponse};
pub use extension_controller::ExtensionController;
pub use router::{ApiState, router};
