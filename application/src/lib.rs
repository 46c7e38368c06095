//! Application layer for mplp
//!
//! This crate contains application services, port definitions, and service
//! policy. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;

// Re-export commonly used types
pub use config::{CollabPolicy, ExtensionPolicy, MonitoringThresholds};
pub use ports::{
    audit_logger::{AuditLogger, AuditRecord, NoAuditLogger},
    governance_engine::{ComplianceReport, GovernanceEngine, NoGovernance},
    metrics_source::{CollabObservation, MetricsSource, NoMetrics},
    security_manager::{PermitAll, PolicyError, SecurityManager},
};
pub use services::collab_analytics::{CollabAnalyticsService, PerformanceReport};
pub use services::collab_management::{
    CollabManagementService, CollabServiceError, CreateCollabRequest, ParticipantRequest,
    UpdateCollabRequest,
};
pub use services::collab_monitoring::{CollabMonitoringService, MonitoringDashboard, MonitoringStatus};
pub use services::collab_security::{AccessDecision, CollabSecurityService, GovernanceCheckResult};
pub use services::extension_configuration::{ConfigurationError, ExtensionConfigurationService};
pub use services::extension_management::{
    CreateExtensionRequest, ExtensionManagementService, ExtensionServiceError,
};
