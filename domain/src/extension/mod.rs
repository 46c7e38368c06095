//! Extension subdomain: installable plugins, adapters, and hooks.

pub mod entities;
pub mod lifecycle;
pub mod repository;
pub mod value_objects;

pub use entities::{ExtensionData, ExtensionEntity, NewExtension, is_breaking_change, is_valid_version};
pub use lifecycle::{
    CompatibilityCheck, DependencyResolution, ExtensionLifecycleManagementService, InstallPhase,
    InstallationResult, LifecycleError, SecurityValidation, ThreatLevel, UninstallOptions,
    UninstallResult, UpdateResult,
};
pub use repository::{ExtensionQueryFilter, ExtensionRepository, ExtensionStatistics};
pub use value_objects::{
    ApiExtension, AuditEvent, AuditEventType, EventSubscription, ExtensionCompatibility,
    ExtensionConfiguration, ExtensionDependency, ExtensionMetadata, ExtensionPoint,
    ExtensionPointType, ExtensionSecurity, ExtensionStatus, ExtensionType, HealthStatus,
    HttpMethod, PerformanceMetrics, PermissionLevel,
};
