//! Extension value objects and nested records

use crate::util::wire_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ExtensionType {
        Plugin => "plugin",
        Adapter => "adapter",
        Connector => "connector",
        Middleware => "middleware",
        Hook => "hook",
        Transformer => "transformer",
    }
}

wire_enum! {
    /// Lifecycle status of an extension
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub enum ExtensionStatus {
        #[default]
        Installed => "installed",
        Active => "active",
        Inactive => "inactive",
        Disabled => "disabled",
        Error => "error",
        Updating => "updating",
        Uninstalling => "uninstalling",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ExtensionPointType {
        Hook => "hook",
        Filter => "filter",
        Action => "action",
        ApiEndpoint => "api_endpoint",
        EventListener => "event_listener",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub enum HealthStatus {
        #[default]
        Healthy => "healthy",
        Degraded => "degraded",
        Unhealthy => "unhealthy",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub enum DeliveryGuarantee {
        AtMostOnce => "at_most_once",
        #[default]
        AtLeastOnce => "at_least_once",
        ExactlyOnce => "exactly_once",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum HttpMethod {
        Get => "get",
        Post => "post",
        Put => "put",
        Patch => "patch",
        Delete => "delete",
    }
}

wire_enum! {
    /// Access requested by an extension for one resource class
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
    pub enum PermissionLevel {
        #[default]
        None => "none",
        Read => "read",
        Write => "write",
        Full => "full",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum AuditEventType {
        Install => "install",
        Uninstall => "uninstall",
        Activate => "activate",
        Deactivate => "deactivate",
        Configure => "configure",
        Update => "update",
        Error => "error",
        SecurityViolation => "security_violation",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDependency {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConflict {
    pub name: String,
    pub version: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCompatibility {
    pub mplp_version: String,
    #[serde(default)]
    pub required_modules: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<ExtensionDependency>,
    #[serde(default)]
    pub conflicts: Vec<ExtensionConflict>,
}

impl Default for ExtensionCompatibility {
    fn default() -> Self {
        Self {
            mplp_version: "1.0.0".to_string(),
            required_modules: Vec::new(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
        }
    }
}

/// Configuration held by an extension. All values are free-form JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtensionConfiguration {
    #[serde(default)]
    pub schema: Value,
    #[serde(default)]
    pub current_config: Value,
    #[serde(default)]
    pub default_config: Value,
    #[serde(default)]
    pub validation_rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionPoint {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub point_type: ExtensionPointType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub execution_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiExtension {
    pub endpoint: String,
    pub method: HttpMethod,
    pub handler: String,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_minute: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscription {
    pub event_pattern: String,
    pub handler: String,
    #[serde(default)]
    pub delivery_guarantee: DeliveryGuarantee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionLifecycle {
    pub install_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub activation_count: u32,
    pub error_count: u32,
}

impl ExtensionLifecycle {
    pub fn started_at(at: DateTime<Utc>) -> Self {
        Self {
            install_date: at,
            last_update: at,
            activation_count: 0,
            error_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_memory_mb: u32,
    pub max_cpu_percent: u8,
    pub max_file_size_mb: u32,
    pub max_network_connections: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_memory_mb: 256,
            max_cpu_percent: 50,
            max_file_size_mb: 10,
            max_network_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodeSigning {
    pub required: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExtensionPermissions {
    #[serde(default)]
    pub file_system: PermissionLevel,
    #[serde(default)]
    pub network: PermissionLevel,
    #[serde(default)]
    pub database: PermissionLevel,
    #[serde(default)]
    pub api: PermissionLevel,
}

impl ExtensionPermissions {
    pub fn levels(&self) -> [(&'static str, PermissionLevel); 4] {
        [
            ("file_system", self.file_system),
            ("network", self.network),
            ("database", self.database),
            ("api", self.api),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSecurity {
    pub sandbox_enabled: bool,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(default)]
    pub code_signing: CodeSigning,
    #[serde(default)]
    pub permissions: ExtensionPermissions,
}

impl Default for ExtensionSecurity {
    fn default() -> Self {
        Self {
            sandbox_enabled: true,
            resource_limits: ResourceLimits::default(),
            code_signing: CodeSigning::default(),
            permissions: ExtensionPermissions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExtensionMetadata {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
}

/// Observed runtime metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub activation_latency_ms: f64,
    pub execution_time_ms: f64,
    pub error_rate: f64,
    pub throughput: f64,
    pub availability: f64,
    pub efficiency_score: f64,
    pub health_status: HealthStatus,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            activation_latency_ms: 0.0,
            execution_time_ms: 0.0,
            error_rate: 0.0,
            throughput: 0.0,
            availability: 1.0,
            efficiency_score: 1.0,
            health_status: HealthStatus::Healthy,
        }
    }
}

impl PerformanceMetrics {
    /// Health derived from error rate and availability
    pub fn derive_health(error_rate: f64, availability: f64) -> HealthStatus {
        if error_rate > 0.1 || availability < 0.9 {
            HealthStatus::Unhealthy
        } else if error_rate > 0.05 || availability < 0.95 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub event_type: AuditEventType,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub details: Value,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, user_id: impl Into<String>, details: Value) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type,
            timestamp: Utc::now(),
            user_id: user_id.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub previous_version: String,
    pub released_at: DateTime<Utc>,
    pub breaking: bool,
}
