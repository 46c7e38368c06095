//! snake_case wire format of a stored extension

use chrono::{DateTime, Utc};
use mplp_domain::extension::value_objects::{ExtensionLifecycle, VersionRecord};
use mplp_domain::extension::{
    ApiExtension, AuditEvent, EventSubscription, ExtensionCompatibility, ExtensionConfiguration,
    ExtensionMetadata, ExtensionPoint, ExtensionSecurity, ExtensionStatus, ExtensionType,
    PerformanceMetrics,
};
use serde::{Deserialize, Serialize};

/// Fields that must be present and non-null in an extension document
pub const REQUIRED_FIELDS: [&str; 8] = [
    "protocol_version",
    "timestamp",
    "extension_id",
    "context_id",
    "name",
    "version",
    "extension_type",
    "status",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSchema {
    pub protocol_version: String,
    pub timestamp: DateTime<Utc>,
    pub extension_id: String,
    pub context_id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub extension_type: ExtensionType,
    pub status: ExtensionStatus,
    #[serde(default)]
    pub compatibility: ExtensionCompatibility,
    #[serde(default)]
    pub configuration: ExtensionConfiguration,
    #[serde(default)]
    pub extension_points: Vec<ExtensionPoint>,
    #[serde(default)]
    pub api_extensions: Vec<ApiExtension>,
    #[serde(default)]
    pub event_subscriptions: Vec<EventSubscription>,
    pub lifecycle: ExtensionLifecycle,
    #[serde(default)]
    pub security: ExtensionSecurity,
    #[serde(default)]
    pub metadata: ExtensionMetadata,
    #[serde(default)]
    pub performance_metrics: PerformanceMetrics,
    #[serde(default)]
    pub audit_trail: Vec<AuditEvent>,
    #[serde(default)]
    pub version_history: Vec<VersionRecord>,
}
