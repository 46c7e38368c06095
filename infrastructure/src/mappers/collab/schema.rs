//! snake_case wire format of a stored collaboration
//!
//! Field names here are the protocol names and must not change. The
//! cross-cutting blocks (`audit_trail` through `event_integration`) are
//! owned by the repository; the aggregate never sees them.

use chrono::{DateTime, Utc};
use mplp_domain::collab::{CollabMode, CollabStatus, CoordinationStrategy, ParticipantStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level fields a collaboration Schema document must carry
pub const REQUIRED_FIELDS: [&str; 19] = [
    "collaboration_id",
    "protocol_version",
    "timestamp",
    "context_id",
    "plan_id",
    "name",
    "mode",
    "participants",
    "coordination_strategy",
    "status",
    "created_at",
    "created_by",
    "audit_trail",
    "monitoring_integration",
    "performance_metrics",
    "version_history",
    "search_metadata",
    "collab_operation",
    "event_integration",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabSchema {
    pub collaboration_id: String,
    pub protocol_version: String,
    pub timestamp: DateTime<Utc>,
    pub context_id: String,
    pub plan_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mode: CollabMode,
    pub status: CollabStatus,

    pub participants: Vec<CollabParticipantSchema>,
    pub coordination_strategy: CoordinationStrategy,

    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub audit_trail: AuditTrailSchema,
    #[serde(default)]
    pub monitoring_integration: MonitoringIntegrationSchema,
    #[serde(default)]
    pub performance_metrics: PerformanceMetricsSchema,
    #[serde(default)]
    pub version_history: VersionHistorySchema,
    #[serde(default)]
    pub search_metadata: SearchMetadataSchema,
    #[serde(default)]
    pub collab_operation: CollabOperationSchema,
    #[serde(default)]
    pub event_integration: EventIntegrationSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabParticipantSchema {
    pub participant_id: String,
    pub agent_id: String,
    pub role_id: String,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub joined_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

// ==================== Cross-cutting blocks ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailSchema {
    pub enabled: bool,
    pub retention_days: u32,
    #[serde(default)]
    pub events: Vec<AuditEventSchema>,
}

impl Default for AuditTrailSchema {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: 365,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEventSchema {
    pub event_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub details: Value,
}

impl AuditEventSchema {
    pub fn new(event_type: &str, user_id: &str, details: Value) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringIntegrationSchema {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub metrics_collection: bool,
    pub alerting: AlertingSchema,
}

impl Default for MonitoringIntegrationSchema {
    fn default() -> Self {
        Self {
            enabled: true,
            trace_id: None,
            metrics_collection: true,
            alerting: AlertingSchema {
                enabled: true,
                thresholds: BTreeMap::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertingSchema {
    pub enabled: bool,
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetricsSchema {
    pub enabled: bool,
    pub collection_interval_seconds: u32,
    pub metrics: PerformanceFiguresSchema,
}

impl Default for PerformanceMetricsSchema {
    fn default() -> Self {
        Self {
            enabled: true,
            collection_interval_seconds: 60,
            metrics: PerformanceFiguresSchema::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceFiguresSchema {
    pub coordination_latency_ms: f64,
    pub participant_response_time_ms: f64,
    pub success_rate_percent: f64,
    pub throughput_operations_per_second: f64,
}

impl Default for PerformanceFiguresSchema {
    fn default() -> Self {
        Self {
            coordination_latency_ms: 0.0,
            participant_response_time_ms: 0.0,
            success_rate_percent: 100.0,
            throughput_operations_per_second: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistorySchema {
    pub enabled: bool,
    pub max_versions: usize,
    #[serde(default)]
    pub versions: Vec<VersionSchema>,
}

impl Default for VersionHistorySchema {
    fn default() -> Self {
        Self {
            enabled: true,
            max_versions: 10,
            versions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSchema {
    pub version_id: String,
    pub version_number: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadataSchema {
    pub enabled: bool,
    #[serde(default)]
    pub indexed_fields: Vec<String>,
    #[serde(default)]
    pub search_tags: Vec<String>,
    pub full_text_search: bool,
}

impl Default for SearchMetadataSchema {
    fn default() -> Self {
        Self {
            enabled: true,
            indexed_fields: Vec::new(),
            search_tags: Vec::new(),
            full_text_search: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabOperationSchema {
    pub operation_id: String,
    pub operation_type: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl CollabOperationSchema {
    /// A finished operation of `operation_type` on `collaboration_id`
    pub fn completed(operation_type: &str, collaboration_id: &str) -> Self {
        let now = Utc::now();
        Self {
            operation_id: uuid::Uuid::new_v4().to_string(),
            operation_type: operation_type.to_string(),
            status: "completed".to_string(),
            started_at: now,
            completed_at: Some(now),
            result: Some(serde_json::json!({
                "success": true,
                "collaboration_id": collaboration_id,
            })),
        }
    }
}

impl Default for CollabOperationSchema {
    fn default() -> Self {
        Self {
            operation_id: uuid::Uuid::new_v4().to_string(),
            operation_type: "create".to_string(),
            status: "completed".to_string(),
            started_at: Utc::now(),
            completed_at: None,
            result: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventIntegrationSchema {
    pub enabled: bool,
    #[serde(default)]
    pub subscribed_events: Vec<String>,
    #[serde(default)]
    pub published_events: Vec<String>,
    #[serde(default)]
    pub event_routing: EventRoutingSchema,
}

impl Default for EventIntegrationSchema {
    fn default() -> Self {
        Self {
            enabled: true,
            subscribed_events: Vec::new(),
            published_events: Vec::new(),
            event_routing: EventRoutingSchema::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRoutingSchema {
    #[serde(default)]
    pub routing_rules: Vec<RoutingRuleSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRuleSchema {
    pub rule_id: String,
    pub condition: String,
    pub target_topic: String,
    pub enabled: bool,
}
