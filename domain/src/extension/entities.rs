//! Extension aggregate

use super::value_objects::{
    ApiExtension, AuditEvent, AuditEventType, EventSubscription, ExtensionCompatibility,
    ExtensionConfiguration, ExtensionLifecycle, ExtensionMetadata, ExtensionPoint,
    ExtensionPointType, ExtensionSecurity, ExtensionStatus, ExtensionType, HealthStatus,
    PerformanceMetrics, VersionRecord,
};
use crate::core::error::DomainError;
use crate::util::is_blank;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

/// Platform protocol major version extensions must target
pub const SUPPORTED_MPLP_MAJOR: u64 = 1;

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[a-zA-Z0-9-]+)?(\+[a-zA-Z0-9-]+)?$").expect("valid semver regex")
});

/// Check a version string against the accepted semver shape
pub fn is_valid_version(version: &str) -> bool {
    SEMVER.is_match(version)
}

/// Major component of a semver string
pub fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}

/// A version change is breaking when the major number increases
pub fn is_breaking_change(from: &str, to: &str) -> bool {
    match (major_version(from), major_version(to)) {
        (Some(a), Some(b)) => b > a,
        _ => false,
    }
}

/// Fields required to create an extension
#[derive(Debug, Clone)]
pub struct NewExtension {
    pub extension_id: String,
    pub context_id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub extension_type: ExtensionType,
    pub compatibility: ExtensionCompatibility,
    pub configuration: ExtensionConfiguration,
    pub security: ExtensionSecurity,
    pub metadata: ExtensionMetadata,
}

/// Every field of a stored extension
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionData {
    pub extension_id: String,
    pub context_id: String,
    pub protocol_version: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub extension_type: ExtensionType,
    pub status: ExtensionStatus,
    pub timestamp: DateTime<Utc>,
    pub compatibility: ExtensionCompatibility,
    pub configuration: ExtensionConfiguration,
    pub extension_points: Vec<ExtensionPoint>,
    pub api_extensions: Vec<ApiExtension>,
    pub event_subscriptions: Vec<EventSubscription>,
    pub lifecycle: ExtensionLifecycle,
    pub security: ExtensionSecurity,
    pub metadata: ExtensionMetadata,
    pub performance_metrics: PerformanceMetrics,
    pub audit_trail: Vec<AuditEvent>,
    pub version_history: Vec<VersionRecord>,
}

/// An installable plugin unit (Aggregate Root)
///
/// Status transitions are guarded: only `installed`/`inactive` may
/// activate, only `active` may deactivate, and an active extension cannot
/// be uninstalled. Every mutation records an [`AuditEvent`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionEntity {
    data: ExtensionData,
}

impl ExtensionEntity {
    /// Create a freshly installed extension
    pub fn new(new: NewExtension, installed_by: &str) -> Result<Self, DomainError> {
        let required = [
            ("extensionId", &new.extension_id),
            ("contextId", &new.context_id),
            ("name", &new.name),
            ("version", &new.version),
        ];
        for (field, value) in required {
            if is_blank(value) {
                return Err(DomainError::validation(format!(
                    "Missing required field: {}",
                    field
                )));
            }
        }
        if !is_valid_version(&new.version) {
            return Err(DomainError::validation(format!(
                "Invalid version format: {}",
                new.version
            )));
        }

        let now = Utc::now();
        let display_name = if is_blank(&new.display_name) {
            new.name.clone()
        } else {
            new.display_name
        };
        let mut entity = Self {
            data: ExtensionData {
                extension_id: new.extension_id,
                context_id: new.context_id,
                protocol_version: "1.0.0".to_string(),
                name: new.name,
                display_name,
                description: new.description,
                version: new.version,
                extension_type: new.extension_type,
                status: ExtensionStatus::Installed,
                timestamp: now,
                compatibility: new.compatibility,
                configuration: new.configuration,
                extension_points: Vec::new(),
                api_extensions: Vec::new(),
                event_subscriptions: Vec::new(),
                lifecycle: ExtensionLifecycle::started_at(now),
                security: new.security,
                metadata: new.metadata,
                performance_metrics: PerformanceMetrics::default(),
                audit_trail: Vec::new(),
                version_history: Vec::new(),
            },
        };
        let version = entity.data.version.clone();
        entity.audit(AuditEventType::Install, installed_by, json!({ "version": version }));
        Ok(entity)
    }

    /// Rebuild from stored data
    pub fn restore(data: ExtensionData) -> Result<Self, DomainError> {
        if is_blank(&data.extension_id) || is_blank(&data.name) {
            return Err(DomainError::validation(
                "Stored extension is missing its ID or name",
            ));
        }
        Ok(Self { data })
    }

    pub fn data(&self) -> &ExtensionData {
        &self.data
    }

    pub fn into_data(self) -> ExtensionData {
        self.data
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &str {
        &self.data.extension_id
    }

    pub fn context_id(&self) -> &str {
        &self.data.context_id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn version(&self) -> &str {
        &self.data.version
    }

    pub fn extension_type(&self) -> ExtensionType {
        self.data.extension_type
    }

    pub fn status(&self) -> ExtensionStatus {
        self.data.status
    }

    pub fn compatibility(&self) -> &ExtensionCompatibility {
        &self.data.compatibility
    }

    pub fn configuration(&self) -> &ExtensionConfiguration {
        &self.data.configuration
    }

    pub fn security(&self) -> &ExtensionSecurity {
        &self.data.security
    }

    pub fn extension_points(&self) -> &[ExtensionPoint] {
        &self.data.extension_points
    }

    pub fn api_extensions(&self) -> &[ApiExtension] {
        &self.data.api_extensions
    }

    pub fn event_subscriptions(&self) -> &[EventSubscription] {
        &self.data.event_subscriptions
    }

    pub fn lifecycle(&self) -> &ExtensionLifecycle {
        &self.data.lifecycle
    }

    pub fn performance_metrics(&self) -> &PerformanceMetrics {
        &self.data.performance_metrics
    }

    pub fn audit_trail(&self) -> &[AuditEvent] {
        &self.data.audit_trail
    }

    pub fn version_history(&self) -> &[VersionRecord] {
        &self.data.version_history
    }

    // ==================== Queries ====================

    pub fn is_active(&self) -> bool {
        self.data.status == ExtensionStatus::Active
    }

    pub fn has_error(&self) -> bool {
        self.data.status == ExtensionStatus::Error || self.data.lifecycle.error_count > 0
    }

    /// Targets the supported protocol major version and has a valid version
    pub fn is_compatible(&self) -> bool {
        major_version(&self.data.compatibility.mplp_version) == Some(SUPPORTED_MPLP_MAJOR)
    }

    pub fn can_uninstall(&self) -> bool {
        self.data.status != ExtensionStatus::Active
    }

    pub fn health_status(&self) -> HealthStatus {
        self.data.performance_metrics.health_status
    }

    pub fn extension_points_by_type(&self, point_type: ExtensionPointType) -> Vec<&ExtensionPoint> {
        self.data
            .extension_points
            .iter()
            .filter(|ep| ep.point_type == point_type)
            .collect()
    }

    // ==================== Lifecycle ====================

    /// Activate. Already active is a no-op.
    pub fn activate(&mut self, user_id: &str) -> Result<(), DomainError> {
        match self.data.status {
            ExtensionStatus::Active => return Ok(()),
            ExtensionStatus::Installed | ExtensionStatus::Inactive => {}
            other => {
                return Err(DomainError::invalid_state(format!(
                    "Cannot activate extension in status: {}",
                    other
                )));
            }
        }
        if !self.is_compatible() {
            return Err(DomainError::invalid_state(
                "Extension is not compatible with current MPLP version",
            ));
        }

        let previous = self.data.status;
        self.data.status = ExtensionStatus::Active;
        self.data.lifecycle.activation_count += 1;
        self.touch();
        self.audit(
            AuditEventType::Activate,
            user_id,
            json!({ "previousStatus": previous, "newStatus": ExtensionStatus::Active }),
        );
        Ok(())
    }

    /// Deactivate. Already inactive is a no-op.
    pub fn deactivate(&mut self, user_id: &str) -> Result<(), DomainError> {
        match self.data.status {
            ExtensionStatus::Inactive => return Ok(()),
            ExtensionStatus::Active => {}
            other => {
                return Err(DomainError::invalid_state(format!(
                    "Cannot deactivate extension in status: {}",
                    other
                )));
            }
        }
        self.data.status = ExtensionStatus::Inactive;
        self.touch();
        self.audit(
            AuditEventType::Deactivate,
            user_id,
            json!({ "previousStatus": ExtensionStatus::Active, "newStatus": ExtensionStatus::Inactive }),
        );
        Ok(())
    }

    /// Move into `uninstalling`; refused while active
    pub fn mark_for_uninstall(&mut self, user_id: &str) -> Result<(), DomainError> {
        if !self.can_uninstall() {
            return Err(DomainError::invalid_state(
                "Cannot uninstall an active extension. Deactivate it first.",
            ));
        }
        let previous = self.data.status;
        self.data.status = ExtensionStatus::Uninstalling;
        self.touch();
        self.audit(
            AuditEventType::Uninstall,
            user_id,
            json!({ "previousStatus": previous }),
        );
        Ok(())
    }

    /// Administrative status override, bypassing the activation guards
    pub fn set_status(&mut self, status: ExtensionStatus, user_id: &str) {
        let previous = self.data.status;
        self.data.status = status;
        self.touch();
        self.audit(
            AuditEventType::Update,
            user_id,
            json!({ "previousStatus": previous, "newStatus": status }),
        );
    }

    pub fn mark_as_error(&mut self, error: Option<&str>, user_id: &str) {
        let previous = self.data.status;
        self.data.status = ExtensionStatus::Error;
        self.data.lifecycle.error_count += 1;
        self.touch();
        self.audit(
            AuditEventType::Error,
            user_id,
            json!({
                "previousStatus": previous,
                "newStatus": ExtensionStatus::Error,
                "error": error.unwrap_or("Unknown error"),
            }),
        );
    }

    // ==================== Configuration / version ====================

    /// Replace the current configuration; must be a JSON object
    pub fn update_configuration(&mut self, new_config: Value, user_id: &str) -> Result<(), DomainError> {
        if !new_config.is_object() {
            return Err(DomainError::validation(
                "Invalid configuration: must be an object",
            ));
        }
        let previous = std::mem::replace(&mut self.data.configuration.current_config, new_config.clone());
        self.touch();
        self.audit(
            AuditEventType::Configure,
            user_id,
            json!({ "previousConfig": previous, "newConfig": new_config }),
        );
        Ok(())
    }

    /// Move to `new_version`, recording history. Returns whether the
    /// change is breaking.
    pub fn update_version(
        &mut self,
        new_version: &str,
        changelog: &str,
        user_id: &str,
    ) -> Result<bool, DomainError> {
        if !is_valid_version(new_version) {
            return Err(DomainError::validation(format!(
                "Invalid version format: {}",
                new_version
            )));
        }
        let previous = std::mem::replace(&mut self.data.version, new_version.to_string());
        let breaking = is_breaking_change(&previous, new_version);
        let now = Utc::now();
        self.data.version_history.push(VersionRecord {
            version: new_version.to_string(),
            previous_version: previous.clone(),
            released_at: now,
            breaking,
        });
        self.data.lifecycle.last_update = now;
        self.touch();
        self.audit(
            AuditEventType::Update,
            user_id,
            json!({
                "previousVersion": previous,
                "newVersion": new_version,
                "changelog": changelog,
            }),
        );
        Ok(breaking)
    }

    // ==================== Extension points / APIs / events ====================

    pub fn add_extension_point(&mut self, point: ExtensionPoint, user_id: &str) -> Result<(), DomainError> {
        if self.data.extension_points.iter().any(|ep| ep.id == point.id) {
            return Err(DomainError::Duplicate(format!(
                "Extension point with ID '{}' already exists",
                point.id
            )));
        }
        let details = json!({
            "action": "add_extension_point",
            "extensionPointId": point.id,
            "extensionPointType": point.point_type,
        });
        self.data.extension_points.push(point);
        self.touch();
        self.audit(AuditEventType::Configure, user_id, details);
        Ok(())
    }

    pub fn remove_extension_point(&mut self, point_id: &str, user_id: &str) -> Result<(), DomainError> {
        let before = self.data.extension_points.len();
        self.data.extension_points.retain(|ep| ep.id != point_id);
        if self.data.extension_points.len() == before {
            return Err(DomainError::not_found(format!(
                "Extension point with ID '{}' not found",
                point_id
            )));
        }
        self.touch();
        self.audit(
            AuditEventType::Configure,
            user_id,
            json!({ "action": "remove_extension_point", "extensionPointId": point_id }),
        );
        Ok(())
    }

    pub fn add_api_extension(&mut self, api: ApiExtension, user_id: &str) -> Result<(), DomainError> {
        if self
            .data
            .api_extensions
            .iter()
            .any(|a| a.endpoint == api.endpoint && a.method == api.method)
        {
            return Err(DomainError::Duplicate(format!(
                "API extension {} {} already exists",
                api.method, api.endpoint
            )));
        }
        let details = json!({
            "action": "add_api_extension",
            "endpoint": api.endpoint,
            "method": api.method,
        });
        self.data.api_extensions.push(api);
        self.touch();
        self.audit(AuditEventType::Configure, user_id, details);
        Ok(())
    }

    pub fn add_event_subscription(&mut self, subscription: EventSubscription, user_id: &str) {
        let details = json!({
            "action": "add_event_subscription",
            "eventPattern": subscription.event_pattern,
        });
        self.data.event_subscriptions.push(subscription);
        self.touch();
        self.audit(AuditEventType::Configure, user_id, details);
    }

    /// Merge observed metrics and recompute health
    pub fn update_performance_metrics(&mut self, metrics: PerformanceMetrics) {
        let health_status = PerformanceMetrics::derive_health(metrics.error_rate, metrics.availability);
        self.data.performance_metrics = PerformanceMetrics {
            health_status,
            ..metrics
        };
        self.touch();
    }

    fn touch(&mut self) {
        self.data.timestamp = Utc::now();
    }

    fn audit(&mut self, event_type: AuditEventType, user_id: &str, details: Value) {
        self.data
            .audit_trail
            .push(AuditEvent::new(event_type, user_id, details));
    }
}
