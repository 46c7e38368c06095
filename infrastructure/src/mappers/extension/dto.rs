//! camelCase request and response bodies for the extension API

use chrono::{DateTime, Utc};
use mplp_domain::extension::value_objects::{
    CodeSigning, ExtensionConflict, ExtensionPermissions, ResourceLimits,
};
use mplp_domain::extension::{
    ExtensionConfiguration, ExtensionDependency, ExtensionMetadata, ExtensionSecurity,
    ExtensionStatus, ExtensionType, HealthStatus, PermissionLevel,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields `POST /extensions` rejects when absent
pub const CREATE_REQUIRED_FIELDS: [&str; 5] =
    ["contextId", "name", "displayName", "version", "extensionType"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDto {
    #[serde(default)]
    pub schema: Value,
    #[serde(default)]
    pub current_config: Value,
    #[serde(default)]
    pub default_config: Value,
    #[serde(default)]
    pub validation_rules: Vec<String>,
}

impl From<ConfigurationDto> for ExtensionConfiguration {
    fn from(dto: ConfigurationDto) -> Self {
        Self {
            schema: dto.schema,
            current_config: dto.current_config,
            default_config: dto.default_config,
            validation_rules: dto.validation_rules,
        }
    }
}

impl From<&ExtensionConfiguration> for ConfigurationDto {
    fn from(config: &ExtensionConfiguration) -> Self {
        Self {
            schema: config.schema.clone(),
            current_config: config.current_config.clone(),
            default_config: config.default_config.clone(),
            validation_rules: config.validation_rules.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsDto {
    #[serde(default)]
    pub file_system: PermissionLevel,
    #[serde(default)]
    pub network: PermissionLevel,
    #[serde(default)]
    pub database: PermissionLevel,
    #[serde(default)]
    pub api: PermissionLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityDto {
    #[serde(default = "sandbox_default")]
    pub sandbox_enabled: bool,
    #[serde(default)]
    pub max_memory_mb: Option<u32>,
    #[serde(default)]
    pub max_cpu_percent: Option<u8>,
    #[serde(default)]
    pub code_signing_required: bool,
    #[serde(default)]
    pub permissions: PermissionsDto,
}

fn sandbox_default() -> bool {
    true
}

impl From<SecurityDto> for ExtensionSecurity {
    fn from(dto: SecurityDto) -> Self {
        let defaults = ResourceLimits::default();
        Self {
            sandbox_enabled: dto.sandbox_enabled,
            resource_limits: ResourceLimits {
                max_memory_mb: dto.max_memory_mb.unwrap_or(defaults.max_memory_mb),
                max_cpu_percent: dto.max_cpu_percent.unwrap_or(defaults.max_cpu_percent),
                ..defaults
            },
            code_signing: CodeSigning {
                required: dto.code_signing_required,
                verified: false,
            },
            permissions: ExtensionPermissions {
                file_system: dto.permissions.file_system,
                network: dto.permissions.network,
                database: dto.permissions.database,
                api: dto.permissions.api,
            },
        }
    }
}

/// Body of `POST /extensions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionCreateDto {
    pub context_id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub extension_type: ExtensionType,
    #[serde(default)]
    pub configuration: Option<ConfigurationDto>,
    #[serde(default)]
    pub dependencies: Vec<ExtensionDependency>,
    #[serde(default)]
    pub conflicts: Vec<ExtensionConflict>,
    #[serde(default)]
    pub security: Option<SecurityDto>,
    #[serde(default)]
    pub metadata: Option<ExtensionMetadata>,
    #[serde(default)]
    pub installed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleDto {
    pub install_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub activation_count: u32,
    pub error_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionResponseDto {
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
    pub mplp_version: String,
    pub dependencies: Vec<ExtensionDependency>,
    pub configuration: ConfigurationDto,
    pub lifecycle: LifecycleDto,
    pub health_status: HealthStatus,
    pub extension_point_count: usize,
    pub api_extension_count: usize,
    pub event_subscription_count: usize,
    pub metadata: ExtensionMetadata,
}
