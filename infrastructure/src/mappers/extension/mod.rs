//! Extension mapping across the dual naming convention

mod dto;
mod schema;

pub use dto::{
    CREATE_REQUIRED_FIELDS, ConfigurationDto, ExtensionCreateDto, ExtensionResponseDto,
    LifecycleDto, PermissionsDto, SecurityDto,
};
pub use schema::{ExtensionSchema, REQUIRED_FIELDS};

use mplp_application::services::extension_management::CreateExtensionRequest;
use mplp_domain::core::error::DomainError;
use mplp_domain::core::validation::ValidationIssue;
use mplp_domain::extension::{ExtensionData, ExtensionEntity};
use serde_json::Value;

pub struct ExtensionMapper;

impl ExtensionMapper {
    pub fn to_schema(entity: &ExtensionEntity) -> ExtensionSchema {
        let d = entity.data().clone();
        ExtensionSchema {
            protocol_version: d.protocol_version,
            timestamp: d.timestamp,
            extension_id: d.extension_id,
            context_id: d.context_id,
            name: d.name,
            display_name: d.display_name,
            description: d.description,
            version: d.version,
            extension_type: d.extension_type,
            status: d.status,
            compatibility: d.compatibility,
            configuration: d.configuration,
            extension_points: d.extension_points,
            api_extensions: d.api_extensions,
            event_subscriptions: d.event_subscriptions,
            lifecycle: d.lifecycle,
            security: d.security,
            metadata: d.metadata,
            performance_metrics: d.performance_metrics,
            audit_trail: d.audit_trail,
            version_history: d.version_history,
        }
    }

    pub fn from_schema(schema: ExtensionSchema) -> Result<ExtensionEntity, DomainError> {
        ExtensionEntity::restore(ExtensionData {
            extension_id: schema.extension_id,
            context_id: schema.context_id,
            protocol_version: schema.protocol_version,
            name: schema.name,
            display_name: schema.display_name,
            description: schema.description,
            version: schema.version,
            extension_type: schema.extension_type,
            status: schema.status,
            timestamp: schema.timestamp,
            compatibility: schema.compatibility,
            configuration: schema.configuration,
            extension_points: schema.extension_points,
            api_extensions: schema.api_extensions,
            event_subscriptions: schema.event_subscriptions,
            lifecycle: schema.lifecycle,
            security: schema.security,
            metadata: schema.metadata,
            performance_metrics: schema.performance_metrics,
            audit_trail: schema.audit_trail,
            version_history: schema.version_history,
        })
    }

    /// Required fields must be present and non-null; then the document
    /// must deserialize.
    pub fn validate_schema(data: &Value) -> Vec<ValidationIssue> {
        let Some(object) = data.as_object() else {
            return vec![ValidationIssue::error(
                "NOT_AN_OBJECT",
                "Extension schema must be a JSON object",
            )];
        };

        let missing: Vec<ValidationIssue> = REQUIRED_FIELDS
            .iter()
            .filter(|field| object.get(**field).is_none_or(Value::is_null))
            .map(|field| {
                ValidationIssue::error(
                    "REQUIRED_FIELD_MISSING",
                    format!("Missing required field: {}", field),
                )
            })
            .collect();
        if !missing.is_empty() {
            return missing;
        }

        match serde_json::from_value::<ExtensionSchema>(data.clone()) {
            Ok(_) => Vec::new(),
            Err(e) => vec![ValidationIssue::error("TYPE_MISMATCH", e.to_string())],
        }
    }

    /// First create-body field that is absent or null
    pub fn missing_create_field(body: &Value) -> Option<&'static str> {
        CREATE_REQUIRED_FIELDS
            .iter()
            .copied()
            .find(|field| body.get(field).is_none_or(Value::is_null))
    }

    /// Create DTO → service request. Returns the request and the acting user.
    pub fn from_create_dto(dto: ExtensionCreateDto, default_user: &str) -> (CreateExtensionRequest, String) {
        let mut request =
            CreateExtensionRequest::new(dto.context_id, dto.name, dto.version, dto.extension_type);
        request.display_name = Some(dto.display_name).filter(|n| !n.trim().is_empty());
        request.description = dto.description;
        request.configuration = dto.configuration.map(Into::into);
        request.dependencies = dto.dependencies;
        request.conflicts = dto.conflicts;
        request.security = dto.security.map(Into::into);
        request.metadata = dto.metadata;
        let user = dto.installed_by.unwrap_or_else(|| default_user.to_string());
        (request, user)
    }

    pub fn to_response_dto(entity: &ExtensionEntity) -> ExtensionResponseDto {
        let d = entity.data();
        ExtensionResponseDto {
            extension_id: d.extension_id.clone(),
            context_id: d.context_id.clone(),
            protocol_version: d.protocol_version.clone(),
            name: d.name.clone(),
            display_name: d.display_name.clone(),
            description: d.description.clone(),
            version: d.version.clone(),
            extension_type: d.extension_type,
            status: d.status,
            timestamp: d.timestamp,
            mplp_version: d.compatibility.mplp_version.clone(),
            dependencies: d.compatibility.dependencies.clone(),
            configuration: (&d.configuration).into(),
            lifecycle: LifecycleDto {
                install_date: d.lifecycle.install_date,
                last_update: d.lifecycle.last_update,
                activation_count: d.lifecycle.activation_count,
                error_count: d.lifecycle.error_count,
            },
            health_status: d.performance_metrics.health_status,
            extension_point_count: d.extension_points.len(),
            api_extension_count: d.api_extensions.len(),
            event_subscription_count: d.event_subscriptions.len(),
            metadata: d.metadata.clone(),
        }
    }

    pub fn to_response_dto_array(entities: &[ExtensionEntity]) -> Vec<ExtensionResponseDto> {
        entities.iter().map(Self::to_response_dto).collect()
    }

    pub fn to_schema_array(entities: &[ExtensionEntity]) -> Vec<ExtensionSchema> {
        entities.iter().map(Self::to_schema).collect()
    }

    pub fn from_schema_array(schemas: Vec<ExtensionSchema>) -> Result<Vec<ExtensionEntity>, DomainError> {
        schemas.into_iter().map(Self::from_schema).collect()
    }
}
