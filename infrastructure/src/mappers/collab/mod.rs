//! Collaboration mapping across the dual naming convention
//!
//! - [`CollabSchema`]: snake_case storage and wire format
//! - [`CollabCreateDto`] / [`CollabUpdateDto`] / [`CollabResponseDto`]: camelCase API bodies
//! - [`CollabMapper`]: conversions between those and the domain aggregate

mod dto;
mod schema;

pub use dto::{
    CollabCreateDto, CollabResponseDto, CollabUpdateDto, CoordinationStrategyDto,
    ParticipantCreateDto, ParticipantResponseDto, ParticipantUpdateDto,
};
pub use schema::{
    AlertingSchema, AuditEventSchema, AuditTrailSchema, CollabOperationSchema,
    CollabParticipantSchema, CollabSchema, EventIntegrationSchema, EventRoutingSchema,
    MonitoringIntegrationSchema, PerformanceFiguresSchema, PerformanceMetricsSchema,
    REQUIRED_FIELDS, RoutingRuleSchema, SearchMetadataSchema, VersionHistorySchema, VersionSchema,
};

use mplp_application::services::collab_management::{
    CreateCollabRequest, ParticipantRequest, UpdateCollabRequest,
};
use mplp_domain::collab::{CollabEntity, CollabParticipant, CollabSnapshot, ParticipantStatus};
use mplp_domain::core::error::DomainError;
use mplp_domain::core::validation::ValidationIssue;
use serde_json::Value;

/// Stateless converter for collaborations
pub struct CollabMapper;

impl CollabMapper {
    /// Aggregate → Schema. Cross-cutting blocks get their defaults.
    pub fn to_schema(entity: &CollabEntity) -> CollabSchema {
        let s = entity.snapshot();
        CollabSchema {
            collaboration_id: s.collaboration_id,
            protocol_version: s.protocol_version,
            timestamp: s.timestamp,
            context_id: s.context_id,
            plan_id: s.plan_id,
            name: s.name,
            description: s.description,
            mode: s.mode,
            status: s.status,
            participants: s.participants.iter().map(participant_to_schema).collect(),
            coordination_strategy: s.coordination_strategy,
            created_at: s.created_at,
            created_by: s.created_by,
            updated_at: s.updated_at,
            updated_by: s.updated_by,
            audit_trail: AuditTrailSchema::default(),
            monitoring_integration: MonitoringIntegrationSchema::default(),
            performance_metrics: PerformanceMetricsSchema::default(),
            version_history: VersionHistorySchema::default(),
            search_metadata: SearchMetadataSchema::default(),
            collab_operation: CollabOperationSchema::default(),
            event_integration: EventIntegrationSchema::default(),
        }
    }

    /// Schema → aggregate, without emitting domain events
    pub fn from_schema(schema: &CollabSchema) -> Result<CollabEntity, DomainError> {
        CollabEntity::restore(CollabSnapshot {
            collaboration_id: schema.collaboration_id.clone(),
            protocol_version: schema.protocol_version.clone(),
            timestamp: schema.timestamp,
            context_id: schema.context_id.clone(),
            plan_id: schema.plan_id.clone(),
            name: schema.name.clone(),
            description: schema.description.clone(),
            mode: schema.mode,
            status: schema.status,
            participants: schema.participants.iter().map(participant_from_schema).collect(),
            coordination_strategy: schema.coordination_strategy.clone(),
            created_at: schema.created_at,
            created_by: schema.created_by.clone(),
            updated_at: schema.updated_at,
            updated_by: schema.updated_by.clone(),
        })
    }

    /// Check an untyped document against the Schema shape.
    ///
    /// Reports every missing top-level field, then (if the shape is
    /// complete) type errors and aggregate invariant violations.
    pub fn validate_schema(data: &Value) -> Vec<ValidationIssue> {
        let Some(object) = data.as_object() else {
            return vec![ValidationIssue::error(
                "NOT_AN_OBJECT",
                "Collaboration schema must be a JSON object",
            )];
        };

        let missing: Vec<ValidationIssue> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
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

        let schema: CollabSchema = match serde_json::from_value(data.clone()) {
            Ok(schema) => schema,
            Err(e) => return vec![ValidationIssue::error("TYPE_MISMATCH", e.to_string())],
        };

        let mut issues = schema.coordination_strategy.validate();
        if let Err(e) = Self::from_schema(&schema) {
            issues.push(ValidationIssue::error("INVARIANT_VIOLATION", e.to_string()));
        }
        issues
    }

    pub fn is_valid_schema(data: &Value) -> bool {
        Self::validate_schema(data).is_empty()
    }

    /// Create DTO → service request. Participants join as `pending` with
    /// generated IDs.
    pub fn from_create_dto(dto: CollabCreateDto, default_user: &str) -> CreateCollabRequest {
        CreateCollabRequest {
            collaboration_id: None,
            context_id: dto.context_id,
            plan_id: dto.plan_id,
            name: dto.name,
            description: dto.description,
            mode: dto.mode,
            coordination_strategy: dto.coordination_strategy.into(),
            participants: dto
                .participants
                .into_iter()
                .map(|p| {
                    let mut request = ParticipantRequest::new(p.agent_id, p.role_id)
                        .with_status(ParticipantStatus::Pending)
                        .with_capabilities(p.capabilities);
                    request.priority = p.priority;
                    request.weight = p.weight;
                    request
                })
                .collect(),
            created_by: dto.created_by.unwrap_or_else(|| default_user.to_string()),
        }
    }

    /// Update DTO → service request. Participant entries without a status
    /// become `active`.
    pub fn from_update_dto(dto: CollabUpdateDto, default_user: &str) -> UpdateCollabRequest {
        UpdateCollabRequest {
            name: dto.name,
            description: dto.description.map(|d| Some(d).filter(|d| !d.trim().is_empty())),
            mode: dto.mode,
            status: dto.status,
            coordination_strategy: dto.coordination_strategy.map(Into::into),
            participant_statuses: dto
                .participants
                .unwrap_or_default()
                .into_iter()
                .map(|p| (p.participant_id, p.status.unwrap_or(ParticipantStatus::Active)))
                .collect(),
            updated_by: dto.updated_by.unwrap_or_else(|| default_user.to_string()),
        }
    }

    pub fn to_response_dto(entity: &CollabEntity) -> CollabResponseDto {
        CollabResponseDto {
            collaboration_id: entity.id().to_string(),
            protocol_version: entity.protocol_version().to_string(),
            timestamp: entity.timestamp(),
            context_id: entity.context_id().to_string(),
            plan_id: entity.plan_id().to_string(),
            name: entity.name().to_string(),
            description: entity.description().map(str::to_string),
            mode: entity.mode(),
            status: entity.status(),
            participants: entity
                .participants()
                .iter()
                .map(|p| ParticipantResponseDto {
                    participant_id: p.participant_id.clone(),
                    agent_id: p.agent_id.clone(),
                    role_id: p.role_id.clone(),
                    status: p.status,
                    capabilities: p.capabilities.clone(),
                    priority: p.priority,
                    weight: p.weight,
                    joined_at: p.joined_at,
                    last_activity: p.last_activity,
                })
                .collect(),
            coordination_strategy: entity.coordination_strategy().into(),
            created_at: entity.created_at(),
            created_by: entity.created_by().to_string(),
            updated_at: entity.updated_at(),
            updated_by: entity.updated_by().map(str::to_string),
        }
    }

    pub fn to_response_dto_array(entities: &[CollabEntity]) -> Vec<CollabResponseDto> {
        entities.iter().map(Self::to_response_dto).collect()
    }

    pub fn to_schema_array(entities: &[CollabEntity]) -> Vec<CollabSchema> {
        entities.iter().map(Self::to_schema).collect()
    }

    pub fn from_schema_array(schemas: &[CollabSchema]) -> Result<Vec<CollabEntity>, DomainError> {
        schemas.iter().map(Self::from_schema).collect()
    }
}

fn participant_to_schema(p: &CollabParticipant) -> CollabParticipantSchema {
    CollabParticipantSchema {
        participant_id: p.participant_id.clone(),
        agent_id: p.agent_id.clone(),
        role_id: p.role_id.clone(),
        status: p.status,
        capabilities: p.capabilities.clone(),
        priority: p.priority,
        weight: p.weight,
        joined_at: p.joined_at,
        last_activity: p.last_activity,
    }
}

fn participant_from_schema(p: &CollabParticipantSchema) -> CollabParticipant {
    let mut participant = CollabParticipant::new(
        p.participant_id.clone(),
        p.agent_id.clone(),
        p.role_id.clone(),
        p.status,
    )
    .with_capabilities(p.capabilities.iter().cloned());
    participant.priority = p.priority;
    participant.weight = p.weight;
    participant.joined_at = p.joined_at;
    participant.last_activity = p.last_activity;
    participant
}
