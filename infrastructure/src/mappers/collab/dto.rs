//! camelCase request and response bodies for the collaboration API

use chrono::{DateTime, Utc};
use mplp_domain::collab::{
    CollabMode, CollabStatus, CoordinationStrategy, CoordinationType, DecisionMaking,
    ParticipantStatus,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationStrategyDto {
    #[serde(rename = "type")]
    pub coordination_type: CoordinationType,
    pub decision_making: DecisionMaking,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator_id: Option<String>,
}

impl From<&CoordinationStrategy> for CoordinationStrategyDto {
    fn from(strategy: &CoordinationStrategy) -> Self {
        Self {
            coordination_type: strategy.coordination_type,
            decision_making: strategy.decision_making,
            coordinator_id: strategy.coordinator_id.clone(),
        }
    }
}

impl From<CoordinationStrategyDto> for CoordinationStrategy {
    fn from(dto: CoordinationStrategyDto) -> Self {
        Self {
            coordination_type: dto.coordination_type,
            decision_making: dto.decision_making,
            coordinator_id: dto.coordinator_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCreateDto {
    pub agent_id: String,
    pub role_id: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Body of `POST /collaborations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabCreateDto {
    pub context_id: String,
    pub plan_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub mode: CollabMode,
    pub coordination_strategy: CoordinationStrategyDto,
    #[serde(default)]
    pub participants: Vec<ParticipantCreateDto>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantUpdateDto {
    pub participant_id: String,
    /// Defaults to `active`
    #[serde(default)]
    pub status: Option<ParticipantStatus>,
}

/// Body of `PUT /collaborations/{id}`. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabUpdateDto {
    #[serde(default)]
    pub name: Option<String>,
    /// An empty string clears the description
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: Option<CollabMode>,
    #[serde(default)]
    pub status: Option<CollabStatus>,
    #[serde(default)]
    pub participants: Option<Vec<ParticipantUpdateDto>>,
    #[serde(default)]
    pub coordination_strategy: Option<CoordinationStrategyDto>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponseDto {
    pub participant_id: String,
    pub agent_id: String,
    pub role_id: String,
    pub status: ParticipantStatus,
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabResponseDto {
    pub collaboration_id: String,
    pub protocol_version: String,
    pub timestamp: DateTime<Utc>,
    pub context_id: String,
    pub plan_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mode: CollabMode,
    pub status: CollabStatus,
    pub participants: Vec<ParticipantResponseDto>,
    pub coordination_strategy: CoordinationStrategyDto,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}
