//! Collaboration management use cases
//!
//! [`CollabManagementService`] is the entry point for creating, querying,
//! and driving collaborations through their lifecycle. It validates
//! requests, applies the deployment's [`CollabPolicy`], resolves the
//! coordinator when the strategy needs one, and persists through a
//! [`CollabRepository`].

use crate::config::CollabPolicy;
use chrono::Utc;
use mplp_domain::collab::{
    CollabCoordinationService, CollabEntity, CollabListQuery, CollabListResult, CollabMode,
    CollabParticipant, CollabRepository, CollabSearchQuery, CollabSearchResult, CollabSortField,
    CollabStatus, CoordinationStrategy, ParticipantStatus, SortOrder, MAX_PARTICIPANTS,
    MIN_PARTICIPANTS,
};
use mplp_domain::core::error::{DomainError, RepositoryError};
use mplp_domain::util::is_blank;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Capabilities every well-rounded team should cover
pub const ESSENTIAL_CAPABILITIES: [&str; 4] = ["leadership", "technical", "communication", "analysis"];

/// A role above this share of the team triggers a balance warning
const ROLE_CONCENTRATION_LIMIT: f64 = 0.6;

/// Resource estimate above which a collaboration is flagged
const HIGH_RESOURCE_ESTIMATE: f64 = 100.0;

/// Errors from collaboration management
#[derive(Error, Debug)]
pub enum CollabServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Collaboration not found")]
    NotFound,

    #[error("{0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CollabServiceError {
    pub fn is_not_found(&self) -> bool {
        match self {
            CollabServiceError::NotFound => true,
            CollabServiceError::Domain(e) => e.is_not_found(),
            CollabServiceError::Repository(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Caller-correctable errors (bad input or a refused state change)
    pub fn is_validation(&self) -> bool {
        match self {
            CollabServiceError::Validation(_) | CollabServiceError::InvalidOperation(_) => true,
            CollabServiceError::Domain(e) => !e.is_not_found(),
            _ => false,
        }
    }
}

/// A participant in a create or add request
#[derive(Debug, Clone, Default)]
pub struct ParticipantRequest {
    /// Generated when absent
    pub participant_id: Option<String>,
    pub agent_id: String,
    pub role_id: String,
    /// Defaults to `pending`
    pub status: Option<ParticipantStatus>,
    pub capabilities: Vec<String>,
    pub priority: Option<u32>,
    pub weight: Option<f64>,
}

impl ParticipantRequest {
    pub fn new(agent_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            role_id: role_id.into(),
            ..Default::default()
        }
    }

    pub fn with_participant_id(mut self, id: impl Into<String>) -> Self {
        self.participant_id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: ParticipantStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    fn into_participant(self) -> CollabParticipant {
        let id = self
            .participant_id
            .filter(|id| !is_blank(id))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut participant = CollabParticipant::new(
            id,
            self.agent_id,
            self.role_id,
            self.status.unwrap_or_default(),
        )
        .with_capabilities(self.capabilities);
        participant.priority = self.priority;
        participant.weight = self.weight;
        participant
    }
}

/// Input for [`CollabManagementService::create_collaboration`]
#[derive(Debug, Clone)]
pub struct CreateCollabRequest {
    /// Generated when absent
    pub collaboration_id: Option<String>,
    pub context_id: String,
    pub plan_id: String,
    pub name: String,
    pub description: Option<String>,
    pub mode: CollabMode,
    pub coordination_strategy: CoordinationStrategy,
    pub participants: Vec<ParticipantRequest>,
    pub created_by: String,
}

/// Input for [`CollabManagementService::update_collaboration`]. Absent
/// fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCollabRequest {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub mode: Option<CollabMode>,
    pub status: Option<CollabStatus>,
    pub coordination_strategy: Option<CoordinationStrategy>,
    pub participant_statuses: Vec<(String, ParticipantStatus)>,
    pub updated_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSizeAssessment {
    BelowOptimal,
    Optimal,
    AboveOptimal,
}

/// Composition analysis of a prospective or existing team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAnalysis {
    pub participant_count: usize,
    pub optimal_size: (usize, usize),
    pub size_assessment: TeamSizeAssessment,
    /// Essential capabilities nobody on the team has
    pub capability_gaps: Vec<String>,
    pub role_balance_warnings: Vec<String>,
    pub resource_estimate: f64,
    pub high_resource_usage: bool,
}

/// Summary returned by [`CollabManagementService::get_collaboration_status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollabStatusReport {
    pub collaboration_id: String,
    pub status: CollabStatus,
    pub participant_count: usize,
    pub active_participants: usize,
    pub last_activity: chrono::DateTime<Utc>,
    /// 0 (critical) to 10 (healthy)
    pub health_score: u8,
}

/// Offset-based query for [`CollabManagementService::query_collaborations`]
#[derive(Debug, Clone, Default)]
pub struct CollabQueryCriteria {
    pub status: Option<CollabStatus>,
    pub mode: Option<CollabMode>,
    pub participant_id: Option<String>,
    pub context_id: Option<String>,
    pub plan_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub sort_by: Option<CollabSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone)]
pub struct CollabQueryResult {
    pub collaborations: Vec<CollabEntity>,
    pub total: usize,
    pub has_more: bool,
}

/// Manages collaborations
pub struct CollabManagementService {
    repository: Arc<dyn CollabRepository>,
    policy: CollabPolicy,
}

impl CollabManagementService {
    pub fn new(repository: Arc<dyn CollabRepository>) -> Self {
        Self {
            repository,
            policy: CollabPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CollabPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &CollabPolicy {
        &self.policy
    }

    // ==================== Create ====================

    pub async fn create_collaboration(&self, request: CreateCollabRequest) -> Result<CollabEntity, CollabServiceError> {
        Self::validate_create(&request)?;
        if request.participants.len() > self.policy.max_participants {
            return Err(CollabServiceError::Validation(format!(
                "Enterprise policy violation: Maximum {} participants allowed",
                self.policy.max_participants
            )));
        }

        let participants: Vec<CollabParticipant> = request
            .participants
            .into_iter()
            .map(ParticipantRequest::into_participant)
            .collect();

        let analysis = Self::analyze_participants(&participants, request.mode);
        if analysis.size_assessment != TeamSizeAssessment::Optimal {
            info!(
                "Team size {} outside optimal range {}-{} for {} mode",
                analysis.participant_count, analysis.optimal_size.0, analysis.optimal_size.1, request.mode
            );
        }
        if !analysis.capability_gaps.is_empty() {
            info!("Capability gaps identified: {}", analysis.capability_gaps.join(", "));
        }
        for warning in &analysis.role_balance_warnings {
            info!("{}", warning);
        }
        if analysis.high_resource_usage {
            info!("High resource usage collaboration - monitoring recommended");
        }

        let strategy = self.resolve_strategy(request.coordination_strategy, request.mode, &participants);

        let id = request
            .collaboration_id
            .filter(|id| !is_blank(id))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut collab = CollabEntity::new(
            id,
            request.context_id,
            request.plan_id,
            request.name,
            request.mode,
            strategy,
            request.created_by.clone(),
        )?;
        if let Some(description) = request.description {
            collab = collab.with_description(description);
        }
        for participant in participants {
            collab.add_participant(participant, &request.created_by)?;
        }

        self.repository.save(&collab).await?;
        Self::publish_events(&mut collab);
        info!(
            "Collaboration {} created with {} participants",
            collab.id(),
            collab.participants().len()
        );
        Ok(collab)
    }

    fn validate_create(request: &CreateCollabRequest) -> Result<(), CollabServiceError> {
        let invalid = |msg: &str| Err(CollabServiceError::Validation(msg.to_string()));
        if is_blank(&request.context_id) {
            return invalid("Context ID is required for collaboration creation");
        }
        if is_blank(&request.plan_id) {
            return invalid("Plan ID is required for collaboration creation");
        }
        if is_blank(&request.name) {
            return invalid("Collaboration name is required");
        }
        if is_blank(&request.created_by) {
            return invalid("Creator is required");
        }
        if request.participants.len() < MIN_PARTICIPANTS {
            return invalid("At least 2 participants are required for collaboration");
        }
        if request.participants.len() > MAX_PARTICIPANTS {
            return invalid("Maximum 100 participants allowed per collaboration");
        }
        for p in &request.participants {
            if is_blank(&p.agent_id) || is_blank(&p.role_id) {
                return Err(CollabServiceError::Validation(format!(
                    "Invalid member: agentId={}, roleId={}",
                    p.agent_id, p.role_id
                )));
            }
        }
        Ok(())
    }

    /// Apply the optimisation policy and fill in a missing coordinator
    fn resolve_strategy(
        &self,
        requested: CoordinationStrategy,
        mode: CollabMode,
        participants: &[CollabParticipant],
    ) -> CoordinationStrategy {
        let mut strategy = requested;
        if self.policy.optimize_strategy {
            let recommended_type = CollabCoordinationService::recommend_coordination_type(mode, participants.len());
            let recommended_decision =
                CollabCoordinationService::recommend_decision_making(recommended_type, participants.len());
            if recommended_type != strategy.coordination_type || recommended_decision != strategy.decision_making {
                info!(
                    "Coordination strategy optimization: {}/{} -> {}/{}",
                    strategy.coordination_type, strategy.decision_making, recommended_type, recommended_decision
                );
            }
            strategy.coordination_type = recommended_type;
            strategy.decision_making = recommended_decision;
        }

        let coordinator_known = strategy
            .coordinator_id
            .as_deref()
            .is_some_and(|id| participants.iter().any(|p| p.participant_id == id));
        if strategy.requires_coordinator() && !coordinator_known {
            if let Some(coordinator) = CollabCoordinationService::select_coordinator(participants) {
                debug!("Coordinator selected: {}", coordinator.participant_id);
                strategy.coordinator_id = Some(coordinator.participant_id.clone());
            }
        } else if !strategy.requires_coordinator() && !coordinator_known {
            strategy.coordinator_id = None;
        }
        strategy
    }

    // ==================== Team analysis ====================

    /// Analyse a prospective team for `mode`
    pub fn analyze_team(participants: &[ParticipantRequest], mode: CollabMode) -> TeamAnalysis {
        let participants: Vec<CollabParticipant> = participants
            .iter()
            .cloned()
            .map(ParticipantRequest::into_participant)
            .collect();
        Self::analyze_participants(&participants, mode)
    }

    fn analyze_participants(participants: &[CollabParticipant], mode: CollabMode) -> TeamAnalysis {
        let count = participants.len();
        let optimal_size = mode.optimal_team_size();
        let size_assessment = if count < optimal_size.0 {
            TeamSizeAssessment::BelowOptimal
        } else if count > optimal_size.1 {
            TeamSizeAssessment::AboveOptimal
        } else {
            TeamSizeAssessment::Optimal
        };

        let present: BTreeSet<String> = participants
            .iter()
            .flat_map(|p| p.capabilities.iter().map(|c| c.to_lowercase()))
            .collect();
        let capability_gaps = ESSENTIAL_CAPABILITIES
            .iter()
            .filter(|c| !present.contains(**c))
            .map(|c| c.to_string())
            .collect();

        let mut role_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for p in participants {
            *role_counts.entry(p.role_id.as_str()).or_default() += 1;
        }
        let role_balance_warnings = role_counts
            .into_iter()
            .filter_map(|(role, n)| {
                let share = n as f64 / count as f64;
                (share > ROLE_CONCENTRATION_LIMIT).then(|| {
                    format!(
                        "Consider diversifying roles - {} represents {:.1}% of team",
                        role,
                        share * 100.0
                    )
                })
            })
            .collect();

        let resource_estimate = count as f64 * mode.resource_multiplier() * 10.0;
        TeamAnalysis {
            participant_count: count,
            optimal_size,
            size_assessment,
            capability_gaps,
            role_balance_warnings,
            resource_estimate,
            high_resource_usage: resource_estimate > HIGH_RESOURCE_ESTIMATE,
        }
    }

    // ==================== Read ====================

    async fn load(&self, id: &str) -> Result<CollabEntity, CollabServiceError> {
        if is_blank(id) {
            return Err(CollabServiceError::Validation("Collaboration ID is required".into()));
        }
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CollabServiceError::NotFound)
    }

    pub async fn get_collaboration(&self, id: &str) -> Result<Option<CollabEntity>, CollabServiceError> {
        if is_blank(id) {
            return Err(CollabServiceError::Validation("Collaboration ID is required".into()));
        }
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn list_collaborations(&self, query: CollabListQuery) -> Result<CollabListResult, CollabServiceError> {
        Ok(self.repository.list(&query.normalized()).await?)
    }

    pub async fn query_collaborations(&self, criteria: CollabQueryCriteria) -> Result<CollabQueryResult, CollabServiceError> {
        let limit = criteria
            .limit
            .unwrap_or(self.policy.default_page_size)
            .clamp(1, mplp_domain::collab::repository::MAX_PAGE_SIZE);
        let query = CollabListQuery {
            page: criteria.offset / limit + 1,
            limit,
            status: criteria.status,
            mode: criteria.mode,
            context_id: criteria.context_id,
            plan_id: criteria.plan_id,
            participant_id: criteria.participant_id,
            sort_by: criteria.sort_by.unwrap_or_default(),
            sort_order: criteria.sort_order.unwrap_or_default(),
        };
        let result = self.repository.list(&query).await?;
        Ok(CollabQueryResult {
            total: result.pagination.total,
            has_more: result.pagination.has_more(),
            collaborations: result.items,
        })
    }

    /// Free-text search over name, description, mode, status, and agent IDs
    pub async fn search_collaborations(&self, query: CollabSearchQuery) -> Result<CollabSearchResult, CollabServiceError> {
        if is_blank(&query.query) {
            return Err(CollabServiceError::Validation("Search query is required".into()));
        }
        Ok(self.repository.search(&query).await?)
    }

    pub async fn get_collaboration_status(&self, id: &str) -> Result<CollabStatusReport, CollabServiceError> {
        let collab = self.load(id).await?;
        Ok(CollabStatusReport {
            collaboration_id: collab.id().to_string(),
            status: collab.status(),
            participant_count: collab.participants().len(),
            active_participants: collab.active_participants().len(),
            last_activity: collab.updated_at().unwrap_or(collab.timestamp()),
            health_score: Self::health_score(&collab),
        })
    }

    /// Health on a 0..=10 scale from participation, status, and age
    pub fn health_score(collab: &CollabEntity) -> u8 {
        let mut score: i32 = 10;

        let total = collab.participants().len();
        if total > 0 {
            let ratio = collab.active_participants().len() as f64 / total as f64;
            if ratio < 0.5 {
                score -= 3;
            } else if ratio < 0.8 {
                score -= 1;
            }
        }

        match collab.status() {
            CollabStatus::Inactive => score -= 2,
            CollabStatus::Failed => score -= 5,
            _ => {}
        }

        let age_days = (Utc::now() - collab.created_at()).num_days();
        if age_days > 30 {
            score -= 1;
        }
        if age_days > 90 {
            score -= 2;
        }

        score.clamp(0, 10) as u8
    }

    // ==================== Mutate ====================

    pub async fn update_collaboration(
        &self,
        id: &str,
        request: UpdateCollabRequest,
    ) -> Result<CollabEntity, CollabServiceError> {
        let mut collab = self.load(id).await?;
        let by = request.updated_by.as_str();

        if let Some(name) = request.name {
            collab.update_name(name, by)?;
        }
        if let Some(description) = request.description {
            collab.update_description(description, by);
        }
        if let Some(mode) = request.mode {
            collab.change_mode(mode, by)?;
        }
        if let Some(strategy) = request.coordination_strategy {
            collab.update_coordination_strategy(strategy, by)?;
        }
        for (participant_id, status) in request.participant_statuses {
            collab.update_participant_status(&participant_id, status, by)?;
        }
        if let Some(status) = request.status
            && status != collab.status()
        {
            collab.change_status(status, by)?;
        }

        self.repository.update(&collab).await?;
        Self::publish_events(&mut collab);
        Ok(collab)
    }

    pub async fn delete_collaboration(&self, id: &str) -> Result<(), CollabServiceError> {
        let collab = self.load(id).await?;
        if collab.status() == CollabStatus::Active {
            return Err(CollabServiceError::InvalidOperation(
                "Cannot delete active collaboration. Please stop it first.".into(),
            ));
        }
        self.repository.delete(id).await?;
        info!("Collaboration {} deleted", id);
        Ok(())
    }

    pub async fn start_collaboration(&self, id: &str, started_by: &str) -> Result<CollabEntity, CollabServiceError> {
        let mut collab = self.load(id).await?;
        if !collab.can_start() {
            return Err(CollabServiceError::InvalidOperation(
                "Collaboration cannot be started. Check status and participants.".into(),
            ));
        }
        collab.change_status(CollabStatus::Active, started_by)?;
        self.repository.update(&collab).await?;
        Self::publish_events(&mut collab);
        info!("Collaboration {} started by {}", id, started_by);
        Ok(collab)
    }

    pub async fn stop_collaboration(&self, id: &str, stopped_by: &str) -> Result<CollabEntity, CollabServiceError> {
        let mut collab = self.load(id).await?;
        if !collab.can_stop() {
            return Err(CollabServiceError::InvalidOperation(
                "Collaboration cannot be stopped. Check current status.".into(),
            ));
        }
        collab.change_status(CollabStatus::Stopped, stopped_by)?;
        self.repository.update(&collab).await?;
        Self::publish_events(&mut collab);
        info!("Collaboration {} stopped by {}", id, stopped_by);
        Ok(collab)
    }

    /// Mark a collaboration completed
    pub async fn end_collaboration(&self, id: &str, ended_by: &str) -> Result<CollabEntity, CollabServiceError> {
        if is_blank(ended_by) {
            return Err(CollabServiceError::Validation(
                "User ID is required for ending collaboration".into(),
            ));
        }
        let mut collab = self.load(id).await?;
        if collab.status().is_terminal() {
            return Err(CollabServiceError::InvalidOperation("Collaboration is already ended".into()));
        }
        collab.change_status(CollabStatus::Completed, ended_by)?;
        self.repository.update(&collab).await?;
        Self::publish_events(&mut collab);
        Ok(collab)
    }

    /// Add a participant. New participants join as `pending` unless the
    /// request says otherwise.
    pub async fn add_participant(
        &self,
        id: &str,
        participant: ParticipantRequest,
        added_by: &str,
    ) -> Result<CollabEntity, CollabServiceError> {
        let mut collab = self.load(id).await?;
        collab.add_participant(participant.into_participant(), added_by)?;
        self.repository.update(&collab).await?;
        Self::publish_events(&mut collab);
        Ok(collab)
    }

    pub async fn remove_participant(
        &self,
        id: &str,
        participant_id: &str,
        removed_by: &str,
        reason: Option<String>,
    ) -> Result<CollabEntity, CollabServiceError> {
        let mut collab = self.load(id).await?;
        collab.remove_participant(participant_id, removed_by, reason)?;
        self.repository.update(&collab).await?;
        Self::publish_events(&mut collab);
        Ok(collab)
    }

    fn publish_events(collab: &mut CollabEntity) {
        for event in collab.clear_domain_events() {
            debug!(
                "Published {} for collaboration {} ({})",
                event.name(),
                event.collaboration_id,
                event.event_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{FakeCollabRepository, collab_with};
    use chrono::Duration;
    use mplp_domain::collab::{CollabSnapshot, CoordinationType, DecisionMaking};

    fn service() -> CollabManagementService {
        CollabManagementService::new(Arc::new(FakeCollabRepository::default()))
    }

    fn request(n: usize) -> CreateCollabRequest {
        CreateCollabRequest {
            collaboration_id: Some("c-1".into()),
            context_id: "ctx-1".into(),
            plan_id: "plan-1".into(),
            name: "Release planning".into(),
            description: None,
            mode: CollabMode::Parallel,
            coordination_strategy: CoordinationStrategy::default(),
            participants: (0..n)
                .map(|i| {
                    ParticipantRequest::new(format!("agent-{i}"), "engineer")
                        .with_participant_id(format!("p-{i}"))
                        .with_status(ParticipantStatus::Active)
                })
                .collect(),
            created_by: "alice".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let svc = service();
        let created = svc.create_collaboration(request(3)).await.unwrap();
        assert_eq!(created.status(), CollabStatus::Draft);
        assert!(created.domain_events().is_empty());

        let loaded = svc.get_collaboration("c-1").await.unwrap().unwrap();
        assert_eq!(loaded.participants().len(), 3);
    }

    #[tokio::test]
    async fn test_create_requires_two_participants() {
        let err = service().create_collaboration(request(1)).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "At least 2 participants are required for collaboration");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_context() {
        let mut req = request(2);
        req.context_id = " ".into();
        let err = service().create_collaboration(req).await.unwrap_err();
        assert_eq!(err.to_string(), "Context ID is required for collaboration creation");
    }

    #[tokio::test]
    async fn test_create_enforces_policy_limit() {
        let svc = service().with_policy(CollabPolicy::default().with_max_participants(3));
        let err = svc.create_collaboration(request(4)).await.unwrap_err();
        assert_eq!(err.to_string(), "Enterprise policy violation: Maximum 3 participants allowed");
    }

    #[tokio::test]
    async fn test_create_selects_coordinator_with_leadership() {
        let mut req = request(3);
        req.coordination_strategy = CoordinationStrategy::new(CoordinationType::Centralized, DecisionMaking::Coordinator);
        req.participants[2].capabilities = vec!["Leadership".into()];
        let created = service().create_collaboration(req).await.unwrap();
        assert_eq!(created.coordination_strategy().coordinator_id.as_deref(), Some("p-2"));
    }

    #[tokio::test]
    async fn test_create_with_optimization() {
        let svc = service().with_policy(CollabPolicy::default().with_optimize_strategy(true));
        let created = svc.create_collaboration(request(2)).await.unwrap();
        let strategy = created.coordination_strategy();
        assert_eq!(strategy.coordination_type, CoordinationType::Centralized);
        assert_eq!(strategy.decision_making, DecisionMaking::Coordinator);
        assert_eq!(strategy.coordinator_id.as_deref(), Some("p-0"));
    }

    #[tokio::test]
    async fn test_start_stop_end() {
        let svc = service();
        svc.create_collaboration(request(2)).await.unwrap();

        let started = svc.start_collaboration("c-1", "alice").await.unwrap();
        assert_eq!(started.status(), CollabStatus::Active);

        let err = svc.delete_collaboration("c-1").await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete active collaboration. Please stop it first.");

        let stopped = svc.stop_collaboration("c-1", "alice").await.unwrap();
        assert_eq!(stopped.status(), CollabStatus::Stopped);

        let ended = svc.end_collaboration("c-1", "alice").await.unwrap();
        assert_eq!(ended.status(), CollabStatus::Completed);
        assert!(svc.end_collaboration("c-1", "alice").await.is_err());
    }

    #[tokio::test]
    async fn test_start_requires_active_participants() {
        let svc = service();
        let mut req = request(2);
        for p in &mut req.participants {
            p.status = None;
        }
        svc.create_collaboration(req).await.unwrap();
        let err = svc.start_collaboration("c-1", "alice").await.unwrap_err();
        assert_eq!(err.to_string(), "Collaboration cannot be started. Check status and participants.");
    }

    #[tokio::test]
    async fn test_missing_collaboration() {
        let err = service().start_collaboration("nope", "a").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Collaboration not found");
    }

    #[tokio::test]
    async fn test_update_fields() {
        let svc = service();
        svc.create_collaboration(request(2)).await.unwrap();
        let updated = svc
            .update_collaboration(
                "c-1",
                UpdateCollabRequest {
                    name: Some("Renamed".into()),
                    description: Some(Some("notes".into())),
                    mode: Some(CollabMode::Mesh),
                    participant_statuses: vec![("p-1".into(), ParticipantStatus::Suspended)],
                    updated_by: "bob".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name(), "Renamed");
        assert_eq!(updated.description(), Some("notes"));
        assert_eq!(updated.mode(), CollabMode::Mesh);
        assert_eq!(updated.participant("p-1").unwrap().status, ParticipantStatus::Suspended);
        assert_eq!(updated.updated_by(), Some("bob"));
    }

    #[tokio::test]
    async fn test_participant_add_remove() {
        let svc = service();
        svc.create_collaboration(request(2)).await.unwrap();

        let collab = svc
            .add_participant("c-1", ParticipantRequest::new("agent-9", "reviewer"), "alice")
            .await
            .unwrap();
        assert_eq!(collab.participants().len(), 3);
        let added = collab.participants().iter().find(|p| p.agent_id == "agent-9").unwrap();
        assert_eq!(added.status, ParticipantStatus::Pending);

        svc.remove_participant("c-1", "p-0", "alice", None).await.unwrap();
        let err = svc.remove_participant("c-1", "p-1", "alice", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Collaboration must have at least 2 participants");
    }

    #[tokio::test]
    async fn test_query_collaborations_offset() {
        let svc = service();
        for i in 0..3 {
            let mut req = request(2);
            req.collaboration_id = Some(format!("c-{i}"));
            svc.create_collaboration(req).await.unwrap();
        }
        let result = svc
            .query_collaborations(CollabQueryCriteria {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.collaborations.len(), 2);
        assert!(result.has_more);

        let result = svc
            .query_collaborations(CollabQueryCriteria {
                limit: Some(2),
                offset: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!result.has_more);
    }

    #[test]
    fn test_analyze_team() {
        let team = vec![
            ParticipantRequest::new("a", "dev").with_capabilities(["technical", "leadership"]),
            ParticipantRequest::new("b", "dev").with_capabilities(["technical"]),
            ParticipantRequest::new("c", "qa"),
        ];
        let analysis = CollabManagementService::analyze_team(&team, CollabMode::Hybrid);
        assert_eq!(analysis.size_assessment, TeamSizeAssessment::BelowOptimal);
        assert_eq!(analysis.capability_gaps, vec!["communication", "analysis"]);
        assert_eq!(analysis.role_balance_warnings.len(), 1);
        assert!(analysis.role_balance_warnings[0].contains("dev represents 66.7%"));
        assert_eq!(analysis.resource_estimate, 45.0);
        assert!(!analysis.high_resource_usage);
    }

    #[test]
    fn test_health_score() {
        let collab = collab_with("h", CollabMode::Parallel, CoordinationStrategy::default(), 4, ParticipantStatus::Active);
        assert_eq!(CollabManagementService::health_score(&collab), 10);

        let collab = collab_with("h", CollabMode::Parallel, CoordinationStrategy::default(), 4, ParticipantStatus::Pending);
        assert_eq!(CollabManagementService::health_score(&collab), 7);

        let mut snapshot: CollabSnapshot = collab.snapshot();
        snapshot.created_at = Utc::now() - Duration::days(100);
        snapshot.status = CollabStatus::Failed;
        let old = CollabEntity::restore(snapshot).unwrap();
        assert_eq!(CollabManagementService::health_score(&old), 0);
    }
}
