//! Collab aggregate
//!
//! [`CollabEntity`] is the aggregate root of a collaboration session. All
//! participant and status mutations go through it so the cardinality rules
//! and the `draft → active → stopped` state machine hold at all times.

use super::events::{CollabDomainEvent, CollabEventKind};
use super::value_objects::{CollabMode, CollabStatus, CoordinationStrategy, ParticipantStatus};
use crate::core::error::DomainError;
use crate::util::is_blank;
use chrono::{DateTime, Utc};

/// Hard upper bound on participants per collaboration
pub const MAX_PARTICIPANTS: usize = 100;

/// Minimum participants a running collaboration must keep
pub const MIN_PARTICIPANTS: usize = 2;

pub const DEFAULT_PROTOCOL_VERSION: &str = "1.0.0";

/// A participant in a collaboration (Entity)
#[derive(Debug, Clone, PartialEq)]
pub struct CollabParticipant {
    pub participant_id: String,
    pub agent_id: String,
    pub role_id: String,
    pub status: ParticipantStatus,
    pub capabilities: Vec<String>,
    pub priority: Option<u32>,
    pub weight: Option<f64>,
    pub joined_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl CollabParticipant {
    pub fn new(
        participant_id: impl Into<String>,
        agent_id: impl Into<String>,
        role_id: impl Into<String>,
        status: ParticipantStatus,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            agent_id: agent_id.into(),
            role_id: role_id.into(),
            status,
            capabilities: Vec::new(),
            priority: None,
            weight: None,
            joined_at: Utc::now(),
            last_activity: None,
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }

    pub fn activate(&mut self) {
        self.set_status(ParticipantStatus::Active);
    }

    pub fn deactivate(&mut self) {
        self.set_status(ParticipantStatus::Inactive);
    }

    pub fn suspend(&mut self) {
        self.set_status(ParticipantStatus::Suspended);
    }

    fn set_status(&mut self, status: ParticipantStatus) {
        self.status = status;
        self.last_activity = Some(Utc::now());
    }
}

/// Every field of a stored collaboration, used to rebuild the aggregate
/// without replaying its history
#[derive(Debug, Clone)]
pub struct CollabSnapshot {
    pub collaboration_id: String,
    pub protocol_version: String,
    pub timestamp: DateTime<Utc>,
    pub context_id: String,
    pub plan_id: String,
    pub name: String,
    pub description: Option<String>,
    pub mode: CollabMode,
    pub status: CollabStatus,
    pub participants: Vec<CollabParticipant>,
    pub coordination_strategy: CoordinationStrategy,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// A collaboration session (Aggregate Root)
#[derive(Debug, Clone)]
pub struct CollabEntity {
    id: String,
    protocol_version: String,
    timestamp: DateTime<Utc>,
    context_id: String,
    plan_id: String,
    name: String,
    description: Option<String>,
    mode: CollabMode,
    status: CollabStatus,
    participants: Vec<CollabParticipant>,
    coordination_strategy: CoordinationStrategy,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<String>,
    domain_events: Vec<CollabDomainEvent>,
}

impl CollabEntity {
    /// Create a new collaboration in `draft` status.
    ///
    /// Emits `CollabCreated`.
    pub fn new(
        id: impl Into<String>,
        context_id: impl Into<String>,
        plan_id: impl Into<String>,
        name: impl Into<String>,
        mode: CollabMode,
        coordination_strategy: CoordinationStrategy,
        created_by: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let context_id = context_id.into();
        let plan_id = plan_id.into();
        let name = name.into();
        let created_by = created_by.into();

        if is_blank(&id) {
            return Err(DomainError::validation("Collaboration ID is required"));
        }
        if is_blank(&context_id) {
            return Err(DomainError::validation("Context ID is required"));
        }
        if is_blank(&plan_id) {
            return Err(DomainError::validation("Plan ID is required"));
        }
        if is_blank(&name) {
            return Err(DomainError::validation("Collaboration name is required"));
        }
        if is_blank(&created_by) {
            return Err(DomainError::validation("Creator is required"));
        }
        ensure_strategy_valid(&coordination_strategy)?;

        let now = Utc::now();
        let mut entity = Self {
            id,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            timestamp: now,
            context_id,
            plan_id,
            name: name.clone(),
            description: None,
            mode,
            status: CollabStatus::Draft,
            participants: Vec::new(),
            coordination_strategy,
            created_at: now,
            created_by: created_by.clone(),
            updated_at: None,
            updated_by: None,
            domain_events: Vec::new(),
        };
        entity.record(&created_by, CollabEventKind::CollabCreated { name });
        Ok(entity)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!is_blank(&description)).then_some(description);
        self
    }

    /// Rebuild an aggregate from stored state. No events are emitted.
    pub fn restore(snapshot: CollabSnapshot) -> Result<Self, DomainError> {
        if is_blank(&snapshot.collaboration_id) {
            return Err(DomainError::validation("Collaboration ID is required"));
        }
        if snapshot.participants.len() > MAX_PARTICIPANTS {
            return Err(DomainError::LimitExceeded(format!(
                "Maximum {} participants allowed per collaboration",
                MAX_PARTICIPANTS
            )));
        }
        for (index, participant) in snapshot.participants.iter().enumerate() {
            if Self::clashes(&snapshot.participants[..index], participant) {
                return Err(DomainError::Duplicate(format!(
                    "Duplicate participant in collaboration: {}",
                    participant.participant_id
                )));
            }
        }
        Ok(Self {
            id: snapshot.collaboration_id,
            protocol_version: snapshot.protocol_version,
            timestamp: snapshot.timestamp,
            context_id: snapshot.context_id,
            plan_id: snapshot.plan_id,
            name: snapshot.name,
            description: snapshot.description,
            mode: snapshot.mode,
            status: snapshot.status,
            participants: snapshot.participants,
            coordination_strategy: snapshot.coordination_strategy,
            created_at: snapshot.created_at,
            created_by: snapshot.created_by,
            updated_at: snapshot.updated_at,
            updated_by: snapshot.updated_by,
            domain_events: Vec::new(),
        })
    }

    pub fn snapshot(&self) -> CollabSnapshot {
        CollabSnapshot {
            collaboration_id: self.id.clone(),
            protocol_version: self.protocol_version.clone(),
            timestamp: self.timestamp,
            context_id: self.context_id.clone(),
            plan_id: self.plan_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mode: self.mode,
            status: self.status,
            participants: self.participants.clone(),
            coordination_strategy: self.coordination_strategy.clone(),
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            updated_at: self.updated_at,
            updated_by: self.updated_by.clone(),
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn mode(&self) -> CollabMode {
        self.mode
    }

    pub fn status(&self) -> CollabStatus {
        self.status
    }

    pub fn participants(&self) -> &[CollabParticipant] {
        &self.participants
    }

    pub fn coordination_strategy(&self) -> &CoordinationStrategy {
        &self.coordination_strategy
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn updated_by(&self) -> Option<&str> {
        self.updated_by.as_deref()
    }

    pub fn participant(&self, participant_id: &str) -> Option<&CollabParticipant> {
        self.participants
            .iter()
            .find(|p| p.participant_id == participant_id)
    }

    pub fn active_participants(&self) -> Vec<&CollabParticipant> {
        self.participants.iter().filter(|p| p.is_active()).collect()
    }

    // ==================== Participants ====================

    /// Add a participant.
    ///
    /// Rejects duplicates by participant ID or agent ID and enforces
    /// [`MAX_PARTICIPANTS`]. Emits `ParticipantAdded`.
    pub fn add_participant(
        &mut self,
        participant: CollabParticipant,
        added_by: &str,
    ) -> Result<(), DomainError> {
        if is_blank(&participant.agent_id) {
            return Err(DomainError::validation("Agent ID is required for all participants"));
        }
        if is_blank(&participant.role_id) {
            return Err(DomainError::validation("Role ID is required for all participants"));
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(DomainError::LimitExceeded(format!(
                "Maximum {} participants allowed per collaboration",
                MAX_PARTICIPANTS
            )));
        }
        if Self::clashes(&self.participants, &participant) {
            return Err(DomainError::Duplicate(
                "Participant already exists in collaboration".to_string(),
            ));
        }

        let kind = CollabEventKind::ParticipantAdded {
            participant_id: participant.participant_id.clone(),
            agent_id: participant.agent_id.clone(),
        };
        self.participants.push(participant);
        self.touch(added_by);
        self.record(added_by, kind);
        Ok(())
    }

    /// Same participant ID or agent ID as an existing participant
    fn clashes(existing: &[CollabParticipant], candidate: &CollabParticipant) -> bool {
        existing.iter().any(|p| {
            p.participant_id == candidate.participant_id || p.agent_id == candidate.agent_id
        })
    }

    /// Remove a participant. Emits `ParticipantRemoved`.
    pub fn remove_participant(
        &mut self,
        participant_id: &str,
        removed_by: &str,
        reason: Option<String>,
    ) -> Result<CollabParticipant, DomainError> {
        let index = self
            .participants
            .iter()
            .position(|p| p.participant_id == participant_id)
            .ok_or_else(|| DomainError::not_found("Participant not found"))?;

        if self.participants.len() <= MIN_PARTICIPANTS {
            return Err(DomainError::invalid_state(format!(
                "Collaboration must have at least {} participants",
                MIN_PARTICIPANTS
            )));
        }
        if self.coordination_strategy.requires_coordinator()
            && self.coordination_strategy.coordinator_id.as_deref() == Some(participant_id)
        {
            return Err(DomainError::invalid_state(
                "Cannot remove the coordinator. Update the coordination strategy first.",
            ));
        }

        let removed = self.participants.remove(index);
        self.touch(removed_by);
        self.record(
            removed_by,
            CollabEventKind::ParticipantRemoved {
                participant_id: participant_id.to_string(),
                reason,
            },
        );
        Ok(removed)
    }

    /// Change one participant's status. Emits `ParticipantStatusChanged`.
    pub fn update_participant_status(
        &mut self,
        participant_id: &str,
        status: ParticipantStatus,
        updated_by: &str,
    ) -> Result<(), DomainError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.participant_id == participant_id)
            .ok_or_else(|| DomainError::not_found("Participant not found"))?;

        let from = participant.status;
        match status {
            ParticipantStatus::Active => participant.activate(),
            ParticipantStatus::Inactive => participant.deactivate(),
            ParticipantStatus::Suspended => participant.suspend(),
            ParticipantStatus::Pending => participant.set_status(ParticipantStatus::Pending),
        }

        self.touch(updated_by);
        self.record(
            updated_by,
            CollabEventKind::ParticipantStatusChanged {
                participant_id: participant_id.to_string(),
                from,
                to: status,
            },
        );
        Ok(())
    }

    // ==================== State machine ====================

    /// Draft, at least two active participants, and a valid strategy
    pub fn can_start(&self) -> bool {
        self.status == CollabStatus::Draft
            && self.active_participants().len() >= MIN_PARTICIPANTS
            && self.coordination_strategy.is_valid()
    }

    pub fn can_stop(&self) -> bool {
        self.status == CollabStatus::Active
    }

    /// Move to `new_status`. Every successful call emits exactly one
    /// `StatusChanged` event.
    pub fn change_status(
        &mut self,
        new_status: CollabStatus,
        changed_by: &str,
    ) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "Collaboration is already {}",
                self.status
            )));
        }
        match new_status {
            CollabStatus::Draft if self.status != CollabStatus::Draft => {
                return Err(DomainError::invalid_state(format!(
                    "Collaboration cannot return to draft from {}",
                    self.status
                )));
            }
            CollabStatus::Active if !self.can_start() => {
                return Err(DomainError::invalid_state(
                    "Collaboration cannot be started. Check status and participants.",
                ));
            }
            CollabStatus::Stopped if !self.can_stop() => {
                return Err(DomainError::invalid_state(
                    "Collaboration cannot be stopped. Only active collaborations can be stopped.",
                ));
            }
            _ => {}
        }

        let from = self.status;
        self.status = new_status;
        self.touch(changed_by);
        self.record(
            changed_by,
            CollabEventKind::StatusChanged {
                from,
                to: new_status,
            },
        );
        Ok(())
    }

    // ==================== Other mutators ====================

    /// Replace the coordination strategy. Emits `CoordinationStrategyChanged`.
    pub fn update_coordination_strategy(
        &mut self,
        strategy: CoordinationStrategy,
        updated_by: &str,
    ) -> Result<(), DomainError> {
        ensure_strategy_valid(&strategy)?;
        if let Some(coordinator) = strategy.coordinator_id.as_deref()
            && !self.participants.is_empty()
            && self.participant(coordinator).is_none()
        {
            return Err(DomainError::validation(
                "Coordinator must be a participant of the collaboration",
            ));
        }

        let from = std::mem::replace(&mut self.coordination_strategy, strategy.clone());
        self.touch(updated_by);
        self.record(
            updated_by,
            CollabEventKind::CoordinationStrategyChanged { from, to: strategy },
        );
        Ok(())
    }

    pub fn update_name(&mut self, name: impl Into<String>, updated_by: &str) -> Result<(), DomainError> {
        let name = name.into();
        if is_blank(&name) {
            return Err(DomainError::validation("Collaboration name is required"));
        }
        self.name = name;
        self.touch(updated_by);
        Ok(())
    }

    pub fn update_description(&mut self, description: Option<String>, updated_by: &str) {
        self.description = description.filter(|d| !is_blank(d));
        self.touch(updated_by);
    }

    pub fn change_mode(&mut self, mode: CollabMode, updated_by: &str) -> Result<(), DomainError> {
        if self.status == CollabStatus::Active {
            return Err(DomainError::invalid_state(
                "Cannot change mode of an active collaboration",
            ));
        }
        self.mode = mode;
        self.touch(updated_by);
        Ok(())
    }

    // ==================== Events ====================

    pub fn domain_events(&self) -> &[CollabDomainEvent] {
        &self.domain_events
    }

    /// Drain pending events after they have been published
    pub fn clear_domain_events(&mut self) -> Vec<CollabDomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    fn record(&mut self, triggered_by: &str, kind: CollabEventKind) {
        self.domain_events
            .push(CollabDomainEvent::new(&self.id, triggered_by, kind));
    }

    fn touch(&mut self, updated_by: &str) {
        let now = Utc::now();
        self.timestamp = now;
        self.updated_at = Some(now);
        self.updated_by = Some(updated_by.to_string());
    }
}

fn ensure_strategy_valid(strategy: &CoordinationStrategy) -> Result<(), DomainError> {
    match strategy.validate().into_iter().next() {
        Some(issue) => Err(DomainError::Validation(issue.message)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::value_objects::{CoordinationType, DecisionMaking};

    fn entity() -> CollabEntity {
        CollabEntity::new(
            "collab-1",
            "ctx-1",
            "plan-1",
            "Review squad",
            CollabMode::Parallel,
            CoordinationStrategy::default(),
            "user-1",
        )
        .unwrap()
    }

    fn participant(n: usize, status: ParticipantStatus) -> CollabParticipant {
        CollabParticipant::new(format!("p-{n}"), format!("agent-{n}"), "role-dev", status)
    }

    fn with_participants(count: usize) -> CollabEntity {
        let mut collab = entity();
        for n in 0..count {
            collab
                .add_participant(participant(n, ParticipantStatus::Active), "user-1")
                .unwrap();
        }
        collab
    }

    #[test]
    fn test_new_emits_created_event() {
        let collab = entity();
        assert_eq!(collab.status(), CollabStatus::Draft);
        assert_eq!(collab.protocol_version(), "1.0.0");
        assert_eq!(collab.domain_events().len(), 1);
        assert_eq!(collab.domain_events()[0].name(), "CollabCreated");
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        let err = CollabEntity::new(
            "c",
            "",
            "plan",
            "name",
            CollabMode::Mesh,
            CoordinationStrategy::default(),
            "u",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Context ID is required");

        let err = CollabEntity::new(
            "c",
            "ctx",
            "plan",
            "  ",
            CollabMode::Mesh,
            CoordinationStrategy::default(),
            "u",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Collaboration name is required");
    }

    #[test]
    fn test_new_rejects_invalid_strategy() {
        let strategy = CoordinationStrategy::new(CoordinationType::Centralized, DecisionMaking::Coordinator);
        let result = CollabEntity::new("c", "ctx", "plan", "n", CollabMode::Sequential, strategy, "u");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_add_participant_rejects_duplicates() {
        let mut collab = with_participants(2);
        let err = collab
            .add_participant(participant(1, ParticipantStatus::Active), "user-1")
            .unwrap_err();
        assert_eq!(err.to_string(), "Participant already exists in collaboration");

        let same_agent = CollabParticipant::new("p-new", "agent-0", "role", ParticipantStatus::Active);
        assert!(collab.add_participant(same_agent, "user-1").is_err());
    }

    #[test]
    fn test_add_participant_enforces_limit() {
        let mut collab = with_participants(MAX_PARTICIPANTS);
        let err = collab
            .add_participant(participant(1000, ParticipantStatus::Active), "user-1")
            .unwrap_err();
        assert!(matches!(err, DomainError::LimitExceeded(_)));
        assert_eq!(collab.participants().len(), MAX_PARTICIPANTS);
    }

    #[test]
    fn test_remove_never_drops_below_two() {
        for count in 2..6 {
            let mut collab = with_participants(count);
            for n in 0..count {
                let _ = collab.remove_participant(&format!("p-{n}"), "user-1", None);
                assert!(collab.participants().len() >= MIN_PARTICIPANTS);
            }
            assert_eq!(collab.participants().len(), MIN_PARTICIPANTS);
        }
    }

    #[test]
    fn test_remove_at_minimum_errors() {
        let mut collab = with_participants(2);
        let err = collab.remove_participant("p-0", "user-1", None).unwrap_err();
        assert!(err.to_string().contains("at least 2 participants"));
    }

    #[test]
    fn test_remove_unknown_participant() {
        let mut collab = with_participants(3);
        let err = collab.remove_participant("nobody", "user-1", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_emits_event() {
        let mut collab = with_participants(3);
        collab.clear_domain_events();
        collab
            .remove_participant("p-2", "user-1", Some("left".into()))
            .unwrap();
        assert_eq!(collab.domain_events().len(), 1);
        assert_eq!(collab.domain_events()[0].name(), "ParticipantRemoved");
    }

    #[test]
    fn test_cannot_remove_required_coordinator() {
        let mut collab = with_participants(3);
        collab
            .update_coordination_strategy(
                CoordinationStrategy::new(CoordinationType::Centralized, DecisionMaking::Coordinator)
                    .with_coordinator("p-0"),
                "user-1",
            )
            .unwrap();
        assert!(collab.remove_participant("p-0", "user-1", None).is_err());
        assert!(collab.remove_participant("p-1", "user-1", None).is_ok());
    }

    #[test]
    fn test_start_requires_two_active_participants() {
        let mut collab = entity();
        collab
            .add_participant(participant(0, ParticipantStatus::Active), "u")
            .unwrap();
        collab
            .add_participant(participant(1, ParticipantStatus::Pending), "u")
            .unwrap();
        assert!(!collab.can_start());
        assert!(collab.change_status(CollabStatus::Active, "u").is_err());

        collab
            .update_participant_status("p-1", ParticipantStatus::Active, "u")
            .unwrap();
        assert!(collab.can_start());
        collab.change_status(CollabStatus::Active, "u").unwrap();
        assert_eq!(collab.status(), CollabStatus::Active);
    }

    #[test]
    fn test_activate_only_from_draft() {
        let mut collab = with_participants(2);
        collab.change_status(CollabStatus::Pending, "u").unwrap();
        assert!(collab.change_status(CollabStatus::Active, "u").is_err());
    }

    #[test]
    fn test_draft_active_stopped_lifecycle() {
        let mut collab = with_participants(2);
        assert!(!collab.can_stop());
        assert!(collab.change_status(CollabStatus::Stopped, "u").is_err());

        collab.change_status(CollabStatus::Active, "u").unwrap();
        assert!(collab.can_stop());
        collab.change_status(CollabStatus::Stopped, "u").unwrap();
        assert_eq!(collab.status(), CollabStatus::Stopped);
    }

    #[test]
    fn test_stopped_collaboration_cannot_restart() {
        let mut collab = with_participants(2);
        collab.change_status(CollabStatus::Active, "u").unwrap();
        collab.change_status(CollabStatus::Stopped, "u").unwrap();

        let before = collab.domain_events().len();
        assert!(collab.change_status(CollabStatus::Draft, "u").is_err());
        assert!(collab.change_status(CollabStatus::Active, "u").is_err());
        assert_eq!(collab.status(), CollabStatus::Stopped);
        assert_eq!(collab.domain_events().len(), before);
    }

    #[test]
    fn test_restore_rejects_duplicate_participants() {
        let collab = with_participants(2);
        let mut snapshot = collab.snapshot();
        snapshot.participants.push(snapshot.participants[0].clone());
        assert!(matches!(CollabEntity::restore(snapshot), Err(DomainError::Duplicate(_))));

        let mut snapshot = collab.snapshot();
        let mut same_agent = participant(7, ParticipantStatus::Active);
        same_agent.agent_id = "agent-0".into();
        snapshot.participants.push(same_agent);
        assert!(CollabEntity::restore(snapshot).is_err());
    }

    #[test]
    fn test_change_status_appends_exactly_one_event() {
        let targets = [
            CollabStatus::Draft,
            CollabStatus::Active,
            CollabStatus::Stopped,
            CollabStatus::Pending,
            CollabStatus::Inactive,
            CollabStatus::Failed,
            CollabStatus::Completed,
        ];
        let mut collab = with_participants(2);
        for target in targets {
            let before = collab.domain_events().len();
            collab.change_status(target, "u").unwrap();
            assert_eq!(collab.domain_events().len(), before + 1, "target {target}");
        }
    }

    #[test]
    fn test_terminal_status_refuses_transitions() {
        let mut collab = with_participants(2);
        collab.change_status(CollabStatus::Cancelled, "u").unwrap();
        let before = collab.domain_events().len();
        assert!(collab.change_status(CollabStatus::Draft, "u").is_err());
        assert_eq!(collab.domain_events().len(), before);
    }

    #[test]
    fn test_strategy_coordinator_must_be_participant() {
        let mut collab = with_participants(2);
        let strategy = CoordinationStrategy::new(CoordinationType::Centralized, DecisionMaking::Coordinator)
            .with_coordinator("stranger");
        assert!(collab.update_coordination_strategy(strategy, "u").is_err());
    }

    #[test]
    fn test_restore_emits_no_events() {
        let collab = with_participants(3);
        let restored = CollabEntity::restore(collab.snapshot()).unwrap();
        assert!(restored.domain_events().is_empty());
        assert_eq!(restored.participants().len(), 3);
        assert_eq!(restored.id(), collab.id());
    }

    #[test]
    fn test_change_mode_blocked_while_active() {
        let mut collab = with_participants(2);
        collab.change_status(CollabStatus::Active, "u").unwrap();
        assert!(collab.change_mode(CollabMode::Mesh, "u").is_err());
    }
}
