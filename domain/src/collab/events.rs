//! Collab domain events
//!
//! Events accumulate on the aggregate and are drained by whoever
//! persists it.

use super::value_objects::{CollabStatus, CoordinationStrategy, ParticipantStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a collaboration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CollabEventKind {
    CollabCreated {
        name: String,
    },
    ParticipantAdded {
        participant_id: String,
        agent_id: String,
    },
    ParticipantRemoved {
        participant_id: String,
        reason: Option<String>,
    },
    ParticipantStatusChanged {
        participant_id: String,
        from: ParticipantStatus,
        to: ParticipantStatus,
    },
    StatusChanged {
        from: CollabStatus,
        to: CollabStatus,
    },
    CoordinationStrategyChanged {
        from: CoordinationStrategy,
        to: CoordinationStrategy,
    },
}

impl CollabEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            CollabEventKind::CollabCreated { .. } => "CollabCreated",
            CollabEventKind::ParticipantAdded { .. } => "ParticipantAdded",
            CollabEventKind::ParticipantRemoved { .. } => "ParticipantRemoved",
            CollabEventKind::ParticipantStatusChanged { .. } => "ParticipantStatusChanged",
            CollabEventKind::StatusChanged { .. } => "StatusChanged",
            CollabEventKind::CoordinationStrategyChanged { .. } => "CoordinationStrategyChanged",
        }
    }
}

/// A domain event raised by a [`CollabEntity`](super::entities::CollabEntity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabDomainEvent {
    pub event_id: String,
    pub collaboration_id: String,
    pub occurred_at: DateTime<Utc>,
    pub triggered_by: String,
    #[serde(flatten)]
    pub kind: CollabEventKind,
}

impl CollabDomainEvent {
    pub fn new(
        collaboration_id: impl Into<String>,
        triggered_by: impl Into<String>,
        kind: CollabEventKind,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            collaboration_id: collaboration_id.into(),
            occurred_at: Utc::now(),
            triggered_by: triggered_by.into(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = CollabDomainEvent::new(
            "c-1",
            "user-1",
            CollabEventKind::StatusChanged {
                from: CollabStatus::Draft,
                to: CollabStatus::Active,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "status_changed");
        assert_eq!(json["to"], "active");
        assert_eq!(event.name(), "StatusChanged");
    }
}
