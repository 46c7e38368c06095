//! Collab value objects
//!
//! Enumerations use their snake_case wire names for both serde and
//! `Display`, so the same string appears in Schema JSON, logs, and CLI
//! arguments.

use crate::core::validation::ValidationIssue;
use crate::util::wire_enum;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Execution mode of a collaboration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum CollabMode {
        Sequential => "sequential",
        Parallel => "parallel",
        Hybrid => "hybrid",
        Pipeline => "pipeline",
        Mesh => "mesh",
    }
}

impl CollabMode {
    /// Recommended (min, max) team size for this mode
    pub fn optimal_team_size(&self) -> (usize, usize) {
        match self {
            CollabMode::Sequential => (2, 5),
            CollabMode::Parallel => (3, 8),
            CollabMode::Hybrid => (4, 10),
            CollabMode::Pipeline => (3, 7),
            CollabMode::Mesh => (5, 12),
        }
    }

    /// Relative resource cost per participant
    pub fn resource_multiplier(&self) -> f64 {
        match self {
            CollabMode::Mesh => 2.0,
            CollabMode::Hybrid => 1.5,
            _ => 1.0,
        }
    }
}

wire_enum! {
    /// Lifecycle status of a collaboration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub enum CollabStatus {
        #[default]
        Draft => "draft",
        Pending => "pending",
        Active => "active",
        Inactive => "inactive",
        Stopped => "stopped",
        Completed => "completed",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

impl CollabStatus {
    /// Completed and cancelled collaborations accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, CollabStatus::Completed | CollabStatus::Cancelled)
    }
}

wire_enum! {
    /// Status of a single participant
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub enum ParticipantStatus {
        Active => "active",
        Inactive => "inactive",
        #[default]
        Pending => "pending",
        Suspended => "suspended",
    }
}

wire_enum! {
    /// Coordination topology
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum CoordinationType {
        Centralized => "centralized",
        Distributed => "distributed",
        Hierarchical => "hierarchical",
        PeerToPeer => "peer_to_peer",
    }
}

wire_enum! {
    /// Decision-making scheme
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum DecisionMaking {
        Consensus => "consensus",
        Majority => "majority",
        Weighted => "weighted",
        Coordinator => "coordinator",
    }
}

/// Coordination strategy (Value Object)
///
/// The `(topology, decision-making)` pair plus an optional coordinator.
/// A coordinator is required for centralized topologies and for
/// coordinator-driven decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationStrategy {
    #[serde(rename = "type")]
    pub coordination_type: CoordinationType,
    pub decision_making: DecisionMaking,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator_id: Option<String>,
}

impl CoordinationStrategy {
    pub fn new(coordination_type: CoordinationType, decision_making: DecisionMaking) -> Self {
        Self {
            coordination_type,
            decision_making,
            coordinator_id: None,
        }
    }

    pub fn with_coordinator(mut self, coordinator_id: impl Into<String>) -> Self {
        self.coordinator_id = Some(coordinator_id.into());
        self
    }

    /// Whether this strategy cannot work without a coordinator
    pub fn requires_coordinator(&self) -> bool {
        self.coordination_type == CoordinationType::Centralized
            || self.decision_making == DecisionMaking::Coordinator
    }

    pub fn has_coordinator(&self) -> bool {
        self.coordinator_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// Internal consistency check, independent of participants
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.requires_coordinator() && !self.has_coordinator() {
            issues.push(ValidationIssue::error(
                "COORDINATOR_REQUIRED",
                format!(
                    "Coordinator is required for {} coordination with {} decision making",
                    self.coordination_type, self.decision_making
                ),
            ));
        }
        issues
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl Default for CoordinationStrategy {
    fn default() -> Self {
        Self::new(CoordinationType::Distributed, DecisionMaking::Consensus)
    }
}
