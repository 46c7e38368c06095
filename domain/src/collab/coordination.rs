//! Coordination-strategy advisor
//!
//! Stateless rules that recommend and check a collaboration's
//! `(topology, decision-making)` pair.
//!
//! # Decision table
//!
//! | mode       | participants | topology     | decision    |
//! |------------|--------------|--------------|-------------|
//! | sequential | any          | centralized  | coordinator |
//! | parallel   | ≤ 5          | distributed  | consensus   |
//! | parallel   | > 5          | hierarchical | majority    |
//! | pipeline   | any          | centralized  | coordinator |
//! | mesh       | any          | peer_to_peer | consensus   |
//! | hybrid     | ≤ 5          | hierarchical | consensus   |
//! | hybrid     | > 5          | hierarchical | majority    |
//!
//! After the lookup, `consensus` becomes `weighted` when capability
//! diversity is high, except in mesh mode.
//!
//! # Example
//!
//! ```
//! use mplp_domain::collab::{CollabCoordinationService, CollabMode, CoordinationType, DecisionMaking};
//!
//! let rec = CollabCoordinationService::calculate_optimal_strategy(CollabMode::Parallel, 6, &[]);
//! assert_eq!(rec.coordination_type, CoordinationType::Hierarchical);
//! assert_eq!(rec.decision_making, DecisionMaking::Majority);
//! ```

use super::entities::CollabParticipant;
use super::value_objects::{CollabMode, CoordinationStrategy, CoordinationType, DecisionMaking};
use crate::core::validation::ValidationIssue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Above this many participants, parallel and hybrid modes switch to
/// majority-style decisions
pub const SMALL_TEAM_LIMIT: usize = 5;

/// Diversity ratio above which consensus is weighted by capability
pub const HIGH_DIVERSITY_THRESHOLD: f64 = 0.7;

/// Diversity only counts once a team has this many members
pub const DIVERSITY_MIN_PARTICIPANTS: usize = 3;

/// Capabilities that mark a participant as a natural coordinator
const COORDINATOR_CAPABILITIES: [&str; 2] = ["leadership", "management"];

/// Output of [`CollabCoordinationService::calculate_optimal_strategy`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub coordination_type: CoordinationType,
    pub decision_making: DecisionMaking,
    pub capability_diversity: f64,
    pub rationale: String,
}

impl StrategyRecommendation {
    /// Turn the recommendation into a strategy, attaching a coordinator
    /// when the pair needs one
    pub fn into_strategy(self, coordinator_id: Option<String>) -> CoordinationStrategy {
        let strategy = CoordinationStrategy::new(self.coordination_type, self.decision_making);
        match coordinator_id {
            Some(id) if strategy.requires_coordinator() => strategy.with_coordinator(id),
            _ => strategy,
        }
    }
}

/// Coordination-strategy rules (Domain Service)
pub struct CollabCoordinationService;

impl CollabCoordinationService {
    /// Recommend a strategy for `participant_count` participants in `mode`.
    ///
    /// `capability_matrix` holds one capability list per participant and is
    /// only used for the diversity override.
    pub fn calculate_optimal_strategy(
        mode: CollabMode,
        participant_count: usize,
        capability_matrix: &[Vec<String>],
    ) -> StrategyRecommendation {
        let small = participant_count <= SMALL_TEAM_LIMIT;
        let (coordination_type, mut decision_making, mut rationale) = match mode {
            CollabMode::Sequential => (
                CoordinationType::Centralized,
                DecisionMaking::Coordinator,
                "sequential hand-offs need a single coordinator".to_string(),
            ),
            CollabMode::Pipeline => (
                CoordinationType::Centralized,
                DecisionMaking::Coordinator,
                "pipeline stages are driven by a coordinator".to_string(),
            ),
            CollabMode::Mesh => (
                CoordinationType::PeerToPeer,
                DecisionMaking::Consensus,
                "mesh participants coordinate as peers".to_string(),
            ),
            CollabMode::Parallel if small => (
                CoordinationType::Distributed,
                DecisionMaking::Consensus,
                format!("{} parallel participants can agree directly", participant_count),
            ),
            CollabMode::Parallel => (
                CoordinationType::Hierarchical,
                DecisionMaking::Majority,
                format!("{} parallel participants need a hierarchy", participant_count),
            ),
            CollabMode::Hybrid if small => (
                CoordinationType::Hierarchical,
                DecisionMaking::Consensus,
                "small hybrid team keeps consensus within a hierarchy".to_string(),
            ),
            CollabMode::Hybrid => (
                CoordinationType::Hierarchical,
                DecisionMaking::Majority,
                "large hybrid team votes within a hierarchy".to_string(),
            ),
        };

        let capability_diversity = Self::capability_diversity(capability_matrix);
        if mode != CollabMode::Mesh
            && decision_making == DecisionMaking::Consensus
            && participant_count >= DIVERSITY_MIN_PARTICIPANTS
            && capability_diversity > HIGH_DIVERSITY_THRESHOLD
        {
            decision_making = DecisionMaking::Weighted;
            rationale.push_str("; high capability diversity favours weighted decisions");
        }

        StrategyRecommendation {
            coordination_type,
            decision_making,
            capability_diversity,
            rationale,
        }
    }

    /// Distinct capabilities divided by total capability tags, in `[0, 1]`
    pub fn capability_diversity(capability_matrix: &[Vec<String>]) -> f64 {
        let total: usize = capability_matrix.iter().map(Vec::len).sum();
        if total == 0 {
            return 0.0;
        }
        let distinct: HashSet<String> = capability_matrix
            .iter()
            .flatten()
            .map(|c| c.to_lowercase())
            .collect();
        distinct.len() as f64 / total as f64
    }

    /// Check a strategy against the actual participant list
    pub fn validate_strategy(
        strategy: &CoordinationStrategy,
        participants: &[CollabParticipant],
    ) -> Vec<ValidationIssue> {
        let mut issues = strategy.validate();

        if let Some(coordinator) = strategy.coordinator_id.as_deref()
            && !participants.iter().any(|p| p.participant_id == coordinator)
        {
            issues.push(ValidationIssue::error(
                "COORDINATOR_NOT_PARTICIPANT",
                format!("Coordinator {} is not a participant", coordinator),
            ));
        }
        if strategy.coordination_type == CoordinationType::PeerToPeer && participants.len() < 3 {
            issues.push(ValidationIssue::warning(
                "PEER_TO_PEER_TOO_SMALL",
                "Peer-to-peer coordination works best with at least 3 participants",
            ));
        }
        if strategy.decision_making == DecisionMaking::Consensus && participants.len() > 10 {
            issues.push(ValidationIssue::warning(
                "CONSENSUS_TOO_LARGE",
                "Consensus decisions become slow with more than 10 participants",
            ));
        }
        issues
    }

    /// Coarse topology recommendation from team size alone
    pub fn recommend_coordination_type(mode: CollabMode, participant_count: usize) -> CoordinationType {
        match participant_count {
            0..=3 => CoordinationType::Centralized,
            4..=6 if mode == CollabMode::Parallel => CoordinationType::Distributed,
            4..=10 => CoordinationType::Hierarchical,
            _ => CoordinationType::PeerToPeer,
        }
    }

    /// Decision scheme matching a topology and team size
    pub fn recommend_decision_making(
        coordination_type: CoordinationType,
        participant_count: usize,
    ) -> DecisionMaking {
        if coordination_type == CoordinationType::Centralized {
            return DecisionMaking::Coordinator;
        }
        match participant_count {
            0..=5 => DecisionMaking::Consensus,
            6..=8 => DecisionMaking::Majority,
            _ => DecisionMaking::Weighted,
        }
    }

    /// First participant with a leadership/management capability,
    /// otherwise the first participant
    pub fn select_coordinator(participants: &[CollabParticipant]) -> Option<&CollabParticipant> {
        participants
            .iter()
            .find(|p| COORDINATOR_CAPABILITIES.iter().any(|c| p.has_capability(c)))
            .or_else(|| participants.first())
    }
}
