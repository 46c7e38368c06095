//! Structural estimates
//!
//! Deterministic figures derived from a collaboration's strategy and
//! participants. Monitoring and analytics use them wherever the
//! [`MetricsSource`](crate::ports::metrics_source::MetricsSource) has no
//! observation.

use mplp_domain::collab::{CollabCoordinationService, CollabEntity, CoordinationType, DecisionMaking};

fn participant_count(collab: &CollabEntity) -> usize {
    collab.participants().len()
}

/// Share of participants that are active; 0 for an empty team
pub fn participant_utilization(collab: &CollabEntity) -> f64 {
    let total = participant_count(collab);
    if total == 0 {
        return 0.0;
    }
    collab.active_participants().len() as f64 / total as f64
}

pub fn coordination_efficiency(collab: &CollabEntity) -> f64 {
    let strategy = collab.coordination_strategy();
    let mut efficiency: f64 = 1.0;
    if strategy.coordination_type == CoordinationType::PeerToPeer && participant_count(collab) > 5 {
        efficiency *= 0.7;
    }
    if strategy.coordination_type == CoordinationType::Centralized && !strategy.has_coordinator() {
        efficiency *= 0.4;
    }
    efficiency.clamp(0.0, 1.0)
}

pub fn decision_making_speed(collab: &CollabEntity) -> f64 {
    let strategy = collab.coordination_strategy();
    let mut speed: f64 = 1.0;
    if strategy.decision_making == DecisionMaking::Consensus && participant_count(collab) > 5 {
        speed *= 0.6;
    } else if strategy.decision_making == DecisionMaking::Coordinator {
        speed *= 1.2;
    }
    speed.clamp(0.0, 1.0)
}

fn topology_multiplier(coordination_type: CoordinationType) -> f64 {
    match coordination_type {
        CoordinationType::Centralized => 1.2,
        CoordinationType::Distributed => 1.5,
        CoordinationType::PeerToPeer => 2.0,
        CoordinationType::Hierarchical => 1.0,
    }
}

fn scaled_by_team(collab: &CollabEntity, base_ms: f64) -> f64 {
    base_ms
        * topology_multiplier(collab.coordination_strategy().coordination_type)
        * ((participant_count(collab) + 1) as f64).ln()
}

/// `100 ms × topology multiplier × ln(n + 1)`
pub fn coordination_latency_ms(collab: &CollabEntity) -> f64 {
    scaled_by_team(collab, 100.0)
}

/// `1000 ms × topology multiplier × ln(n + 1)`
pub fn average_response_time_ms(collab: &CollabEntity) -> f64 {
    scaled_by_team(collab, 1000.0)
}

pub fn coordination_error_rate(collab: &CollabEntity) -> f64 {
    let strategy = collab.coordination_strategy();
    let n = participant_count(collab);
    let mut rate = 0.05;
    if strategy.coordination_type == CoordinationType::PeerToPeer && n > 10 {
        rate += 0.1;
    }
    if strategy.decision_making == DecisionMaking::Consensus && n > 5 {
        rate += 0.05;
    }
    f64::min(1.0, rate)
}

/// Coordination errors plus a penalty for very large teams
pub fn error_rate(collab: &CollabEntity) -> f64 {
    let n = participant_count(collab);
    let mut rate = coordination_error_rate(collab);
    if n > 20 {
        rate += 0.05;
    }
    if n > 50 {
        rate += 0.1;
    }
    f64::min(1.0, rate)
}

pub fn task_completion_rate(collab: &CollabEntity) -> f64 {
    let strategy = collab.coordination_strategy();
    let mut rate = 0.85;
    if strategy.coordination_type == CoordinationType::Hierarchical {
        rate += 0.1;
    }
    if strategy.decision_making == DecisionMaking::Coordinator {
        rate += 0.05;
    }
    f64::min(1.0, rate)
}

/// Expected output quality on a 0..=10 scale
pub fn quality_score(collab: &CollabEntity) -> f64 {
    let strategy = collab.coordination_strategy();
    let mut score = 7.0
        + match strategy.decision_making {
            DecisionMaking::Consensus => 1.5,
            DecisionMaking::Weighted => 1.2,
            DecisionMaking::Majority => 1.0,
            DecisionMaking::Coordinator => 0.0,
        };
    if strategy.coordination_type == CoordinationType::Hierarchical {
        score += 0.5;
    }
    f64::min(10.0, score)
}

/// Expected task duration in hours
pub fn average_task_duration_hours(collab: &CollabEntity) -> f64 {
    let strategy = collab.coordination_strategy();
    let mut hours = 8.0;
    if strategy.coordination_type == CoordinationType::PeerToPeer {
        hours *= 1.5;
    }
    if strategy.decision_making == DecisionMaking::Consensus {
        hours *= 1.3;
    }
    if participant_count(collab) > 10 {
        hours *= 1.2;
    }
    hours
}

pub fn capability_diversity(collab: &CollabEntity) -> f64 {
    let matrix: Vec<Vec<String>> = collab
        .participants()
        .iter()
        .map(|p| p.capabilities.clone())
        .collect();
    CollabCoordinationService::capability_diversity(&matrix)
}

/// Satisfaction on a 0..=10 scale from utilization and capability diversity
pub fn participant_satisfaction(collab: &CollabEntity) -> f64 {
    f64::min(
        10.0,
        participant_utilization(collab) * 6.0 + capability_diversity(collab) * 4.0,
    )
}

pub fn resource_utilization(collab: &CollabEntity) -> f64 {
    participant_utilization(collab) * 0.7 + coordination_efficiency(collab) * 0.3
}

pub fn resource_efficiency(collab: &CollabEntity) -> f64 {
    participant_utilization(collab) * 0.6 + coordination_efficiency(collab) * 0.4
}

/// Cost units: 100 per participant, 30% more for peer-to-peer
pub fn resource_cost(collab: &CollabEntity) -> f64 {
    let cost = participant_count(collab) as f64 * 100.0;
    if collab.coordination_strategy().coordination_type == CoordinationType::PeerToPeer {
        cost * 1.3
    } else {
        cost
    }
}

pub fn success_rate(collab: &CollabEntity) -> f64 {
    coordination_efficiency(collab) * 0.4 + task_completion_rate(collab) * 0.6
}

/// Tasks per day: two per active participant
pub fn throughput(collab: &CollabEntity) -> f64 {
    collab.active_participants().len() as f64 * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::collab_with;
    use mplp_domain::collab::{CollabMode, CoordinationStrategy, ParticipantStatus};

    fn strategy(t: CoordinationType, d: DecisionMaking) -> CoordinationStrategy {
        CoordinationStrategy::new(t, d)
    }

    #[test]
    fn test_efficiency_penalties() {
        let p2p = collab_with(
            "a",
            CollabMode::Mesh,
            strategy(CoordinationType::PeerToPeer, DecisionMaking::Consensus),
            6,
            ParticipantStatus::Active,
        );
        assert!((coordination_efficiency(&p2p) - 0.7).abs() < 1e-9);
        assert!((decision_making_speed(&p2p) - 0.6).abs() < 1e-9);
        assert!((coordination_error_rate(&p2p) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_latency_model() {
        let collab = collab_with(
            "b",
            CollabMode::Parallel,
            strategy(CoordinationType::Distributed, DecisionMaking::Majority),
            3,
            ParticipantStatus::Active,
        );
        let expected = 100.0 * 1.5 * 4f64.ln();
        assert!((coordination_latency_ms(&collab) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_utilization_and_throughput() {
        let collab = collab_with(
            "c",
            CollabMode::Parallel,
            CoordinationStrategy::default(),
            4,
            ParticipantStatus::Pending,
        );
        assert_eq!(participant_utilization(&collab), 0.0);
        assert_eq!(throughput(&collab), 0.0);
        assert_eq!(resource_cost(&collab), 400.0);
    }

    #[test]
    fn test_quality_score_bounds() {
        let collab = collab_with(
            "d",
            CollabMode::Hybrid,
            strategy(CoordinationType::Hierarchical, DecisionMaking::Consensus),
            3,
            ParticipantStatus::Active,
        );
        assert_eq!(quality_score(&collab), 9.0);
        assert_eq!(task_completion_rate(&collab), 0.95);
    }
}
