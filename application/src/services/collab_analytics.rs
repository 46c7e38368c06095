//! Collaboration performance analytics
//!
//! Builds a performance report per collaboration: grouped metrics, trend
//! directions, a weighted health score, and a risk assessment. Observed
//! values from the [`MetricsSource`] win over structural estimates.

use super::collab_management::CollabServiceError;
use super::estimates;
use crate::ports::metrics_source::{CollabObservation, MetricsSource, NoMetrics};
use chrono::{DateTime, Utc};
use mplp_domain::collab::{CollabEntity, CollabRepository};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinationMetrics {
    pub efficiency: f64,
    pub decision_making_speed: f64,
    pub latency_ms: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantMetrics {
    pub total: usize,
    pub active: usize,
    pub engagement: f64,
    pub capability_diversity: f64,
    /// 0..=10 scale
    pub satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskMetrics {
    pub completion_rate: f64,
    pub average_duration_hours: f64,
    /// 0..=10 scale
    pub quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceMetrics {
    pub utilization: f64,
    pub efficiency: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub response_time_ms: f64,
    pub throughput: f64,
    pub error_rate: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTrends {
    pub engagement: TrendDirection,
    pub efficiency: TrendDirection,
    pub quality: TrendDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub category: String,
    pub level: RiskLevel,
    pub probability: f64,
    pub description: String,
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub overall_risk: RiskLevel,
    /// 0..=100
    pub risk_score: u8,
    pub factors: Vec<RiskFactor>,
    /// Up to three mitigations, highest risk first
    pub mitigations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub collaboration_id: String,
    pub generated_at: DateTime<Utc>,
    pub observed: bool,
    pub coordination: CoordinationMetrics,
    pub participants: ParticipantMetrics,
    pub tasks: TaskMetrics,
    pub resources: ResourceMetrics,
    pub performance: PerformanceMetrics,
    pub trends: PerformanceTrends,
    /// 0..=100
    pub health_score: u8,
    pub risk_assessment: RiskAssessment,
    pub recommendations: Vec<String>,
}

pub struct CollabAnalyticsService {
    repository: Arc<dyn CollabRepository>,
    metrics_source: Arc<dyn MetricsSource>,
}

impl CollabAnalyticsService {
    pub fn new(repository: Arc<dyn CollabRepository>) -> Self {
        Self {
            repository,
            metrics_source: Arc::new(NoMetrics),
        }
    }

    pub fn with_metrics_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.metrics_source = source;
        self
    }

    pub async fn generate_performance_report(
        &self,
        collaboration_id: &str,
    ) -> Result<PerformanceReport, CollabServiceError> {
        let collab = self
            .repository
            .find_by_id(collaboration_id)
            .await?
            .ok_or(CollabServiceError::NotFound)?;
        let observation = self.metrics_source.observe(collaboration_id);
        let report = Self::build_report(&collab, observation);
        debug!(
            "Performance report for {}: health {} risk {:?}",
            collaboration_id, report.health_score, report.risk_assessment.overall_risk
        );
        Ok(report)
    }

    fn build_report(collab: &CollabEntity, observation: Option<CollabObservation>) -> PerformanceReport {
        let observed = observation.is_some();
        let obs = observation.unwrap_or_default();

        let engagement = obs
            .participant_utilization
            .unwrap_or_else(|| estimates::participant_utilization(collab));
        let error_rate = obs.error_rate.unwrap_or_else(|| estimates::error_rate(collab));

        let coordination = CoordinationMetrics {
            efficiency: estimates::coordination_efficiency(collab),
            decision_making_speed: estimates::decision_making_speed(collab),
            latency_ms: estimates::coordination_latency_ms(collab),
            error_rate: estimates::coordination_error_rate(collab),
        };
        let participants = ParticipantMetrics {
            total: collab.participants().len(),
            active: collab.active_participants().len(),
            engagement,
            capability_diversity: estimates::capability_diversity(collab),
            satisfaction: estimates::participant_satisfaction(collab),
        };
        let tasks = TaskMetrics {
            completion_rate: obs
                .task_completion_rate
                .unwrap_or_else(|| estimates::task_completion_rate(collab)),
            average_duration_hours: estimates::average_task_duration_hours(collab),
            quality_score: obs.quality_score.unwrap_or_else(|| estimates::quality_score(collab)),
        };
        let resources = ResourceMetrics {
            utilization: obs
                .resource_utilization
                .unwrap_or_else(|| estimates::resource_utilization(collab)),
            efficiency: estimates::resource_efficiency(collab),
            cost: estimates::resource_cost(collab),
        };
        let performance = PerformanceMetrics {
            response_time_ms: obs
                .response_time_ms
                .unwrap_or_else(|| estimates::average_response_time_ms(collab)),
            throughput: obs.throughput.unwrap_or_else(|| estimates::throughput(collab)),
            error_rate,
            success_rate: estimates::success_rate(collab),
        };

        let trends = PerformanceTrends {
            engagement: trend(engagement, 0.8, 0.6),
            efficiency: trend(coordination.efficiency, 0.8, 0.6),
            quality: trend(tasks.quality_score / 10.0, 0.8, 0.6),
        };

        let health_score = health_score(&participants, &coordination, &tasks, &resources);
        let risk_assessment = assess_risk(&participants, &coordination, &performance);

        let mut recommendations = Vec::new();
        if engagement < 0.8 {
            recommendations.push("Improve participant engagement through clearer task assignment".to_string());
        }
        if coordination.efficiency < 0.6 {
            recommendations.push("Review the coordination strategy for this team size".to_string());
        }
        if error_rate > 0.1 {
            recommendations.push("Reduce error rate by splitting the team or adding a coordinator".to_string());
        }

        PerformanceReport {
            collaboration_id: collab.id().to_string(),
            generated_at: Utc::now(),
            observed,
            coordination,
            participants,
            tasks,
            resources,
            performance,
            trends,
            health_score,
            risk_assessment,
            recommendations,
        }
    }
}

fn trend(value: f64, rising_above: f64, falling_below: f64) -> TrendDirection {
    if value > rising_above {
        TrendDirection::Increasing
    } else if value < falling_below {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Weighted: engagement 25%, coordination 25%, tasks 30%, resources 20%
fn health_score(
    participants: &ParticipantMetrics,
    coordination: &CoordinationMetrics,
    tasks: &TaskMetrics,
    resources: &ResourceMetrics,
) -> u8 {
    let score = participants.engagement * 0.25
        + coordination.efficiency * 0.25
        + tasks.completion_rate * 0.30
        + resources.efficiency * 0.20;
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn assess_risk(
    participants: &ParticipantMetrics,
    coordination: &CoordinationMetrics,
    performance: &PerformanceMetrics,
) -> RiskAssessment {
    let mut factors = Vec::new();
    if participants.engagement < 0.5 {
        factors.push(RiskFactor {
            category: "participant".into(),
            level: RiskLevel::High,
            probability: 0.8,
            description: "Low participant engagement may delay collaboration outcomes".into(),
            mitigation: "Re-engage inactive participants or replace them".into(),
        });
    }
    if coordination.efficiency < 0.6 {
        factors.push(RiskFactor {
            category: "coordination".into(),
            level: RiskLevel::Medium,
            probability: 0.6,
            description: "Coordination overhead is reducing team efficiency".into(),
            mitigation: "Switch to a coordination type suited to the team size".into(),
        });
    }
    if performance.error_rate > 0.1 {
        factors.push(RiskFactor {
            category: "performance".into(),
            level: RiskLevel::Medium,
            probability: 0.5,
            description: "Elevated error rate".into(),
            mitigation: "Investigate failing interactions between participants".into(),
        });
    }
    if participants.capability_diversity < 0.3 && participants.total > 1 {
        factors.push(RiskFactor {
            category: "capability".into(),
            level: RiskLevel::Low,
            probability: 0.4,
            description: "Participants share overlapping capabilities".into(),
            mitigation: "Add participants with complementary capabilities".into(),
        });
    }

    let weight = |level: RiskLevel| match level {
        RiskLevel::High => 3.0,
        RiskLevel::Medium => 2.0,
        RiskLevel::Low => 1.0,
    };
    let raw: f64 = factors.iter().map(|f| weight(f.level) * f.probability).sum();
    let risk_score = ((raw / 3.0).min(1.0) * 100.0).round() as u8;
    let overall_risk = factors.iter().map(|f| f.level).max_by_key(|l| weight(*l) as u8).unwrap_or(RiskLevel::Low);

    let mut ranked: Vec<&RiskFactor> = factors.iter().collect();
    ranked.sort_by(|a, b| {
        (weight(b.level) * b.probability)
            .partial_cmp(&(weight(a.level) * a.probability))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mitigations = ranked.iter().take(3).map(|f| f.mitigation.clone()).collect();

    RiskAssessment {
        overall_risk,
        risk_score,
        factors,
        mitigations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{FakeCollabRepository, collab_with};
    use mplp_domain::collab::{CollabMode, CoordinationStrategy, ParticipantStatus};

    struct Observed(CollabObservation);

    impl MetricsSource for Observed {
        fn observe(&self, _collaboration_id: &str) -> Option<CollabObservation> {
            Some(self.0.clone())
        }
    }

    async fn repo_with(status: ParticipantStatus) -> Arc<FakeCollabRepository> {
        let repo = Arc::new(FakeCollabRepository::default());
        repo.save(&collab_with("a-1", CollabMode::Parallel, CoordinationStrategy::default(), 4, status))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_report_for_engaged_team() {
        let svc = CollabAnalyticsService::new(repo_with(ParticipantStatus::Active).await);
        let report = svc.generate_performance_report("a-1").await.unwrap();

        assert!(!report.observed);
        assert_eq!(report.participants.active, 4);
        assert_eq!(report.trends.engagement, TrendDirection::Increasing);
        assert_eq!(report.risk_assessment.overall_risk, RiskLevel::Low);
        assert!(report.risk_assessment.factors.is_empty());
        assert!(report.health_score > 80);
        assert!(report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_report_flags_idle_team() {
        let svc = CollabAnalyticsService::new(repo_with(ParticipantStatus::Pending).await);
        let report = svc.generate_performance_report("a-1").await.unwrap();

        assert_eq!(report.trends.engagement, TrendDirection::Decreasing);
        assert_eq!(report.risk_assessment.overall_risk, RiskLevel::High);
        let participant = &report.risk_assessment.factors[0];
        assert_eq!(participant.category, "participant");
        assert_eq!(participant.probability, 0.8);
        assert_eq!(report.risk_assessment.mitigations.len(), 1);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_observation_overrides_estimates() {
        let svc = CollabAnalyticsService::new(repo_with(ParticipantStatus::Active).await).with_metrics_source(
            Arc::new(Observed(CollabObservation {
                participant_utilization: Some(0.7),
                response_time_ms: Some(1234.0),
                ..Default::default()
            })),
        );
        let report = svc.generate_performance_report("a-1").await.unwrap();
        assert!(report.observed);
        assert_eq!(report.participants.engagement, 0.7);
        assert_eq!(report.performance.response_time_ms, 1234.0);
        assert_eq!(report.trends.engagement, TrendDirection::Stable);
    }

    #[tokio::test]
    async fn test_unknown_collaboration() {
        let svc = CollabAnalyticsService::new(Arc::new(FakeCollabRepository::default()));
        let err = svc.generate_performance_report("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
