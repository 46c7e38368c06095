//! Collaboration monitoring
//!
//! Tracks monitored collaborations, refreshes their metrics on demand, and
//! raises alerts when a metric crosses its [`MonitoringThresholds`] bound.
//! Alerts of the same type are deduplicated while active: a repeat bumps
//! `occurrence_count` instead of creating a second alert. Only the most
//! recent [`MAX_CLOSED_ALERTS`] acknowledged or resolved alerts are kept.

use super::collab_management::CollabServiceError;
use super::estimates;
use crate::config::MonitoringThresholds;
use crate::ports::metrics_source::{MetricsSource, NoMetrics};
use chrono::{DateTime, Utc};
use mplp_domain::collab::{CollabEntity, CollabRepository};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Acknowledged and resolved alerts retained per collaboration
pub const MAX_CLOSED_ALERTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ParticipantUtilization,
    CoordinationEfficiency,
    DecisionMakingSpeed,
    TaskCompletionRate,
    QualityScore,
    ResponseTime,
    ErrorRate,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::ParticipantUtilization => "participant_utilization",
            AlertType::CoordinationEfficiency => "coordination_efficiency",
            AlertType::DecisionMakingSpeed => "decision_making_speed",
            AlertType::TaskCompletionRate => "task_completion_rate",
            AlertType::QualityScore => "quality_score",
            AlertType::ResponseTime => "response_time",
            AlertType::ErrorRate => "error_rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Warning,
    Critical,
}

impl OverallHealth {
    fn score(self) -> f64 {
        match self {
            OverallHealth::Healthy => 100.0,
            OverallHealth::Warning => 60.0,
            OverallHealth::Critical => 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringState {
    Active,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollabAlert {
    pub id: String,
    pub collaboration_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub description: String,
    pub threshold: f64,
    pub current_value: f64,
    pub created_at: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    pub occurrence_count: u32,
    pub acknowledged_by: Option<String>,
    pub resolved_by: Option<String>,
    pub resolution: Option<String>,
}

/// Latest metric values. Task completion and quality are only reported
/// when observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitoredMetrics {
    pub participant_utilization: f64,
    pub coordination_efficiency: f64,
    pub decision_making_speed: f64,
    pub task_completion_rate: Option<f64>,
    /// 0..=10 scale
    pub quality_score: Option<f64>,
    pub response_time_ms: f64,
    pub error_rate: f64,
    pub throughput: f64,
    /// Whether any value came from the metrics source
    pub observed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthChecks {
    pub participant_health: OverallHealth,
    pub coordination_health: OverallHealth,
    pub performance_health: OverallHealth,
    pub system_health: OverallHealth,
}

impl Default for HealthChecks {
    fn default() -> Self {
        Self {
            participant_health: OverallHealth::Healthy,
            coordination_health: OverallHealth::Healthy,
            performance_health: OverallHealth::Healthy,
            system_health: OverallHealth::Healthy,
        }
    }
}

impl HealthChecks {
    fn overall(&self) -> OverallHealth {
        [
            self.participant_health,
            self.coordination_health,
            self.performance_health,
            self.system_health,
        ]
        .into_iter()
        .max()
        .unwrap_or(OverallHealth::Healthy)
    }
}

#[derive(Debug, Clone)]
struct MonitoringRecord {
    started_at: DateTime<Utc>,
    last_update: DateTime<Utc>,
    state: MonitoringState,
    metrics: MonitoredMetrics,
    health: HealthChecks,
    alerts: Vec<CollabAlert>,
}

impl MonitoringRecord {
    fn active_alerts(&self) -> impl Iterator<Item = &CollabAlert> {
        self.alerts.iter().filter(|a| a.status == AlertStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStatus {
    pub collaboration_id: String,
    pub monitoring_status: MonitoringState,
    pub last_update: DateTime<Utc>,
    pub overall_health: OverallHealth,
    pub active_alerts: Vec<CollabAlert>,
    pub metrics: MonitoredMetrics,
    pub health_checks: HealthChecks,
    pub uptime_ms: i64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub total_collaborations: usize,
    pub active_collaborations: usize,
    pub total_alerts: usize,
    pub active_alerts: usize,
    pub average_health: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthOverview {
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceOverview {
    pub average_participant_utilization: f64,
    pub average_coordination_efficiency: f64,
    pub average_response_time_ms: f64,
    pub average_error_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitoringDashboard {
    pub summary: DashboardSummary,
    pub health_overview: HealthOverview,
    pub performance_overview: PerformanceOverview,
    pub recent_alerts: Vec<CollabAlert>,
    pub top_issues: Vec<String>,
}

/// Monitors collaborations against alert thresholds
pub struct CollabMonitoringService {
    repository: Arc<dyn CollabRepository>,
    metrics_source: Arc<dyn MetricsSource>,
    thresholds: MonitoringThresholds,
    records: RwLock<HashMap<String, MonitoringRecord>>,
}

impl CollabMonitoringService {
    pub fn new(repository: Arc<dyn CollabRepository>) -> Self {
        Self {
            repository,
            metrics_source: Arc::new(NoMetrics),
            thresholds: MonitoringThresholds::default(),
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_metrics_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.metrics_source = source;
        self
    }

    pub fn with_thresholds(mut self, thresholds: MonitoringThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    async fn load(&self, id: &str) -> Result<CollabEntity, CollabServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CollabServiceError::NotFound)
    }

    pub async fn start_monitoring(&self, collaboration_id: &str) -> Result<(), CollabServiceError> {
        self.load(collaboration_id).await?;
        let now = Utc::now();
        self.records.write().await.insert(
            collaboration_id.to_string(),
            MonitoringRecord {
                started_at: now,
                last_update: now,
                state: MonitoringState::Active,
                metrics: MonitoredMetrics::default(),
                health: HealthChecks::default(),
                alerts: Vec::new(),
            },
        );
        info!("Monitoring started for collaboration {}", collaboration_id);
        Ok(())
    }

    /// Stop monitoring. Unknown IDs are ignored.
    pub async fn stop_monitoring(&self, collaboration_id: &str) {
        if let Some(record) = self.records.write().await.get_mut(collaboration_id) {
            record.state = MonitoringState::Stopped;
            record.last_update = Utc::now();
            info!("Monitoring stopped for collaboration {}", collaboration_id);
        }
    }

    fn not_monitored() -> CollabServiceError {
        CollabServiceError::InvalidOperation("Collaboration is not being monitored".into())
    }

    /// Refresh metrics, health checks, and alerts for one collaboration
    pub async fn collect_metrics(&self, collaboration_id: &str) -> Result<MonitoredMetrics, CollabServiceError> {
        if !self.records.read().await.contains_key(collaboration_id) {
            return Err(Self::not_monitored());
        }
        let collab = self.load(collaboration_id).await?;
        let metrics = self.measure(&collab);
        let health = self.health_checks(&metrics);

        let mut records = self.records.write().await;
        let record = records.get_mut(collaboration_id).ok_or_else(Self::not_monitored)?;
        record.metrics = metrics.clone();
        record.health = health;
        self.raise_alerts(collaboration_id, &metrics, &mut record.alerts);
        record.last_update = Utc::now();
        Ok(metrics)
    }

    /// Refresh every actively monitored collaboration concurrently.
    /// Returns the IDs that failed to refresh.
    pub async fn refresh_all(&self) -> Vec<String> {
        let ids: Vec<String> = self
            .records
            .read()
            .await
            .iter()
            .filter(|(_, r)| r.state == MonitoringState::Active)
            .map(|(id, _)| id.clone())
            .collect();
        let results = futures::future::join_all(ids.iter().map(|id| self.collect_metrics(id))).await;
        ids.into_iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(_) => None,
                Err(e) => {
                    warn!("Failed to refresh metrics for {}: {}", id, e);
                    Some(id)
                }
            })
            .collect()
    }

    pub async fn get_monitoring_status(&self, collaboration_id: &str) -> Result<MonitoringStatus, CollabServiceError> {
        self.collect_metrics(collaboration_id).await?;
        let records = self.records.read().await;
        let record = records.get(collaboration_id).ok_or_else(Self::not_monitored)?;
        let active_alerts: Vec<CollabAlert> = record.active_alerts().cloned().collect();
        Ok(MonitoringStatus {
            collaboration_id: collaboration_id.to_string(),
            monitoring_status: record.state,
            last_update: record.last_update,
            overall_health: record.health.overall(),
            recommendations: Self::recommendations(&record.metrics, active_alerts.len()),
            active_alerts,
            metrics: record.metrics.clone(),
            health_checks: record.health,
            uptime_ms: (Utc::now() - record.started_at).num_milliseconds(),
        })
    }

    /// Active alerts for one collaboration, or for all when `None`
    pub async fn get_active_alerts(&self, collaboration_id: Option<&str>) -> Vec<CollabAlert> {
        let records = self.records.read().await;
        match collaboration_id {
            Some(id) => records
                .get(id)
                .map(|r| r.active_alerts().cloned().collect())
                .unwrap_or_default(),
            None => records.values().flat_map(|r| r.active_alerts().cloned()).collect(),
        }
    }

    pub async fn acknowledge_alert(
        &self,
        collaboration_id: &str,
        alert_id: &str,
        acknowledged_by: &str,
    ) -> Result<(), CollabServiceError> {
        self.with_alert(collaboration_id, alert_id, |alert| {
            alert.status = AlertStatus::Acknowledged;
            alert.acknowledged_by = Some(acknowledged_by.to_string());
        })
        .await
    }

    pub async fn resolve_alert(
        &self,
        collaboration_id: &str,
        alert_id: &str,
        resolved_by: &str,
        resolution: &str,
    ) -> Result<(), CollabServiceError> {
        self.with_alert(collaboration_id, alert_id, |alert| {
            alert.status = AlertStatus::Resolved;
            alert.resolved_by = Some(resolved_by.to_string());
            alert.resolution = Some(resolution.to_string());
        })
        .await
    }

    async fn with_alert<F>(&self, collaboration_id: &str, alert_id: &str, apply: F) -> Result<(), CollabServiceError>
    where
        F: FnOnce(&mut CollabAlert),
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(collaboration_id).ok_or_else(Self::not_monitored)?;
        let alert = record
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| CollabServiceError::Validation("Alert not found".into()))?;
        apply(alert);
        record.last_update = Utc::now();
        Ok(())
    }

    pub async fn generate_dashboard(&self) -> MonitoringDashboard {
        let records = self.records.read().await;
        let active: Vec<&MonitoringRecord> = records
            .values()
            .filter(|r| r.state == MonitoringState::Active)
            .collect();

        let mut health_overview = HealthOverview::default();
        for r in &active {
            match r.health.overall() {
                OverallHealth::Healthy => health_overview.healthy += 1,
                OverallHealth::Warning => health_overview.warning += 1,
                OverallHealth::Critical => health_overview.critical += 1,
            }
        }

        let average = |f: fn(&MonitoringRecord) -> f64| {
            if active.is_empty() {
                0.0
            } else {
                active.iter().map(|r| f(r)).sum::<f64>() / active.len() as f64
            }
        };

        let mut recent_alerts: Vec<CollabAlert> = records.values().flat_map(|r| r.alerts.iter().cloned()).collect();
        recent_alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_alerts.truncate(10);

        let mut issue_counts: BTreeMap<AlertType, usize> = BTreeMap::new();
        for alert in records.values().flat_map(|r| r.alerts.iter()) {
            *issue_counts.entry(alert.alert_type).or_default() += 1;
        }
        let mut issues: Vec<(AlertType, usize)> = issue_counts.into_iter().collect();
        issues.sort_by(|a, b| b.1.cmp(&a.1));
        let top_issues = issues.into_iter().take(5).map(|(t, _)| t.as_str().to_string()).collect();

        MonitoringDashboard {
            summary: DashboardSummary {
                total_collaborations: records.len(),
                active_collaborations: active.len(),
                total_alerts: records.values().map(|r| r.alerts.len()).sum(),
                active_alerts: records.values().map(|r| r.active_alerts().count()).sum(),
                average_health: average(|r| r.health.overall().score()),
            },
            health_overview,
            performance_overview: PerformanceOverview {
                average_participant_utilization: average(|r| r.metrics.participant_utilization),
                average_coordination_efficiency: average(|r| r.metrics.coordination_efficiency),
                average_response_time_ms: average(|r| r.metrics.response_time_ms),
                average_error_rate: average(|r| r.metrics.error_rate),
            },
            recent_alerts,
            top_issues,
        }
    }

    // ==================== Internals ====================

    fn measure(&self, collab: &CollabEntity) -> MonitoredMetrics {
        let observed = self.metrics_source.observe(collab.id());
        let obs = observed.clone().unwrap_or_default();
        MonitoredMetrics {
            participant_utilization: obs
                .participant_utilization
                .unwrap_or_else(|| estimates::participant_utilization(collab)),
            coordination_efficiency: estimates::coordination_efficiency(collab),
            decision_making_speed: estimates::decision_making_speed(collab),
            task_completion_rate: obs.task_completion_rate,
            quality_score: obs.quality_score,
            response_time_ms: obs
                .response_time_ms
                .unwrap_or_else(|| estimates::coordination_latency_ms(collab)),
            error_rate: obs
                .error_rate
                .unwrap_or_else(|| estimates::coordination_error_rate(collab)),
            throughput: obs.throughput.unwrap_or_else(|| estimates::throughput(collab)),
            observed: observed.is_some(),
        }
    }

    fn health_checks(&self, m: &MonitoredMetrics) -> HealthChecks {
        let t = &self.thresholds;
        let warn_if = |bad: bool| if bad { OverallHealth::Warning } else { OverallHealth::Healthy };
        HealthChecks {
            participant_health: warn_if(m.participant_utilization < t.participant_utilization_min),
            coordination_health: warn_if(m.coordination_efficiency < t.coordination_efficiency_min),
            performance_health: warn_if(m.response_time_ms > t.response_time_max_ms),
            system_health: if m.error_rate > t.error_rate_max {
                OverallHealth::Critical
            } else {
                OverallHealth::Healthy
            },
        }
    }

    fn raise_alerts(&self, collaboration_id: &str, m: &MonitoredMetrics, alerts: &mut Vec<CollabAlert>) {
        let t = &self.thresholds;
        let below = |value: f64, min: f64| (value < min).then_some((value, min));
        let above = |value: f64, max: f64| (value > max).then_some((value, max));

        let checks = [
            (
                AlertType::ParticipantUtilization,
                AlertSeverity::Warning,
                "Low Participant Utilization",
                below(m.participant_utilization, t.participant_utilization_min),
            ),
            (
                AlertType::CoordinationEfficiency,
                AlertSeverity::Warning,
                "Low Coordination Efficiency",
                below(m.coordination_efficiency, t.coordination_efficiency_min),
            ),
            (
                AlertType::DecisionMakingSpeed,
                AlertSeverity::Info,
                "Slow Decision Making",
                below(m.decision_making_speed, t.decision_making_speed_min),
            ),
            (
                AlertType::TaskCompletionRate,
                AlertSeverity::Warning,
                "Low Task Completion Rate",
                m.task_completion_rate.and_then(|v| below(v, t.task_completion_rate_min)),
            ),
            (
                AlertType::QualityScore,
                AlertSeverity::Warning,
                "Low Quality Score",
                m.quality_score.and_then(|v| below(v / 10.0, t.quality_score_min)),
            ),
            (
                AlertType::ResponseTime,
                AlertSeverity::Critical,
                "High Response Time",
                above(m.response_time_ms, t.response_time_max_ms),
            ),
            (
                AlertType::ErrorRate,
                AlertSeverity::Critical,
                "High Error Rate",
                above(m.error_rate, t.error_rate_max),
            ),
        ];

        let now = Utc::now();
        for (alert_type, severity, title, breach) in checks {
            let Some((value, threshold)) = breach else {
                continue;
            };
            if let Some(existing) = alerts
                .iter_mut()
                .find(|a| a.alert_type == alert_type && a.status == AlertStatus::Active)
            {
                existing.current_value = value;
                existing.last_occurrence = now;
                existing.occurrence_count += 1;
                continue;
            }
            debug!("Alert {} raised for {}", alert_type.as_str(), collaboration_id);
            alerts.push(CollabAlert {
                id: uuid::Uuid::new_v4().to_string(),
                collaboration_id: collaboration_id.to_string(),
                alert_type,
                severity,
                status: AlertStatus::Active,
                title: title.to_string(),
                description: Self::describe(alert_type, value),
                threshold,
                current_value: value,
                created_at: now,
                last_occurrence: now,
                occurrence_count: 1,
                acknowledged_by: None,
                resolved_by: None,
                resolution: None,
            });
        }
        Self::prune_closed(alerts);
    }

    /// Drop the oldest closed alerts beyond [`MAX_CLOSED_ALERTS`]
    fn prune_closed(alerts: &mut Vec<CollabAlert>) {
        let closed = alerts.iter().filter(|a| a.status != AlertStatus::Active).count();
        let mut excess = closed.saturating_sub(MAX_CLOSED_ALERTS);
        if excess == 0 {
            return;
        }
        // Alerts are appended in creation order, so the oldest come first
        alerts.retain(|a| {
            if excess > 0 && a.status != AlertStatus::Active {
                excess -= 1;
                return false;
            }
            true
        });
    }

    fn describe(alert_type: AlertType, value: f64) -> String {
        match alert_type {
            AlertType::ResponseTime => format!("Response time ({:.0}ms) exceeds threshold", value),
            AlertType::ErrorRate => format!("Error rate ({:.2}%) exceeds threshold", value * 100.0),
            other => format!(
                "{} ({:.1}%) is below threshold",
                other.as_str().replace('_', " "),
                value * 100.0
            ),
        }
    }

    fn recommendations(m: &MonitoredMetrics, active_alerts: usize) -> Vec<String> {
        let mut out = Vec::new();
        if m.participant_utilization < 0.7 {
            out.push("Consider reviewing participant engagement strategies".to_string());
        }
        if m.response_time_ms > 3000.0 {
            out.push("Investigate performance bottlenecks".to_string());
        }
        if active_alerts > 5 {
            out.push("Review and resolve active alerts to improve system health".to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::metrics_source::CollabObservation;
    use crate::services::test_support::{FakeCollabRepository, collab_with};
    use mplp_domain::collab::{CollabMode, CoordinationStrategy, ParticipantStatus};

    struct FixedMetrics(CollabObservation);

    impl MetricsSource for FixedMetrics {
        fn observe(&self, _collaboration_id: &str) -> Option<CollabObservation> {
            Some(self.0.clone())
        }
    }

    async fn service_with(status: ParticipantStatus) -> CollabMonitoringService {
        let repo = Arc::new(FakeCollabRepository::default());
        repo.save(&collab_with("m-1", CollabMode::Parallel, CoordinationStrategy::default(), 3, status))
            .await
            .unwrap();
        CollabMonitoringService::new(repo)
    }

    #[tokio::test]
    async fn test_status_requires_monitoring() {
        let svc = service_with(ParticipantStatus::Active).await;
        let err = svc.get_monitoring_status("m-1").await.unwrap_err();
        assert_eq!(err.to_string(), "Collaboration is not being monitored");
        assert!(svc.start_monitoring("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_healthy_collaboration_has_no_alerts() {
        let svc = service_with(ParticipantStatus::Active).await;
        svc.start_monitoring("m-1").await.unwrap();
        let status = svc.get_monitoring_status("m-1").await.unwrap();
        assert_eq!(status.overall_health, OverallHealth::Healthy);
        assert!(status.active_alerts.is_empty());
        assert!(!status.metrics.observed);
    }

    #[tokio::test]
    async fn test_alerts_deduplicate() {
        let svc = service_with(ParticipantStatus::Pending).await;
        svc.start_monitoring("m-1").await.unwrap();
        svc.collect_metrics("m-1").await.unwrap();
        svc.collect_metrics("m-1").await.unwrap();

        let alerts = svc.get_active_alerts(Some("m-1")).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::ParticipantUtilization);
        assert_eq!(alerts[0].occurrence_count, 2);

        let status = svc.get_monitoring_status("m-1").await.unwrap();
        assert_eq!(status.overall_health, OverallHealth::Warning);
        assert!(status
            .recommendations
            .contains(&"Consider reviewing participant engagement strategies".to_string()));
    }

    #[tokio::test]
    async fn test_acknowledge_and_resolve() {
        let svc = service_with(ParticipantStatus::Pending).await;
        svc.start_monitoring("m-1").await.unwrap();
        svc.collect_metrics("m-1").await.unwrap();
        let alert_id = svc.get_active_alerts(None).await[0].id.clone();

        svc.acknowledge_alert("m-1", &alert_id, "ops").await.unwrap();
        assert!(svc.get_active_alerts(Some("m-1")).await.is_empty());
        svc.resolve_alert("m-1", &alert_id, "ops", "re-engaged").await.unwrap();

        let err = svc.resolve_alert("m-1", "nope", "ops", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "Alert not found");
    }

    #[tokio::test]
    async fn test_closed_alerts_are_capped() {
        let svc = service_with(ParticipantStatus::Pending).await;
        svc.start_monitoring("m-1").await.unwrap();
        svc.collect_metrics("m-1").await.unwrap();
        let mut resolved = Vec::new();
        for _ in 0..MAX_CLOSED_ALERTS + 5 {
            let alert_id = svc.get_active_alerts(Some("m-1")).await[0].id.clone();
            svc.resolve_alert("m-1", &alert_id, "ops", "handled").await.unwrap();
            resolved.push(alert_id);
            svc.collect_metrics("m-1").await.unwrap();
        }

        let records = svc.records.read().await;
        let alerts = &records["m-1"].alerts;
        let closed: Vec<&str> = alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Resolved)
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(closed.len(), MAX_CLOSED_ALERTS);
        assert_eq!(closed[0], resolved[5]);
        assert_eq!(alerts.iter().filter(|a| a.status == AlertStatus::Active).count(), 1);
    }

    #[tokio::test]
    async fn test_observed_metrics_raise_critical_alerts() {
        let repo = Arc::new(FakeCollabRepository::default());
        repo.save(&collab_with("m-2", CollabMode::Parallel, CoordinationStrategy::default(), 3, ParticipantStatus::Active))
            .await
            .unwrap();
        let svc = CollabMonitoringService::new(repo).with_metrics_source(Arc::new(FixedMetrics(CollabObservation {
            response_time_ms: Some(7000.0),
            error_rate: Some(0.2),
            ..Default::default()
        })));
        svc.start_monitoring("m-2").await.unwrap();
        let status = svc.get_monitoring_status("m-2").await.unwrap();
        assert_eq!(status.overall_health, OverallHealth::Critical);
        assert_eq!(status.active_alerts.len(), 2);
        assert!(status.metrics.observed);

        let dashboard = svc.generate_dashboard().await;
        assert_eq!(dashboard.summary.active_alerts, 2);
        assert_eq!(dashboard.health_overview.critical, 1);
        assert_eq!(dashboard.summary.average_health, 20.0);
    }

    #[tokio::test]
    async fn test_stopped_monitoring_excluded_from_dashboard() {
        let svc = service_with(ParticipantStatus::Active).await;
        svc.start_monitoring("m-1").await.unwrap();
        svc.stop_monitoring("m-1").await;
        assert!(svc.refresh_all().await.is_empty());
        let dashboard = svc.generate_dashboard().await;
        assert_eq!(dashboard.summary.total_collaborations, 1);
        assert_eq!(dashboard.summary.active_collaborations, 0);
    }
}
