//! Monitoring thresholds from TOML (`[monitoring]` section)

use crate::config::issue::ConfigIssue;
use mplp_application::config::MonitoringThresholds;
use mplp_domain::core::validation::Severity;
use serde::{Deserialize, Serialize};

/// Raw monitoring configuration from TOML
///
/// Ratios are in `0.0..=1.0`; `response_time_max_ms` must be positive.
/// Invalid values fall back to the built-in threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMonitoringConfig {
    pub participant_utilization_min: f64,
    pub coordination_efficiency_min: f64,
    pub decision_making_speed_min: f64,
    pub task_completion_rate_min: f64,
    pub quality_score_min: f64,
    pub response_time_max_ms: f64,
    pub error_rate_max: f64,
}

impl Default for FileMonitoringConfig {
    fn default() -> Self {
        let t = MonitoringThresholds::default();
        Self {
            participant_utilization_min: t.participant_utilization_min,
            coordination_efficiency_min: t.coordination_efficiency_min,
            decision_making_speed_min: t.decision_making_speed_min,
            task_completion_rate_min: t.task_completion_rate_min,
            quality_score_min: t.quality_score_min,
            response_time_max_ms: t.response_time_max_ms,
            error_rate_max: t.error_rate_max,
        }
    }
}

impl FileMonitoringConfig {
    pub fn to_thresholds(&self) -> (MonitoringThresholds, Vec<ConfigIssue>) {
        let defaults = MonitoringThresholds::default();
        let mut issues = Vec::new();

        let mut ratio = |field: &str, value: f64, fallback: f64| -> f64 {
            if (0.0..=1.0).contains(&value) {
                value
            } else {
                issues.push(ConfigIssue::out_of_range(
                    Severity::Error,
                    &format!("monitoring.{}", field),
                    value,
                    fallback,
                ));
                fallback
            }
        };

        let mut thresholds = MonitoringThresholds {
            participant_utilization_min: ratio(
                "participant_utilization_min",
                self.participant_utilization_min,
                defaults.participant_utilization_min,
            ),
            coordination_efficiency_min: ratio(
                "coordination_efficiency_min",
                self.coordination_efficiency_min,
                defaults.coordination_efficiency_min,
            ),
            decision_making_speed_min: ratio(
                "decision_making_speed_min",
                self.decision_making_speed_min,
                defaults.decision_making_speed_min,
            ),
            task_completion_rate_min: ratio(
                "task_completion_rate_min",
                self.task_completion_rate_min,
                defaults.task_completion_rate_min,
            ),
            quality_score_min: ratio("quality_score_min", self.quality_score_min, defaults.quality_score_min),
            error_rate_max: ratio("error_rate_max", self.error_rate_max, defaults.error_rate_max),
            response_time_max_ms: defaults.response_time_max_ms,
        };

        if self.response_time_max_ms > 0.0 && self.response_time_max_ms.is_finite() {
            thresholds.response_time_max_ms = self.response_time_max_ms;
        } else {
            issues.push(ConfigIssue::out_of_range(
                Severity::Error,
                "monitoring.response_time_max_ms",
                self.response_time_max_ms,
                defaults.response_time_max_ms,
            ));
        }

        (thresholds, issues)
    }
}
