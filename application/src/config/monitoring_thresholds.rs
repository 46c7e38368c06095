//! Thresholds that raise monitoring alerts.

use serde::{Deserialize, Serialize};

/// Lower bounds (`*_min`) and upper bounds (`*_max`) for collaboration
/// metrics. A metric outside its bound raises an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringThresholds {
    pub participant_utilization_min: f64,
    pub coordination_efficiency_min: f64,
    pub decision_making_speed_min: f64,
    pub task_completion_rate_min: f64,
    pub quality_score_min: f64,
    pub response_time_max_ms: f64,
    pub error_rate_max: f64,
}

impl Default for MonitoringThresholds {
    fn default() -> Self {
        Self {
            participant_utilization_min: 0.7,
            coordination_efficiency_min: 0.6,
            decision_making_speed_min: 0.5,
            task_completion_rate_min: 0.8,
            quality_score_min: 0.75,
            response_time_max_ms: 5000.0,
            error_rate_max: 0.05,
        }
    }
}
