//! Metrics source port
//!
//! Monitoring and analytics read runtime observations through this port.
//! When no observation exists, services fall back to estimates derived from
//! the collaboration's structure.

use serde::{Deserialize, Serialize};

/// Observed runtime metrics for one collaboration. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollabObservation {
    pub participant_utilization: Option<f64>,
    pub task_completion_rate: Option<f64>,
    pub quality_score: Option<f64>,
    pub response_time_ms: Option<f64>,
    pub error_rate: Option<f64>,
    pub throughput: Option<f64>,
    pub resource_utilization: Option<f64>,
}

pub trait MetricsSource: Send + Sync {
    fn observe(&self, collaboration_id: &str) -> Option<CollabObservation>;
}

/// Reports no observations
pub struct NoMetrics;

impl MetricsSource for NoMetrics {
    fn observe(&self, _collaboration_id: &str) -> Option<CollabObservation> {
        None
    }
}
