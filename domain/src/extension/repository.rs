//! Extension repository trait, query filter, and statistics

use super::entities::ExtensionEntity;
use super::value_objects::{ExtensionPointType, ExtensionStatus, ExtensionType, HealthStatus};
use crate::core::error::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conjunctive filter over extensions. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionQueryFilter {
    pub context_id: Option<String>,
    pub extension_types: Vec<ExtensionType>,
    pub statuses: Vec<ExtensionStatus>,
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    /// Matches when any keyword is present
    pub keywords: Vec<String>,
    pub installed_after: Option<DateTime<Utc>>,
    pub installed_before: Option<DateTime<Utc>>,
    pub has_errors: Option<bool>,
    pub is_active: Option<bool>,
    pub health_status: Option<HealthStatus>,
    pub has_extension_point_type: Option<ExtensionPointType>,
    pub has_api_extensions: Option<bool>,
    pub has_event_subscriptions: Option<bool>,
}

impl ExtensionQueryFilter {
    pub fn for_context(context_id: impl Into<String>) -> Self {
        Self {
            context_id: Some(context_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, extension: &ExtensionEntity) -> bool {
        let data = extension.data();

        if self.context_id.as_deref().is_some_and(|c| c != data.context_id) {
            return false;
        }
        if !self.extension_types.is_empty() && !self.extension_types.contains(&data.extension_type) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&data.status) {
            return false;
        }
        if let Some(name) = &self.name
            && !data.name.to_lowercase().contains(&name.to_lowercase())
        {
            return false;
        }
        if self.version.as_deref().is_some_and(|v| v != data.version) {
            return false;
        }
        if self.author.as_deref().is_some_and(|a| a != data.metadata.author) {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| c != data.metadata.category) {
            return false;
        }
        if !self.keywords.is_empty()
            && !self
                .keywords
                .iter()
                .any(|k| data.metadata.keywords.iter().any(|dk| dk.eq_ignore_ascii_case(k)))
        {
            return false;
        }
        if self.installed_after.is_some_and(|t| data.lifecycle.install_date < t) {
            return false;
        }
        if self.installed_before.is_some_and(|t| data.lifecycle.install_date > t) {
            return false;
        }
        if self.has_errors.is_some_and(|e| e != extension.has_error()) {
            return false;
        }
        if self.is_active.is_some_and(|a| a != extension.is_active()) {
            return false;
        }
        if self
            .health_status
            .is_some_and(|h| h != data.performance_metrics.health_status)
        {
            return false;
        }
        if let Some(point_type) = self.has_extension_point_type
            && !data.extension_points.iter().any(|ep| ep.point_type == point_type)
        {
            return false;
        }
        if self
            .has_api_extensions
            .is_some_and(|h| h != !data.api_extensions.is_empty())
        {
            return false;
        }
        if self
            .has_event_subscriptions
            .is_some_and(|h| h != !data.event_subscriptions.is_empty())
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragePerformance {
    pub response_time_ms: f64,
    pub error_rate: f64,
    pub availability: f64,
    pub throughput: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSummary {
    pub extension_id: String,
    pub name: String,
    pub performance_score: f64,
    pub last_update: DateTime<Utc>,
}

/// Aggregate counts over a set of extensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionStatistics {
    pub total_extensions: usize,
    pub active_extensions: usize,
    pub inactive_extensions: usize,
    pub error_extensions: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub average_performance: AveragePerformance,
    pub top_performing: Vec<ExtensionSummary>,
    pub recently_updated: Vec<ExtensionSummary>,
}

impl ExtensionStatistics {
    /// Compute statistics over `extensions`
    pub fn compute(extensions: &[ExtensionEntity]) -> Self {
        let mut by_type: BTreeMap<String, usize> = ExtensionType::ALL
            .iter()
            .map(|t| (t.to_string(), 0))
            .collect();
        let mut by_status: BTreeMap<String, usize> = ExtensionStatus::ALL
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for ext in extensions {
            *by_type.entry(ext.extension_type().to_string()).or_default() += 1;
            *by_status.entry(ext.status().to_string()).or_default() += 1;
        }

        let count_status = |status: ExtensionStatus| extensions.iter().filter(|e| e.status() == status).count();

        let average_performance = if extensions.is_empty() {
            AveragePerformance::default()
        } else {
            let n = extensions.len() as f64;
            let sum = |f: fn(&ExtensionEntity) -> f64| extensions.iter().map(f).sum::<f64>() / n;
            AveragePerformance {
                response_time_ms: sum(|e| e.performance_metrics().execution_time_ms),
                error_rate: sum(|e| e.performance_metrics().error_rate),
                availability: sum(|e| e.performance_metrics().availability),
                throughput: sum(|e| e.performance_metrics().throughput),
            }
        };

        let summary = |e: &ExtensionEntity| ExtensionSummary {
            extension_id: e.id().to_string(),
            name: e.name().to_string(),
            performance_score: e.performance_metrics().efficiency_score,
            last_update: e.data().timestamp,
        };

        let mut ranked: Vec<&ExtensionEntity> = extensions.iter().collect();
        ranked.sort_by(|a, b| {
            b.performance_metrics()
                .efficiency_score
                .total_cmp(&a.performance_metrics().efficiency_score)
        });
        let top_performing = ranked.iter().copied().take(5).map(&summary).collect();

        ranked.sort_by(|a, b| b.data().timestamp.cmp(&a.data().timestamp));
        let recently_updated = ranked.iter().copied().take(5).map(&summary).collect();

        Self {
            total_extensions: extensions.len(),
            active_extensions: count_status(ExtensionStatus::Active),
            inactive_extensions: count_status(ExtensionStatus::Inactive),
            error_extensions: count_status(ExtensionStatus::Error),
            by_type,
            by_status,
            average_performance,
            top_performing,
            recently_updated,
        }
    }
}

/// Repository trait for extensions
#[async_trait]
pub trait ExtensionRepository: Send + Sync {
    /// Insert; fails on duplicate ID or duplicate name within the context
    async fn create(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError>;

    /// Replace an existing extension
    async fn update(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ExtensionEntity>, RepositoryError>;

    /// Returns whether anything was deleted
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn find_by_filter(
        &self,
        filter: &ExtensionQueryFilter,
    ) -> Result<Vec<ExtensionEntity>, RepositoryError>;

    async fn find_by_context(&self, context_id: &str) -> Result<Vec<ExtensionEntity>, RepositoryError>;

    async fn find_by_type(
        &self,
        extension_type: ExtensionType,
        status: Option<ExtensionStatus>,
    ) -> Result<Vec<ExtensionEntity>, RepositoryError>;

    async fn find_by_status(&self, status: ExtensionStatus) -> Result<Vec<ExtensionEntity>, RepositoryError>;

    /// Exact (case-insensitive) or substring match
    async fn find_by_name(&self, name: &str, exact: bool) -> Result<Vec<ExtensionEntity>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<ExtensionEntity>, RepositoryError>;

    async fn count(&self, filter: Option<&ExtensionQueryFilter>) -> Result<usize, RepositoryError>;

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Whether `name` is taken in `context_id`, ignoring `exclude_id`
    async fn name_exists(
        &self,
        name: &str,
        context_id: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, RepositoryError>;

    async fn statistics(
        &self,
        filter: Option<&ExtensionQueryFilter>,
    ) -> Result<ExtensionStatistics, RepositoryError>;
}
