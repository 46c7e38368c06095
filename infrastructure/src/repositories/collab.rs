//! In-memory collaboration repository
//!
//! Collaborations are kept as snake_case [`CollabSchema`] documents and
//! rebuilt into aggregates on every read. The repository owns the
//! cross-cutting blocks (audit trail, version history, search metadata,
//! event routing) and refreshes them on each write.

use crate::mappers::collab::{
    AuditEventSchema, CollabMapper, CollabOperationSchema, CollabSchema, RoutingRuleSchema,
    VersionSchema,
};
use async_trait::async_trait;
use chrono::Utc;
use mplp_domain::collab::repository::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use mplp_domain::collab::{
    CollabEntity, CollabListQuery, CollabListResult, CollabRepository, CollabSearchQuery,
    CollabSearchResult, CollabSortField, Pagination, SortOrder,
};
use mplp_domain::core::error::RepositoryError;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

const INDEXED_FIELDS: [&str; 4] = ["name", "description", "mode", "status"];
const SUBSCRIBED_EVENTS: [&str; 2] = ["participant_status_changed", "coordination_strategy_updated"];
const PUBLISHED_EVENTS: [&str; 2] = ["collaboration_created", "collaboration_updated"];

#[derive(Default)]
pub struct InMemoryCollabRepository {
    items: RwLock<HashMap<String, CollabSchema>>,
}

impl InMemoryCollabRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored document, including repository-owned blocks
    pub async fn schema(&self, id: &str) -> Option<CollabSchema> {
        self.items.read().await.get(id).cloned()
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    fn restore(schema: &CollabSchema) -> Result<CollabEntity, RepositoryError> {
        CollabMapper::from_schema(schema)
            .map_err(|e| RepositoryError::Corrupt(format!("{}: {}", schema.collaboration_id, e)))
    }

    fn decorate_new(schema: &mut CollabSchema) {
        let id = schema.collaboration_id.clone();
        let now = Utc::now();

        schema.audit_trail.events.push(AuditEventSchema::new(
            "collaboration_created",
            &schema.created_by,
            json!({
                "collaboration_id": id,
                "mode": schema.mode,
                "participant_count": schema.participants.len(),
            }),
        ));

        schema.monitoring_integration.trace_id = Some(uuid::Uuid::new_v4().to_string());
        schema.monitoring_integration.alerting.thresholds = BTreeMap::from([
            ("max_participants".to_string(), 100.0),
            ("max_duration_hours".to_string(), 24.0),
            ("min_success_rate".to_string(), 0.8),
        ]);

        schema.version_history.versions.push(VersionSchema {
            version_id: uuid::Uuid::new_v4().to_string(),
            version_number: "1.0.0".to_string(),
            created_at: now,
            created_by: schema.created_by.clone(),
            changes: vec!["Initial creation".to_string()],
        });

        schema.search_metadata.indexed_fields = INDEXED_FIELDS.iter().map(|s| s.to_string()).collect();
        Self::refresh_search_tags(schema);

        schema.collab_operation = CollabOperationSchema::completed("create", &id);

        let events = &mut schema.event_integration;
        events.subscribed_events = SUBSCRIBED_EVENTS.iter().map(|s| s.to_string()).collect();
        events.published_events = PUBLISHED_EVENTS.iter().map(|s| s.to_string()).collect();
        events.event_routing.routing_rules = vec![RoutingRuleSchema {
            rule_id: uuid::Uuid::new_v4().to_string(),
            condition: "status == \"active\"".to_string(),
            target_topic: "active_collaborations".to_string(),
            enabled: true,
        }];
    }

    fn decorate_update(schema: &mut CollabSchema, previous: CollabSchema) {
        let id = schema.collaboration_id.clone();
        let user = schema.updated_by.clone().unwrap_or_else(|| "system".to_string());

        schema.audit_trail = previous.audit_trail;
        schema.monitoring_integration = previous.monitoring_integration;
        schema.performance_metrics = previous.performance_metrics;
        schema.version_history = previous.version_history;
        schema.search_metadata = previous.search_metadata;
        schema.event_integration = previous.event_integration;

        schema.audit_trail.events.push(AuditEventSchema::new(
            "collaboration_updated",
            &user,
            json!({ "collaboration_id": id, "status": schema.status }),
        ));

        let history = &mut schema.version_history;
        let next_minor = history
            .versions
            .last()
            .and_then(|v| v.version_number.split('.').nth(1))
            .and_then(|minor| minor.parse::<u64>().ok())
            .map_or(0, |minor| minor + 1);
        history.versions.push(VersionSchema {
            version_id: uuid::Uuid::new_v4().to_string(),
            version_number: format!("1.{}.0", next_minor),
            created_at: Utc::now(),
            created_by: user,
            changes: vec!["Updated collaboration".to_string()],
        });
        if history.versions.len() > history.max_versions {
            let excess = history.versions.len() - history.max_versions;
            history.versions.drain(..excess);
        }

        Self::refresh_search_tags(schema);
        schema.collab_operation = CollabOperationSchema::completed("update", &id);
    }

    fn refresh_search_tags(schema: &mut CollabSchema) {
        schema.search_metadata.search_tags = vec![
            schema.mode.to_string(),
            schema.status.to_string(),
            format!("participants:{}", schema.participants.len()),
        ];
    }

    fn matches_query(schema: &CollabSchema, query: &CollabListQuery) -> bool {
        query.status.is_none_or(|s| schema.status == s)
            && query.mode.is_none_or(|m| schema.mode == m)
            && query.context_id.as_deref().is_none_or(|id| schema.context_id == id)
            && query.plan_id.as_deref().is_none_or(|id| schema.plan_id == id)
            && query
                .participant_id
                .as_deref()
                .is_none_or(|id| schema.participants.iter().any(|p| p.participant_id == id))
    }

    fn matches_text(schema: &CollabSchema, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let fields = [
            Some(schema.name.as_str()),
            schema.description.as_deref(),
            Some(schema.mode.as_str()),
            Some(schema.status.as_str()),
        ];
        fields
            .into_iter()
            .flatten()
            .chain(schema.participants.iter().map(|p| p.agent_id.as_str()))
            .any(|text| text.to_lowercase().contains(needle))
    }

    fn compare(a: &CollabSchema, b: &CollabSchema, field: CollabSortField) -> Ordering {
        match field {
            CollabSortField::Name => a.name.cmp(&b.name),
            CollabSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            CollabSortField::UpdatedAt => a
                .updated_at
                .unwrap_or(a.created_at)
                .cmp(&b.updated_at.unwrap_or(b.created_at)),
            CollabSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }

    fn sorted<'a>(
        mut schemas: Vec<&'a CollabSchema>,
        field: CollabSortField,
        order: SortOrder,
    ) -> Vec<&'a CollabSchema> {
        schemas.sort_by(|a, b| {
            let ordering = Self::compare(a, b, field);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        schemas
    }
}

#[async_trait]
impl CollabRepository for InMemoryCollabRepository {
    async fn save(&self, entity: &CollabEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        if items.contains_key(entity.id()) {
            return Err(RepositoryError::AlreadyExists(format!(
                "Collaboration already exists: {}",
                entity.id()
            )));
        }
        let mut schema = CollabMapper::to_schema(entity);
        Self::decorate_new(&mut schema);
        items.insert(entity.id().to_string(), schema);
        debug!("Saved collaboration {}", entity.id());
        Ok(())
    }

    async fn update(&self, entity: &CollabEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        let Some(previous) = items.remove(entity.id()) else {
            return Err(RepositoryError::NotFound(format!(
                "Collaboration not found: {}",
                entity.id()
            )));
        };
        let mut schema = CollabMapper::to_schema(entity);
        Self::decorate_update(&mut schema, previous);
        items.insert(entity.id().to_string(), schema);
        debug!("Updated collaboration {}", entity.id());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CollabEntity>, RepositoryError> {
        self.items.read().await.get(id).map(Self::restore).transpose()
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<CollabEntity>, RepositoryError> {
        let items = self.items.read().await;
        ids.iter()
            .filter_map(|id| items.get(id))
            .map(Self::restore)
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        match self.items.write().await.remove(id) {
            Some(_) => {
                debug!("Deleted collaboration {}", id);
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("Collaboration not found: {}", id))),
        }
    }

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.items.read().await.contains_key(id))
    }

    async fn list(&self, query: &CollabListQuery) -> Result<CollabListResult, RepositoryError> {
        let query = query.clone().normalized();
        let items = self.items.read().await;
        let matching: Vec<&CollabSchema> = items
            .values()
            .filter(|s| Self::matches_query(s, &query))
            .collect();
        let total = matching.len();

        let page = Self::sorted(matching, query.sort_by, query.sort_order)
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .map(Self::restore)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CollabListResult {
            items: page,
            pagination: Pagination::new(query.page, query.limit, total),
        })
    }

    async fn search(&self, query: &CollabSearchQuery) -> Result<CollabSearchResult, RepositoryError> {
        let started = Instant::now();
        let needle = query.query.trim().to_lowercase();
        let page = query.page.max(1);
        let limit = if query.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            query.limit.min(MAX_PAGE_SIZE)
        };

        let items = self.items.read().await;
        let matching: Vec<&CollabSchema> = items
            .values()
            .filter(|s| Self::matches_text(s, &needle))
            .filter(|s| query.statuses.is_empty() || query.statuses.contains(&s.status))
            .filter(|s| query.modes.is_empty() || query.modes.contains(&s.mode))
            .filter(|s| {
                query
                    .created_between
                    .is_none_or(|(from, to)| s.created_at >= from && s.created_at <= to)
            })
            .collect();
        let total = matching.len();

        let results = Self::sorted(matching, CollabSortField::CreatedAt, SortOrder::Desc)
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .map(Self::restore)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CollabSearchResult {
            items: results,
            pagination: Pagination::new(page, limit, total),
            total_matches: total,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn count(&self, query: Option<&CollabListQuery>) -> Result<usize, RepositoryError> {
        let items = self.items.read().await;
        Ok(match query {
            Some(q) => items.values().filter(|s| Self::matches_query(s, q)).count(),
            None => items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mplp_domain::collab::{
        CollabMode, CollabParticipant, CollabStatus, CoordinationStrategy, ParticipantStatus,
    };

    fn collab(id: &str, name: &str, mode: CollabMode) -> CollabEntity {
        let mut collab = CollabEntity::new(
            id,
            "ctx-1",
            "plan-1",
            name,
            mode,
            CoordinationStrategy::default(),
            "alice",
        )
        .unwrap();
        for i in 1..=2 {
            collab
                .add_participant(
                    CollabParticipant::new(
                        format!("{id}-p{i}"),
                        format!("{id}-agent-{i}"),
                        "worker",
                        ParticipantStatus::Active,
                    ),
                    "alice",
                )
                .unwrap();
        }
        collab
    }

    #[tokio::test]
    async fn test_save_decorates_schema() {
        let repo = InMemoryCollabRepository::new();
        repo.save(&collab("c-1", "Alpha", CollabMode::Parallel)).await.unwrap();

        let schema = repo.schema("c-1").await.unwrap();
        let event = &schema.audit_trail.events[0];
        assert_eq!(event.event_type, "collaboration_created");
        assert_eq!(event.details["participant_count"], 2);
        assert!(schema.monitoring_integration.trace_id.is_some());
        assert_eq!(schema.monitoring_integration.alerting.thresholds["min_success_rate"], 0.8);
        assert_eq!(schema.version_history.versions[0].version_number, "1.0.0");
        assert_eq!(
            schema.search_metadata.search_tags,
            vec!["parallel", "draft", "participants:2"]
        );
        assert_eq!(schema.collab_operation.operation_type, "create");
        assert_eq!(schema.event_integration.event_routing.routing_rules[0].target_topic, "active_collaborations");
    }

    #[tokio::test]
    async fn test_save_rejects_duplicates() {
        let repo = InMemoryCollabRepository::new();
        let entity = collab("c-1", "Alpha", CollabMode::Parallel);
        repo.save(&entity).await.unwrap();
        assert!(matches!(
            repo.save(&entity).await,
            Err(RepositoryError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_preserves_blocks_and_versions() {
        let repo = InMemoryCollabRepository::new();
        let mut entity = collab("c-1", "Alpha", CollabMode::Parallel);
        repo.save(&entity).await.unwrap();
        let trace_id = repo.schema("c-1").await.unwrap().monitoring_integration.trace_id;

        entity.change_status(CollabStatus::Active, "bob").unwrap();
        repo.update(&entity).await.unwrap();

        let schema = repo.schema("c-1").await.unwrap();
        assert_eq!(schema.monitoring_integration.trace_id, trace_id);
        assert_eq!(schema.audit_trail.events.len(), 2);
        assert_eq!(schema.audit_trail.events[1].user_id, "bob");
        assert_eq!(schema.version_history.versions[1].version_number, "1.1.0");
        assert_eq!(schema.collab_operation.operation_type, "update");
        assert_eq!(schema.search_metadata.search_tags[1], "active");

        let loaded = repo.find_by_id("c-1").await.unwrap().unwrap();
        assert_eq!(loaded.status(), CollabStatus::Active);
        assert!(loaded.domain_events().is_empty());
    }

    #[tokio::test]
    async fn test_version_history_is_capped() {
        let repo = InMemoryCollabRepository::new();
        let mut entity = collab("c-1", "Alpha", CollabMode::Parallel);
        repo.save(&entity).await.unwrap();
        for i in 0..15 {
            entity.update_name(format!("Alpha {i}"), "bob").unwrap();
            repo.update(&entity).await.unwrap();
        }
        let versions = repo.schema("c-1").await.unwrap().version_history.versions;
        assert_eq!(versions.len(), 10);
        assert_eq!(versions[0].version_number, "1.6.0");
        assert_eq!(versions[9].version_number, "1.15.0");

        entity.update_name("Alpha final", "bob").unwrap();
        repo.update(&entity).await.unwrap();
        let versions = repo.schema("c-1").await.unwrap().version_history.versions;
        assert_eq!(versions[9].version_number, "1.16.0");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = InMemoryCollabRepository::new();
        let entity = collab("c-9", "Ghost", CollabMode::Mesh);
        assert!(repo.update(&entity).await.unwrap_err().is_not_found());
        assert!(repo.delete("c-9").await.unwrap_err().is_not_found());
        assert!(repo.find_by_id("c-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let repo = InMemoryCollabRepository::new();
        repo.save(&collab("c-1", "Charlie", CollabMode::Parallel)).await.unwrap();
        repo.save(&collab("c-2", "Alpha", CollabMode::Mesh)).await.unwrap();
        repo.save(&collab("c-3", "Bravo", CollabMode::Parallel)).await.unwrap();

        let result = repo
            .list(&CollabListQuery {
                sort_by: CollabSortField::Name,
                sort_order: SortOrder::Asc,
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<&str> = result.items.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo"]);
        assert_eq!(result.pagination.total, 3);
        assert!(result.pagination.has_more());

        let parallel = CollabListQuery {
            mode: Some(CollabMode::Parallel),
            ..Default::default()
        };
        assert_eq!(repo.count(Some(&parallel)).await.unwrap(), 2);
        assert_eq!(repo.count(None).await.unwrap(), 3);

        let by_participant = CollabListQuery {
            participant_id: Some("c-2-p1".into()),
            ..Default::default()
        };
        assert_eq!(repo.list(&by_participant).await.unwrap().items[0].id(), "c-2");
    }

    #[tokio::test]
    async fn test_search_matches_agents_and_filters() {
        let repo = InMemoryCollabRepository::new();
        repo.save(&collab("c-1", "Release train", CollabMode::Pipeline)).await.unwrap();
        repo.save(&collab("c-2", "Research", CollabMode::Mesh)).await.unwrap();

        let by_agent = repo
            .search(&CollabSearchQuery {
                query: "C-2-AGENT".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_agent.total_matches, 1);
        assert_eq!(by_agent.items[0].id(), "c-2");

        let by_mode = repo
            .search(&CollabSearchQuery {
                query: "re".into(),
                modes: vec![CollabMode::Pipeline],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_mode.items.len(), 1);
        assert_eq!(by_mode.items[0].name(), "Release train");
    }

    #[tokio::test]
    async fn test_find_by_ids_skips_missing() {
        let repo = InMemoryCollabRepository::new();
        repo.save(&collab("c-1", "Alpha", CollabMode::Hybrid)).await.unwrap();
        let found = repo
            .find_by_ids(&["c-1".to_string(), "nope".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
