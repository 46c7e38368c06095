//! Map-backed repositories for service tests

use async_trait::async_trait;
use mplp_domain::collab::{
    CollabEntity, CollabListQuery, CollabListResult, CollabMode, CollabParticipant,
    CollabRepository, CollabSearchQuery, CollabSearchResult, CoordinationStrategy, Pagination,
    ParticipantStatus,
};
use mplp_domain::core::error::RepositoryError;
use mplp_domain::extension::{
    ExtensionCompatibility, ExtensionConfiguration, ExtensionEntity, ExtensionMetadata,
    ExtensionQueryFilter, ExtensionRepository, ExtensionSecurity, ExtensionStatistics,
    ExtensionStatus, ExtensionType, NewExtension,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeCollabRepository {
    items: Mutex<HashMap<String, CollabEntity>>,
}

impl FakeCollabRepository {
    fn filtered(&self, query: &CollabListQuery) -> Vec<CollabEntity> {
        let mut items: Vec<CollabEntity> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|c| query.status.is_none_or(|s| c.status() == s))
            .filter(|c| query.mode.is_none_or(|m| c.mode() == m))
            .filter(|c| query.context_id.as_deref().is_none_or(|id| c.context_id() == id))
            .filter(|c| query.plan_id.as_deref().is_none_or(|id| c.plan_id() == id))
            .filter(|c| {
                query
                    .participant_id
                    .as_deref()
                    .is_none_or(|id| c.participant(id).is_some())
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()));
        items
    }
}

#[async_trait]
impl CollabRepository for FakeCollabRepository {
    async fn save(&self, entity: &CollabEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.lock().unwrap();
        if items.contains_key(entity.id()) {
            return Err(RepositoryError::AlreadyExists(entity.id().to_string()));
        }
        items.insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &CollabEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.lock().unwrap();
        if !items.contains_key(entity.id()) {
            return Err(RepositoryError::NotFound(entity.id().to_string()));
        }
        items.insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CollabEntity>, RepositoryError> {
        Ok(self.items.lock().unwrap().get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<CollabEntity>, RepositoryError> {
        let items = self.items.lock().unwrap();
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.items
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.items.lock().unwrap().contains_key(id))
    }

    async fn list(&self, query: &CollabListQuery) -> Result<CollabListResult, RepositoryError> {
        let query = query.clone().normalized();
        let all = self.filtered(&query);
        let pagination = Pagination::new(query.page, query.limit, all.len());
        let items = all.into_iter().skip(query.offset()).take(query.limit).collect();
        Ok(CollabListResult { items, pagination })
    }

    async fn search(&self, query: &CollabSearchQuery) -> Result<CollabSearchResult, RepositoryError> {
        let needle = query.query.to_lowercase();
        let matches: Vec<CollabEntity> = self
            .filtered(&CollabListQuery::default())
            .into_iter()
            .filter(|c| c.name().to_lowercase().contains(&needle))
            .collect();
        let total = matches.len();
        Ok(CollabSearchResult {
            items: matches,
            pagination: Pagination::new(1, total.max(1), total),
            total_matches: total,
            execution_time_ms: 0,
        })
    }

    async fn count(&self, query: Option<&CollabListQuery>) -> Result<usize, RepositoryError> {
        Ok(match query {
            Some(q) => self.filtered(q).len(),
            None => self.items.lock().unwrap().len(),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeExtensionRepository {
    items: Mutex<HashMap<String, ExtensionEntity>>,
}

#[async_trait]
impl ExtensionRepository for FakeExtensionRepository {
    async fn create(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.lock().unwrap();
        if items.contains_key(extension.id()) {
            return Err(RepositoryError::AlreadyExists(extension.id().to_string()));
        }
        items.insert(extension.id().to_string(), extension.clone());
        Ok(())
    }

    async fn update(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError> {
        self.items
            .lock()
            .unwrap()
            .insert(extension.id().to_string(), extension.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ExtensionEntity>, RepositoryError> {
        Ok(self.items.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.items.lock().unwrap().remove(id).is_some())
    }

    async fn find_by_filter(&self, filter: &ExtensionQueryFilter) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        let mut found: Vec<ExtensionEntity> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(found)
    }

    async fn find_by_context(&self, context_id: &str) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        self.find_by_filter(&ExtensionQueryFilter::for_context(context_id)).await
    }

    async fn find_by_type(
        &self,
        extension_type: ExtensionType,
        status: Option<ExtensionStatus>,
    ) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        self.find_by_filter(&ExtensionQueryFilter {
            extension_types: vec![extension_type],
            statuses: status.into_iter().collect(),
            ..Default::default()
        })
        .await
    }

    async fn find_by_status(&self, status: ExtensionStatus) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        self.find_by_filter(&ExtensionQueryFilter {
            statuses: vec![status],
            ..Default::default()
        })
        .await
    }

    async fn find_by_name(&self, name: &str, exact: bool) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        let all = self.find_all().await?;
        Ok(all
            .into_iter()
            .filter(|e| {
                if exact {
                    e.name().eq_ignore_ascii_case(name)
                } else {
                    e.name().to_lowercase().contains(&name.to_lowercase())
                }
            })
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        self.find_by_filter(&ExtensionQueryFilter::default()).await
    }

    async fn count(&self, filter: Option<&ExtensionQueryFilter>) -> Result<usize, RepositoryError> {
        let filter = filter.cloned().unwrap_or_default();
        Ok(self.find_by_filter(&filter).await?.len())
    }

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.items.lock().unwrap().contains_key(id))
    }

    async fn name_exists(&self, name: &str, context_id: &str, exclude_id: Option<&str>) -> Result<bool, RepositoryError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .any(|e| e.name() == name && e.context_id() == context_id && Some(e.id()) != exclude_id))
    }

    async fn statistics(&self, filter: Option<&ExtensionQueryFilter>) -> Result<ExtensionStatistics, RepositoryError> {
        let filter = filter.cloned().unwrap_or_default();
        Ok(ExtensionStatistics::compute(&self.find_by_filter(&filter).await?))
    }
}

/// Collaboration with `n` participants, all `status`
pub(crate) fn collab_with(
    id: &str,
    mode: CollabMode,
    strategy: CoordinationStrategy,
    n: usize,
    status: ParticipantStatus,
) -> CollabEntity {
    let mut collab = CollabEntity::new(id, "ctx-1", "plan-1", format!("collab {id}"), mode, strategy, "tester").unwrap();
    for i in 0..n {
        collab
            .add_participant(
                CollabParticipant::new(format!("p-{i}"), format!("agent-{i}"), "worker", status)
                    .with_capabilities([format!("skill-{i}")]),
                "tester",
            )
            .unwrap();
    }
    collab.clear_domain_events();
    collab
}

pub(crate) fn new_extension(name: &str, context_id: &str) -> NewExtension {
    NewExtension {
        extension_id: format!("ext-{name}"),
        context_id: context_id.into(),
        name: name.into(),
        display_name: name.into(),
        description: String::new(),
        version: "1.0.0".into(),
        extension_type: ExtensionType::Plugin,
        compatibility: ExtensionCompatibility::default(),
        configuration: ExtensionConfiguration::default(),
        security: ExtensionSecurity::default(),
        metadata: ExtensionMetadata::default(),
    }
}
