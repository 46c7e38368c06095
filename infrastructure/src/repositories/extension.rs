//! In-memory extension repository

use async_trait::async_trait;
use mplp_domain::core::error::RepositoryError;
use mplp_domain::extension::{
    ExtensionEntity, ExtensionQueryFilter, ExtensionRepository, ExtensionStatistics,
    ExtensionStatus, ExtensionType,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemoryExtensionRepository {
    items: RwLock<HashMap<String, ExtensionEntity>>,
}

impl InMemoryExtensionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    /// Matching extensions ordered by name, then ID
    async fn matching<F>(&self, predicate: F) -> Vec<ExtensionEntity>
    where
        F: Fn(&ExtensionEntity) -> bool,
    {
        let mut found: Vec<ExtensionEntity> = self
            .items
            .read()
            .await
            .values()
            .filter(|e| predicate(*e))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        found
    }
}

#[async_trait]
impl ExtensionRepository for InMemoryExtensionRepository {
    async fn create(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        if items.contains_key(extension.id()) {
            return Err(RepositoryError::AlreadyExists(format!(
                "Extension already exists: {}",
                extension.id()
            )));
        }
        if items
            .values()
            .any(|e| e.context_id() == extension.context_id() && e.name() == extension.name())
        {
            return Err(RepositoryError::AlreadyExists(format!(
                "Extension name already exists: {}",
                extension.name()
            )));
        }
        items.insert(extension.id().to_string(), extension.clone());
        debug!("Created extension {} ({})", extension.name(), extension.id());
        Ok(())
    }

    async fn update(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        match items.get_mut(extension.id()) {
            Some(slot) => {
                *slot = extension.clone();
                debug!("Updated extension {}", extension.id());
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!(
                "Extension not found: {}",
                extension.id()
            ))),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ExtensionEntity>, RepositoryError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let removed = self.items.write().await.remove(id).is_some();
        if removed {
            debug!("Deleted extension {}", id);
        }
        Ok(removed)
    }

    async fn find_by_filter(
        &self,
        filter: &ExtensionQueryFilter,
    ) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        Ok(self.matching(|e| filter.matches(e)).await)
    }

    async fn find_by_context(&self, context_id: &str) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        Ok(self.matching(|e| e.context_id() == context_id).await)
    }

    async fn find_by_type(
        &self,
        extension_type: ExtensionType,
        status: Option<ExtensionStatus>,
    ) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        Ok(self
            .matching(|e| e.extension_type() == extension_type && status.is_none_or(|s| e.status() == s))
            .await)
    }

    async fn find_by_status(&self, status: ExtensionStatus) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        Ok(self.matching(|e| e.status() == status).await)
    }

    async fn find_by_name(&self, name: &str, exact: bool) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        let needle = name.to_lowercase();
        Ok(self
            .matching(|e| {
                let candidate = e.name().to_lowercase();
                if exact {
                    candidate == needle
                } else {
                    candidate.contains(&needle)
                }
            })
            .await)
    }

    async fn find_all(&self) -> Result<Vec<ExtensionEntity>, RepositoryError> {
        Ok(self.matching(|_| true).await)
    }

    async fn count(&self, filter: Option<&ExtensionQueryFilter>) -> Result<usize, RepositoryError> {
        let items = self.items.read().await;
        Ok(match filter {
            Some(f) => items.values().filter(|e| f.matches(e)).count(),
            None => items.len(),
        })
    }

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.items.read().await.contains_key(id))
    }

    async fn name_exists(
        &self,
        name: &str,
        context_id: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.items.read().await.values().any(|e| {
            e.name() == name && e.context_id() == context_id && Some(e.id()) != exclude_id
        }))
    }

    async fn statistics(
        &self,
        filter: Option<&ExtensionQueryFilter>,
    ) -> Result<ExtensionStatistics, RepositoryError> {
        let matching = match filter {
            Some(f) => self.find_by_filter(f).await?,
            None => self.find_all().await?,
        };
        Ok(ExtensionStatistics::compute(&matching))
    }
}
