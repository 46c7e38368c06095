//! Extension management service
//!
//! Day-to-day operations on installed extensions: registration, activation
//! with dependency checks, extension points, queries, and statistics. The
//! staged install/update/rollback transaction lives in the domain's
//! [`ExtensionLifecycleManagementService`](mplp_domain::extension::ExtensionLifecycleManagementService).

use mplp_domain::core::error::{DomainError, RepositoryError};
use mplp_domain::extension::lifecycle::version_satisfies;
use mplp_domain::extension::value_objects::ExtensionConflict;
use mplp_domain::extension::{
    ApiExtension, ExtensionCompatibility, ExtensionConfiguration, ExtensionDependency, ExtensionEntity,
    ExtensionMetadata, ExtensionPoint, ExtensionQueryFilter, ExtensionRepository, ExtensionSecurity,
    ExtensionStatistics, ExtensionStatus, ExtensionType, NewExtension,
};
use mplp_domain::util::is_blank;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_EXTENSION_PAGE_SIZE: usize = 20;
pub const MAX_EXTENSION_PAGE_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum ExtensionServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Extension not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ExtensionServiceError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ExtensionServiceError::NotFound => true,
            ExtensionServiceError::Domain(e) => e.is_not_found(),
            ExtensionServiceError::Repository(e) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        match self {
            ExtensionServiceError::Validation(_) | ExtensionServiceError::Conflict(_) => true,
            ExtensionServiceError::Domain(e) => !e.is_not_found(),
            _ => false,
        }
    }
}

/// Request to register a new extension
#[derive(Debug, Clone)]
pub struct CreateExtensionRequest {
    pub context_id: String,
    pub name: String,
    pub version: String,
    pub extension_type: ExtensionType,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub configuration: Option<ExtensionConfiguration>,
    pub dependencies: Vec<ExtensionDependency>,
    pub conflicts: Vec<ExtensionConflict>,
    pub security: Option<ExtensionSecurity>,
    pub metadata: Option<ExtensionMetadata>,
}

impl CreateExtensionRequest {
    pub fn new(
        context_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        extension_type: ExtensionType,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            name: name.into(),
            version: version.into(),
            extension_type,
            display_name: None,
            description: None,
            configuration: None,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            security: None,
            metadata: None,
        }
    }

    pub fn with_dependency(mut self, dependency: ExtensionDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_conflict(mut self, conflict: ExtensionConflict) -> Self {
        self.conflicts.push(conflict);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ExtensionPage {
    pub items: Vec<ExtensionEntity>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

pub struct ExtensionManagementService {
    repository: Arc<dyn ExtensionRepository>,
    platform_version: String,
}

impl ExtensionManagementService {
    pub fn new(repository: Arc<dyn ExtensionRepository>) -> Self {
        Self {
            repository,
            platform_version: "1.0.0".to_string(),
        }
    }

    pub fn with_platform_version(mut self, version: impl Into<String>) -> Self {
        self.platform_version = version.into();
        self
    }

    async fn load(&self, extension_id: &str) -> Result<ExtensionEntity, ExtensionServiceError> {
        if is_blank(extension_id) {
            return Err(ExtensionServiceError::Validation("Extension ID is required".into()));
        }
        self.repository
            .find_by_id(extension_id)
            .await?
            .ok_or(ExtensionServiceError::NotFound)
    }

    pub async fn create_extension(
        &self,
        request: CreateExtensionRequest,
        installed_by: &str,
    ) -> Result<ExtensionEntity, ExtensionServiceError> {
        if is_blank(&request.name) {
            return Err(ExtensionServiceError::Validation("Extension name is required".into()));
        }
        if is_blank(&request.context_id) {
            return Err(ExtensionServiceError::Validation("Context ID is required".into()));
        }
        if self
            .repository
            .name_exists(&request.name, &request.context_id, None)
            .await?
        {
            return Err(ExtensionServiceError::Conflict(format!(
                "Extension name already exists: {}",
                request.name
            )));
        }

        let installed = self.repository.find_by_context(&request.context_id).await?;
        Self::check_dependencies(&installed, &request.dependencies)?;
        Self::check_conflicts(&installed, &request.conflicts)?;

        let new = NewExtension {
            extension_id: uuid::Uuid::new_v4().to_string(),
            context_id: request.context_id,
            display_name: request.display_name.unwrap_or_else(|| request.name.clone()),
            name: request.name,
            description: request.description.unwrap_or_default(),
            version: request.version,
            extension_type: request.extension_type,
            compatibility: ExtensionCompatibility {
                mplp_version: self.platform_version.clone(),
                required_modules: Vec::new(),
                dependencies: request.dependencies,
                conflicts: request.conflicts,
            },
            configuration: request.configuration.unwrap_or_default(),
            security: request.security.unwrap_or_default(),
            metadata: request.metadata.unwrap_or_default(),
        };
        let extension = ExtensionEntity::new(new, installed_by)?;
        self.repository.create(&extension).await?;
        info!("Extension created: {} ({})", extension.name(), extension.id());
        Ok(extension)
    }

    /// Required dependencies must exist in the context in a usable status
    /// and satisfy the version requirement
    fn check_dependencies(
        installed: &[ExtensionEntity],
        dependencies: &[ExtensionDependency],
    ) -> Result<(), ExtensionServiceError> {
        for dep in dependencies.iter().filter(|d| !d.optional) {
            let Some(found) = installed.iter().find(|e| e.name() == dep.name) else {
                return Err(ExtensionServiceError::Validation(format!(
                    "Dependency validation failed: {} is not installed",
                    dep.name
                )));
            };
            if !matches!(found.status(), ExtensionStatus::Active | ExtensionStatus::Installed) {
                return Err(ExtensionServiceError::Validation(format!(
                    "Dependency validation failed: {} is {}",
                    dep.name,
                    found.status()
                )));
            }
            if !version_satisfies(found.version(), &dep.version) {
                return Err(ExtensionServiceError::Validation(format!(
                    "Dependency validation failed: {} {} does not satisfy {}",
                    dep.name,
                    found.version(),
                    dep.version
                )));
            }
        }
        Ok(())
    }

    fn check_conflicts(
        installed: &[ExtensionEntity],
        conflicts: &[ExtensionConflict],
    ) -> Result<(), ExtensionServiceError> {
        match conflicts
            .iter()
            .find(|c| installed.iter().any(|e| e.name() == c.name && e.is_active()))
        {
            Some(conflict) => Err(ExtensionServiceError::Conflict(format!(
                "Extension conflict detected: {} ({})",
                conflict.name, conflict.reason
            ))),
            None => Ok(()),
        }
    }

    pub async fn get_extension_by_id(&self, extension_id: &str) -> Result<ExtensionEntity, ExtensionServiceError> {
        self.load(extension_id).await
    }

    pub async fn get_extensions_by_context(&self, context_id: &str) -> Result<Vec<ExtensionEntity>, ExtensionServiceError> {
        Ok(self.repository.find_by_context(context_id).await?)
    }

    /// Activate once every required dependency is active in the same context
    pub async fn activate_extension(
        &self,
        extension_id: &str,
        user_id: &str,
    ) -> Result<ExtensionEntity, ExtensionServiceError> {
        let mut extension = self.load(extension_id).await?;
        let siblings = self.repository.find_by_context(extension.context_id()).await?;
        let missing: Vec<&str> = extension
            .compatibility()
            .dependencies
            .iter()
            .filter(|d| !d.optional)
            .filter(|d| !siblings.iter().any(|e| e.name() == d.name && e.is_active()))
            .map(|d| d.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ExtensionServiceError::Validation(format!(
                "Unsatisfied dependencies: {}",
                missing.join(", ")
            )));
        }

        extension.activate(user_id)?;
        self.repository.update(&extension).await?;
        info!("Extension activated: {}", extension.id());
        Ok(extension)
    }

    async fn dependents_of(&self, extension: &ExtensionEntity) -> Result<Vec<ExtensionEntity>, ExtensionServiceError> {
        Ok(self
            .repository
            .find_by_context(extension.context_id())
            .await?
            .into_iter()
            .filter(|e| e.id() != extension.id())
            .filter(|e| e.compatibility().dependencies.iter().any(|d| d.name == extension.name()))
            .collect())
    }

    /// Deactivate unless another active extension depends on this one
    pub async fn deactivate_extension(
        &self,
        extension_id: &str,
        user_id: &str,
    ) -> Result<ExtensionEntity, ExtensionServiceError> {
        let mut extension = self.load(extension_id).await?;
        let active_dependents: Vec<String> = self
            .dependents_of(&extension)
            .await?
            .into_iter()
            .filter(ExtensionEntity::is_active)
            .map(|e| e.name().to_string())
            .collect();
        if !active_dependents.is_empty() {
            return Err(ExtensionServiceError::Conflict(format!(
                "Cannot deactivate: active extensions depend on it: {}",
                active_dependents.join(", ")
            )));
        }

        extension.deactivate(user_id)?;
        self.repository.update(&extension).await?;
        info!("Extension deactivated: {}", extension.id());
        Ok(extension)
    }

    pub async fn update_extension_status(
        &self,
        extension_id: &str,
        status: ExtensionStatus,
        user_id: &str,
    ) -> Result<ExtensionEntity, ExtensionServiceError> {
        let mut extension = self.load(extension_id).await?;
        extension.set_status(status, user_id);
        self.repository.update(&extension).await?;
        Ok(extension)
    }

    pub async fn add_extension_point(
        &self,
        extension_id: &str,
        point: ExtensionPoint,
        user_id: &str,
    ) -> Result<ExtensionEntity, ExtensionServiceError> {
        let mut extension = self.load(extension_id).await?;
        extension.add_extension_point(point, user_id)?;
        self.repository.update(&extension).await?;
        Ok(extension)
    }

    pub async fn add_api_extension(
        &self,
        extension_id: &str,
        api: ApiExtension,
        user_id: &str,
    ) -> Result<ExtensionEntity, ExtensionServiceError> {
        let mut extension = self.load(extension_id).await?;
        extension.add_api_extension(api, user_id)?;
        self.repository.update(&extension).await?;
        Ok(extension)
    }

    /// Filtered, paginated listing. `page` starts at 1; `limit` is clamped.
    pub async fn query_extensions(
        &self,
        filter: &ExtensionQueryFilter,
        page: usize,
        limit: usize,
    ) -> Result<ExtensionPage, ExtensionServiceError> {
        let page = page.max(1);
        let limit = if limit == 0 {
            DEFAULT_EXTENSION_PAGE_SIZE
        } else {
            limit.min(MAX_EXTENSION_PAGE_SIZE)
        };
        let all = self.repository.find_by_filter(filter).await?;
        let total = all.len();
        let items = all.into_iter().skip((page - 1) * limit).take(limit).collect();
        Ok(ExtensionPage {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    pub async fn get_active_extensions(
        &self,
        context_id: Option<&str>,
    ) -> Result<Vec<ExtensionEntity>, ExtensionServiceError> {
        let filter = ExtensionQueryFilter {
            context_id: context_id.map(str::to_string),
            statuses: vec![ExtensionStatus::Active],
            ..Default::default()
        };
        Ok(self.repository.find_by_filter(&filter).await?)
    }

    pub async fn delete_extension(&self, extension_id: &str) -> Result<(), ExtensionServiceError> {
        self.uninstall_extension(extension_id).await
    }

    /// Remove an extension that is not active and has no dependents
    pub async fn uninstall_extension(&self, extension_id: &str) -> Result<(), ExtensionServiceError> {
        let extension = self.load(extension_id).await?;
        if !extension.can_uninstall() {
            return Err(ExtensionServiceError::Conflict(format!(
                "Cannot uninstall extension in status: {}",
                extension.status()
            )));
        }
        let dependents = self.dependents_of(&extension).await?;
        if !dependents.is_empty() {
            let names: Vec<&str> = dependents.iter().map(ExtensionEntity::name).collect();
            return Err(ExtensionServiceError::Conflict(format!(
                "Cannot uninstall: other extensions depend on it: {}",
                names.join(", ")
            )));
        }
        if !self.repository.delete(extension_id).await? {
            warn!("Extension {} vanished before delete", extension_id);
            return Err(ExtensionServiceError::NotFound);
        }
        info!("Extension uninstalled: {}", extension_id);
        Ok(())
    }

    pub async fn get_statistics(&self, context_id: Option<&str>) -> Result<ExtensionStatistics, ExtensionServiceError> {
        let filter = context_id.map(ExtensionQueryFilter::for_context);
        Ok(self.repository.statistics(filter.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::FakeExtensionRepository;
    use mplp_domain::extension::ExtensionPointType;

    fn service() -> ExtensionManagementService {
        ExtensionManagementService::new(Arc::new(FakeExtensionRepository::default()))
    }

    fn request(name: &str) -> CreateExtensionRequest {
        CreateExtensionRequest::new("ctx-1", name, "1.0.0", ExtensionType::Plugin)
    }

    fn dependency(name: &str, optional: bool) -> ExtensionDependency {
        ExtensionDependency {
            name: name.into(),
            version: "^1.0.0".into(),
            optional,
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let svc = service();
        let created = svc.create_extension(request("logger"), "admin").await.unwrap();
        assert_eq!(created.status(), ExtensionStatus::Installed);
        assert_eq!(created.compatibility().mplp_version, "1.0.0");

        let err = svc.create_extension(request("logger"), "admin").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Extension name already exists: logger");

        let other_context = CreateExtensionRequest::new("ctx-2", "logger", "1.0.0", ExtensionType::Plugin);
        assert!(svc.create_extension(other_context, "admin").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_checks_dependencies_and_conflicts() {
        let svc = service();
        let err = svc
            .create_extension(request("metrics").with_dependency(dependency("core", false)), "admin")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Dependency validation failed: core is not installed");

        svc.create_extension(request("metrics").with_dependency(dependency("core", true)), "admin")
            .await
            .unwrap();

        let legacy = svc.create_extension(request("legacy"), "admin").await.unwrap();
        svc.activate_extension(legacy.id(), "admin").await.unwrap();
        let err = svc
            .create_extension(
                request("modern").with_conflict(ExtensionConflict {
                    name: "legacy".into(),
                    version: "*".into(),
                    reason: "same hooks".into(),
                }),
                "admin",
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Extension conflict detected: legacy (same hooks)");
    }

    #[tokio::test]
    async fn test_activation_requires_active_dependencies() {
        let svc = service();
        let core = svc.create_extension(request("core"), "admin").await.unwrap();
        let plugin = svc
            .create_extension(request("plugin").with_dependency(dependency("core", false)), "admin")
            .await
            .unwrap();

        let err = svc.activate_extension(plugin.id(), "admin").await.unwrap_err();
        assert_eq!(err.to_string(), "Unsatisfied dependencies: core");

        svc.activate_extension(core.id(), "admin").await.unwrap();
        let active = svc.activate_extension(plugin.id(), "admin").await.unwrap();
        assert!(active.is_active());

        let err = svc.deactivate_extension(core.id(), "admin").await.unwrap_err();
        assert!(err.to_string().contains("plugin"));

        svc.deactivate_extension(plugin.id(), "admin").await.unwrap();
        svc.deactivate_extension(core.id(), "admin").await.unwrap();
        assert!(svc.get_active_extensions(Some("ctx-1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uninstall_guards() {
        let svc = service();
        let core = svc.create_extension(request("core"), "admin").await.unwrap();
        svc.create_extension(request("plugin").with_dependency(dependency("core", false)), "admin")
            .await
            .unwrap();

        let err = svc.uninstall_extension(core.id()).await.unwrap_err();
        assert!(err.to_string().starts_with("Cannot uninstall: other extensions depend on it"));

        let solo = svc.create_extension(request("solo"), "admin").await.unwrap();
        svc.activate_extension(solo.id(), "admin").await.unwrap();
        assert!(svc.delete_extension(solo.id()).await.is_err());
        svc.deactivate_extension(solo.id(), "admin").await.unwrap();
        svc.delete_extension(solo.id()).await.unwrap();
        assert!(svc.get_extension_by_id(solo.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_extension_points_and_queries() {
        let svc = service();
        for name in ["a", "b", "c"] {
            svc.create_extension(request(name), "admin").await.unwrap();
        }
        let ext = svc.get_extensions_by_context("ctx-1").await.unwrap().remove(0);
        let point = ExtensionPoint {
            id: "on-save".into(),
            name: "On save".into(),
            point_type: ExtensionPointType::Hook,
            description: None,
            is_async: false,
            timeout_ms: None,
            execution_order: 0,
        };
        svc.add_extension_point(ext.id(), point.clone(), "admin").await.unwrap();
        let err = svc.add_extension_point(ext.id(), point, "admin").await.unwrap_err();
        assert!(err.is_validation());

        let page = svc
            .query_extensions(&ExtensionQueryFilter::for_context("ctx-1"), 2, 2)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);

        let stats = svc.get_statistics(Some("ctx-1")).await.unwrap();
        assert_eq!(stats.total_extensions, 3);

        let updated = svc
            .update_extension_status(ext.id(), ExtensionStatus::Disabled, "admin")
            .await
            .unwrap();
        assert_eq!(updated.status(), ExtensionStatus::Disabled);
    }

    #[tokio::test]
    async fn test_missing_id_is_validation() {
        let err = service().get_extension_by_id("  ").await.unwrap_err();
        assert!(err.is_validation());
    }
}
