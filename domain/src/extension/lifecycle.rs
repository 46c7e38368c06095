//! Extension lifecycle management (Domain Service)
//!
//! Installation runs as a staged transaction:
//!
//! 1. **pre-check**: security validation, dependency resolution, ID
//!    uniqueness, name uniqueness within the context, request validation
//! 2. **transaction**: create the record, then register rollback steps
//! 3. **post-validation**: the stored record exists, is `installed`, and
//!    carries the requested version
//!
//! When any stage fails, registered rollback steps run in descending
//! priority. A failing rollback step is reported and the remaining steps
//! still run.

use super::entities::{ExtensionEntity, NewExtension, is_valid_version};
use super::repository::{ExtensionQueryFilter, ExtensionRepository};
use super::value_objects::{ExtensionDependency, ExtensionStatus, PermissionLevel};
use crate::core::error::{DomainError, RepositoryError};
use crate::util::{is_blank, wire_enum};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Minimum security score for installation
pub const SECURITY_PASS_SCORE: i32 = 70;

/// Minimum compatibility score
pub const COMPATIBILITY_PASS_SCORE: i32 = 80;

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum InstallPhase {
        PreCheck => "pre_check",
        Transaction => "transaction",
        PostValidation => "post_validation",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ThreatLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Errors from lifecycle operations outside the install transaction
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Extension {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LifecycleError::NotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub id: String,
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityValidation {
    pub passed: bool,
    pub security_score: i32,
    pub threat_level: ThreatLevel,
    pub findings: Vec<SecurityFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDependency {
    pub name: String,
    pub required_version: String,
    pub resolved_version: String,
    pub extension_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyResolution {
    pub success: bool,
    pub resolved: Vec<ResolvedDependency>,
    pub missing: Vec<ExtensionDependency>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityCheck {
    pub compatible: bool,
    pub score: i32,
    pub issues: Vec<String>,
}

/// Compensating action registered during a transaction
#[derive(Debug, Clone)]
pub enum RollbackAction {
    /// Delete a record created by the transaction
    CleanupDatabase { extension_id: String },
    /// Put back the record as it was before the transaction
    RestoreRecord { previous: Box<ExtensionEntity> },
}

impl RollbackAction {
    fn label(&self) -> String {
        match self {
            RollbackAction::CleanupDatabase { extension_id } => format!("cleanup_database({})", extension_id),
            RollbackAction::RestoreRecord { previous } => format!("restore_record({})", previous.id()),
        }
    }
}

#[derive(Debug, Clone)]
struct RollbackStep {
    priority: u8,
    action: RollbackAction,
}

/// Outcome of [`ExtensionLifecycleManagementService::install_extension`]
#[derive(Debug, Clone)]
pub struct InstallationResult {
    pub success: bool,
    pub extension: Option<ExtensionEntity>,
    pub failed_phase: Option<InstallPhase>,
    pub security: Option<SecurityValidation>,
    pub dependencies: Option<DependencyResolution>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub rollback_failures: Vec<String>,
}

/// Options for [`ExtensionLifecycleManagementService::uninstall_extension`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UninstallOptions {
    pub backup_before_removal: bool,
}

#[derive(Debug, Clone)]
pub struct UninstallResult {
    pub extension_id: String,
    /// Full record as it was before removal, when a backup was requested
    pub backup: Option<ExtensionEntity>,
}

#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub previous_version: String,
    pub new_version: String,
    pub breaking: bool,
    pub extension: ExtensionEntity,
}

struct StageFailure {
    phase: InstallPhase,
    code: &'static str,
    message: String,
}

impl StageFailure {
    fn new(phase: InstallPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into(),
        }
    }
}

/// Installs, activates, updates, and removes extensions
pub struct ExtensionLifecycleManagementService {
    repository: Arc<dyn ExtensionRepository>,
    platform_version: String,
}

impl ExtensionLifecycleManagementService {
    pub fn new(repository: Arc<dyn ExtensionRepository>, platform_version: impl Into<String>) -> Self {
        Self {
            repository,
            platform_version: platform_version.into(),
        }
    }

    pub fn platform_version(&self) -> &str {
        &self.platform_version
    }

    // ==================== Install ====================

    /// Install an extension as a staged transaction with rollback
    pub async fn install_extension(&self, request: NewExtension, installed_by: &str) -> InstallationResult {
        let mut result = InstallationResult {
            success: false,
            extension: None,
            failed_phase: None,
            security: None,
            dependencies: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            rollback_failures: Vec::new(),
        };
        let mut rollback: Vec<RollbackStep> = Vec::new();

        let outcome = async {
            self.pre_check(&request, &mut result).await?;
            let created = self.run_transaction(request.clone(), installed_by, &mut rollback).await?;
            self.post_validate(&created, &request.version).await?;
            Ok::<_, StageFailure>(created)
        }
        .await;

        match outcome {
            Ok(extension) => {
                result.success = true;
                result.extension = Some(extension);
            }
            Err(failure) => {
                result
                    .errors
                    .push(format!("{}: {}", failure.code, failure.message));
                result.warnings.push(format!(
                    "Transaction failed in phase: {}",
                    failure.phase.as_str().to_uppercase()
                ));
                result.failed_phase = Some(failure.phase);
                result.rollback_failures = self.execute_rollback(rollback).await;
            }
        }
        result
    }

    async fn pre_check(
        &self,
        request: &NewExtension,
        result: &mut InstallationResult,
    ) -> Result<(), StageFailure> {
        let phase = InstallPhase::PreCheck;

        let security = Self::perform_security_validation(request);
        let passed = security.passed;
        let summary = security
            .findings
            .iter()
            .map(|f| f.description.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        result.security = Some(security);
        if !passed {
            return Err(StageFailure::new(
                phase,
                "SECURITY_VALIDATION_FAILED",
                format!("Security validation failed: {}", summary),
            ));
        }

        let dependencies = self
            .resolve_dependencies(&request.context_id, &request.compatibility.dependencies)
            .await
            .map_err(|e| StageFailure::new(phase, "DEPENDENCY_RESOLUTION_FAILED", e.to_string()))?;
        result.warnings.extend(dependencies.warnings.iter().cloned());
        let missing = dependencies
            .missing
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let resolved = dependencies.success;
        result.dependencies = Some(dependencies);
        if !resolved {
            return Err(StageFailure::new(
                phase,
                "DEPENDENCY_RESOLUTION_FAILED",
                format!("Dependency resolution failed: {}", missing),
            ));
        }

        let id_taken = self
            .repository
            .exists(&request.extension_id)
            .await
            .map_err(|e| StageFailure::new(phase, "EXTENSION_ID_CONFLICT", e.to_string()))?;
        if id_taken {
            return Err(StageFailure::new(
                phase,
                "EXTENSION_ID_CONFLICT",
                format!("Extension ID '{}' already exists", request.extension_id),
            ));
        }

        let taken = self
            .repository
            .name_exists(&request.name, &request.context_id, None)
            .await
            .map_err(|e| StageFailure::new(phase, "NAME_CONFLICT", e.to_string()))?;
        if taken {
            return Err(StageFailure::new(
                phase,
                "NAME_CONFLICT",
                format!("Extension name '{}' already exists", request.name),
            ));
        }

        Self::validate_request(request)
            .map_err(|e| StageFailure::new(phase, "SCHEMA_VALIDATION_FAILED", format!("Schema validation failed: {}", e)))
    }

    async fn run_transaction(
        &self,
        request: NewExtension,
        installed_by: &str,
        rollback: &mut Vec<RollbackStep>,
    ) -> Result<ExtensionEntity, StageFailure> {
        let phase = InstallPhase::Transaction;
        let extension = ExtensionEntity::new(request, installed_by)
            .map_err(|e| StageFailure::new(phase, "ENTITY_CREATION_FAILED", e.to_string()))?;

        self.repository
            .create(&extension)
            .await
            .map_err(|e| StageFailure::new(phase, "DATABASE_WRITE_FAILED", e.to_string()))?;
        // Only a record this transaction wrote may be cleaned up
        rollback.push(RollbackStep {
            priority: 100,
            action: RollbackAction::CleanupDatabase {
                extension_id: extension.id().to_string(),
            },
        });
        Ok(extension)
    }

    async fn post_validate(&self, created: &ExtensionEntity, version: &str) -> Result<(), StageFailure> {
        let phase = InstallPhase::PostValidation;
        let stored = self
            .repository
            .find_by_id(created.id())
            .await
            .map_err(|e| StageFailure::new(phase, "POST_VALIDATION_FAILED", e.to_string()))?
            .ok_or_else(|| {
                StageFailure::new(phase, "POST_VALIDATION_FAILED", "Extension was not persisted")
            })?;
        if stored.status() != ExtensionStatus::Installed {
            return Err(StageFailure::new(
                phase,
                "POST_VALIDATION_FAILED",
                format!("Unexpected status after install: {}", stored.status()),
            ));
        }
        if stored.version() != version {
            return Err(StageFailure::new(
                phase,
                "POST_VALIDATION_FAILED",
                format!("Version mismatch: expected {}, found {}", version, stored.version()),
            ));
        }
        Ok(())
    }

    /// Run rollback steps, highest priority first. Returns the failures.
    async fn execute_rollback(&self, mut steps: Vec<RollbackStep>) -> Vec<String> {
        steps.sort_by(|a, b| b.priority.cmp(&a.priority));
        let mut failures = Vec::new();
        for step in steps {
            let outcome = match &step.action {
                RollbackAction::CleanupDatabase { extension_id } => {
                    self.repository.delete(extension_id).await.map(|_| ())
                }
                RollbackAction::RestoreRecord { previous } => self.repository.update(previous).await,
            };
            if let Err(e) = outcome {
                failures.push(format!("Rollback step {} failed: {}", step.action.label(), e));
            }
        }
        failures
    }

    // ==================== Checks ====================

    /// Score the declared security posture of an install request
    pub fn perform_security_validation(request: &NewExtension) -> SecurityValidation {
        let mut score = 100;
        let mut findings = Vec::new();
        let security = &request.security;

        if !security.sandbox_enabled {
            score -= 30;
            findings.push(SecurityFinding {
                id: "SANDBOX_DISABLED".into(),
                severity: "high".into(),
                description: "Extension runs without sandbox isolation".into(),
            });
        }
        if security.code_signing.required && !security.code_signing.verified {
            score -= 20;
            findings.push(SecurityFinding {
                id: "UNVERIFIED_SIGNATURE".into(),
                severity: "medium".into(),
                description: "Code signature is required but not verified".into(),
            });
        }
        for (group, level) in security.permissions.levels() {
            if level == PermissionLevel::Full {
                score -= 10;
                findings.push(SecurityFinding {
                    id: format!("EXCESSIVE_{}_PERMISSION", group.to_uppercase()),
                    severity: "low".into(),
                    description: format!("Unrestricted {} access requested", group),
                });
            }
        }

        let threat_level = match score {
            s if s >= 80 => ThreatLevel::Low,
            s if s >= 60 => ThreatLevel::Medium,
            _ => ThreatLevel::High,
        };
        SecurityValidation {
            passed: score >= SECURITY_PASS_SCORE,
            security_score: score,
            threat_level,
            findings,
        }
    }

    /// Resolve declared dependencies against extensions in the same context
    pub async fn resolve_dependencies(
        &self,
        context_id: &str,
        dependencies: &[ExtensionDependency],
    ) -> Result<DependencyResolution, RepositoryError> {
        let installed = self
            .repository
            .find_by_filter(&ExtensionQueryFilter::for_context(context_id))
            .await?;

        let mut resolution = DependencyResolution::default();
        for dep in dependencies {
            let found = installed
                .iter()
                .find(|e| e.name() == dep.name && version_satisfies(e.version(), &dep.version));
            match found {
                Some(ext) => resolution.resolved.push(ResolvedDependency {
                    name: dep.name.clone(),
                    required_version: dep.version.clone(),
                    resolved_version: ext.version().to_string(),
                    extension_id: ext.id().to_string(),
                }),
                None if dep.optional => resolution
                    .warnings
                    .push(format!("Optional dependency '{}' is not installed", dep.name)),
                None => resolution.missing.push(dep.clone()),
            }
        }
        resolution.success = resolution.missing.is_empty();
        Ok(resolution)
    }

    /// Score compatibility with `platform_version`
    pub fn validate_compatibility(extension: &ExtensionEntity, platform_version: &str) -> CompatibilityCheck {
        let mut score = 100;
        let mut issues = Vec::new();
        let compat = extension.compatibility();

        if compat.mplp_version != platform_version {
            score -= 20;
            issues.push(format!(
                "MPLP version mismatch: expected {}, found {}",
                compat.mplp_version, platform_version
            ));
        }
        for conflict in &compat.conflicts {
            score -= 30;
            issues.push(format!(
                "Conflicts with {} {}: {}",
                conflict.name, conflict.version, conflict.reason
            ));
        }
        CompatibilityCheck {
            compatible: score >= COMPATIBILITY_PASS_SCORE,
            score,
            issues,
        }
    }

    fn validate_request(request: &NewExtension) -> Result<(), DomainError> {
        if is_blank(&request.extension_id) {
            return Err(DomainError::validation("extension_id is required"));
        }
        if is_blank(&request.context_id) {
            return Err(DomainError::validation("context_id is required"));
        }
        if is_blank(&request.name) {
            return Err(DomainError::validation("name is required"));
        }
        if !is_valid_version(&request.version) {
            return Err(DomainError::validation(format!(
                "Invalid version format: {}",
                request.version
            )));
        }
        if is_blank(&request.compatibility.mplp_version) {
            return Err(DomainError::validation("compatibility.mplp_version is required"));
        }
        Ok(())
    }

    // ==================== Other operations ====================

    async fn load(&self, id: &str) -> Result<ExtensionEntity, LifecycleError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    pub async fn activate_extension(&self, id: &str, user_id: &str) -> Result<ExtensionEntity, LifecycleError> {
        let mut extension = self.load(id).await?;
        extension.activate(user_id)?;
        self.repository.update(&extension).await?;
        Ok(extension)
    }

    pub async fn deactivate_extension(&self, id: &str, user_id: &str) -> Result<ExtensionEntity, LifecycleError> {
        let mut extension = self.load(id).await?;
        extension.deactivate(user_id)?;
        self.repository.update(&extension).await?;
        Ok(extension)
    }

    /// Remove an extension. Active extensions must be deactivated first.
    pub async fn uninstall_extension(
        &self,
        id: &str,
        options: UninstallOptions,
        user_id: &str,
    ) -> Result<UninstallResult, LifecycleError> {
        let mut extension = self.load(id).await?;
        let backup = options.backup_before_removal.then(|| extension.clone());
        extension.mark_for_uninstall(user_id)?;
        self.repository.delete(id).await?;
        Ok(UninstallResult {
            extension_id: id.to_string(),
            backup,
        })
    }

    /// Move to `new_version`, restoring the previous record if the write
    /// cannot be verified
    pub async fn update_extension(
        &self,
        id: &str,
        new_version: &str,
        changelog: &str,
        user_id: &str,
    ) -> Result<UpdateResult, LifecycleError> {
        let previous = self.load(id).await?;
        let mut extension = previous.clone();
        let breaking = extension.update_version(new_version, changelog, user_id)?;
        self.repository.update(&extension).await?;

        let stored = self.repository.find_by_id(id).await?;
        if stored.as_ref().map(ExtensionEntity::version) != Some(new_version) {
            let failures = self
                .execute_rollback(vec![RollbackStep {
                    priority: 100,
                    action: RollbackAction::RestoreRecord {
                        previous: Box::new(previous),
                    },
                }])
                .await;
            return Err(RepositoryError::Storage(format!(
                "Update of {} could not be verified{}",
                id,
                if failures.is_empty() { String::new() } else { format!("; {}", failures.join("; ")) }
            ))
            .into());
        }

        Ok(UpdateResult {
            previous_version: previous.version().to_string(),
            new_version: new_version.to_string(),
            breaking,
            extension,
        })
    }

    /// Return to a version recorded in the extension's history
    pub async fn rollback_extension(
        &self,
        id: &str,
        target_version: &str,
        user_id: &str,
    ) -> Result<ExtensionEntity, LifecycleError> {
        let mut extension = self.load(id).await?;
        let known = extension
            .version_history()
            .iter()
            .any(|v| v.version == target_version || v.previous_version == target_version);
        if !known {
            return Err(DomainError::not_found(format!(
                "Version {} not found in history of {}",
                target_version, id
            ))
            .into());
        }
        extension.update_version(target_version, "rollback", user_id)?;
        self.repository.update(&extension).await?;
        Ok(extension)
    }
}

/// Accepts exact versions, `*`, and `^`/`~`/`>=` prefixed ranges (major match
/// for `^`, major.minor match for `~`, numeric comparison for `>=`)
pub fn version_satisfies(installed: &str, requirement: &str) -> bool {
    let requirement = requirement.trim();
    if requirement.is_empty() || requirement == "*" {
        return true;
    }
    let parse = |v: &str| -> Option<(u64, u64, u64)> {
        let core = v.split(['-', '+']).next()?;
        let mut parts = core.split('.').map(|p| p.parse::<u64>().ok());
        Some((parts.next()??, parts.next()??, parts.next()??))
    };
    let Some(have) = parse(installed) else {
        return false;
    };
    if let Some(rest) = requirement.strip_prefix(">=") {
        return parse(rest.trim()).is_some_and(|want| have >= want);
    }
    if let Some(rest) = requirement.strip_prefix('^') {
        return parse(rest).is_some_and(|want| have.0 == want.0 && have >= want);
    }
    if let Some(rest) = requirement.strip_prefix('~') {
        return parse(rest).is_some_and(|want| have.0 == want.0 && have.1 == want.1 && have >= want);
    }
    parse(requirement).is_some_and(|want| have == want)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::repository::ExtensionStatistics;
    use crate::extension::value_objects::{
        ExtensionCompatibility, ExtensionConfiguration, ExtensionConflict, ExtensionMetadata,
        ExtensionSecurity, ExtensionType,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Map-backed repository; `hide_reads`/`fail_delete` inject errors
    #[derive(Default)]
    struct FakeRepository {
        items: Mutex<HashMap<String, ExtensionEntity>>,
        hide_reads: bool,
        fail_delete: bool,
    }

    impl FakeRepository {
        fn len(&self) -> usize {
            self.items.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ExtensionRepository for FakeRepository {
        async fn create(&self, extension: &ExtensionEntity) -> Result<(), RepositoryError> {
            let mut items = self.items.lock().unwrap();
            if items.contains_key(extension.id()) {
                return Err(RepositoryError::AlreadyExists(format!(
                    "Extension already exists: {}",
                    extension.id()
                )));
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
            if self.hide_reads {
                return Ok(None);
            }
            Ok(self.items.lock().unwrap().get(id).cloned())
        }

        async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
            if self.fail_delete {
                return Err(RepositoryError::Storage("locked".into()));
            }
            Ok(self.items.lock().unwrap().remove(id).is_some())
        }

        async fn find_by_filter(&self, filter: &ExtensionQueryFilter) -> Result<Vec<ExtensionEntity>, RepositoryError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .values()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect())
        }

        async fn find_by_context(&self, context_id: &str) -> Result<Vec<ExtensionEntity>, RepositoryError> {
            self.find_by_filter(&ExtensionQueryFilter::for_context(context_id)).await
        }

        async fn find_by_type(
            &self,
            _extension_type: ExtensionType,
            _status: Option<ExtensionStatus>,
        ) -> Result<Vec<ExtensionEntity>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_by_status(&self, _status: ExtensionStatus) -> Result<Vec<ExtensionEntity>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_by_name(&self, _name: &str, _exact: bool) -> Result<Vec<ExtensionEntity>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_all(&self) -> Result<Vec<ExtensionEntity>, RepositoryError> {
            Ok(self.items.lock().unwrap().values().cloned().collect())
        }

        async fn count(&self, _filter: Option<&ExtensionQueryFilter>) -> Result<usize, RepositoryError> {
            Ok(self.len())
        }

        async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
            Ok(self.items.lock().unwrap().contains_key(id))
        }

        async fn name_exists(
            &self,
            name: &str,
            context_id: &str,
            exclude_id: Option<&str>,
        ) -> Result<bool, RepositoryError> {
            Ok(self.items.lock().unwrap().values().any(|e| {
                e.name() == name && e.context_id() == context_id && Some(e.id()) != exclude_id
            }))
        }

        async fn statistics(&self, _filter: Option<&ExtensionQueryFilter>) -> Result<ExtensionStatistics, RepositoryError> {
            Ok(ExtensionStatistics::default())
        }
    }

    fn request(name: &str) -> NewExtension {
        NewExtension {
            extension_id: format!("ext-{name}"),
            context_id: "ctx-1".into(),
            name: name.into(),
            display_name: String::new(),
            description: String::new(),
            version: "1.0.0".into(),
            extension_type: ExtensionType::Plugin,
            compatibility: ExtensionCompatibility::default(),
            configuration: ExtensionConfiguration::default(),
            security: ExtensionSecurity::default(),
            metadata: ExtensionMetadata::default(),
        }
    }

    fn service(repo: Arc<FakeRepository>) -> ExtensionLifecycleManagementService {
        ExtensionLifecycleManagementService::new(repo, "1.0.0")
    }

    #[tokio::test]
    async fn test_install_success() {
        let repo = Arc::new(FakeRepository::default());
        let result = service(repo.clone()).install_extension(request("cache"), "u").await;
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(repo.len(), 1);
        assert_eq!(result.security.unwrap().threat_level, ThreatLevel::Low);
    }

    #[tokio::test]
    async fn test_install_rejects_disabled_sandbox_with_full_permissions() {
        let repo = Arc::new(FakeRepository::default());
        let mut req = request("risky");
        req.security.sandbox_enabled = false;
        req.security.permissions.network = PermissionLevel::Full;
        let result = service(repo.clone()).install_extension(req, "u").await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(InstallPhase::PreCheck));
        assert!(result.errors[0].starts_with("SECURITY_VALIDATION_FAILED"));
        assert!(result.warnings.contains(&"Transaction failed in phase: PRE_CHECK".to_string()));
        assert_eq!(repo.len(), 0);
    }

    #[test]
    fn test_security_score_bands() {
        let mut req = request("x");
        req.security.sandbox_enabled = false;
        let v = ExtensionLifecycleManagementService::perform_security_validation(&req);
        assert_eq!(v.security_score, 70);
        assert!(v.passed);
        assert_eq!(v.threat_level, ThreatLevel::Medium);
    }

    #[tokio::test]
    async fn test_install_name_conflict() {
        let repo = Arc::new(FakeRepository::default());
        let svc = service(repo.clone());
        assert!(svc.install_extension(request("dup"), "u").await.success);

        let mut again = request("dup");
        again.extension_id = "ext-other".into();
        let result = svc.install_extension(again, "u").await;
        assert!(!result.success);
        assert!(result.errors[0].contains("already exists"));
    }

    #[tokio::test]
    async fn test_install_missing_required_dependency() {
        let repo = Arc::new(FakeRepository::default());
        let svc = service(repo.clone());
        let mut req = request("reporting");
        req.compatibility.dependencies = vec![
            ExtensionDependency {
                name: "core-db".into(),
                version: "^1.0.0".into(),
                optional: false,
                reason: None,
            },
            ExtensionDependency {
                name: "charts".into(),
                version: "*".into(),
                optional: true,
                reason: None,
            },
        ];
        let result = svc.install_extension(req.clone(), "u").await;
        assert!(!result.success);
        assert_eq!(result.dependencies.unwrap().missing.len(), 1);

        assert!(svc.install_extension(request("core-db"), "u").await.success);
        let result = svc.install_extension(req, "u").await;
        assert!(result.success, "{:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.contains("charts")));
    }

    #[tokio::test]
    async fn test_unverified_write_rolls_back() {
        let repo = Arc::new(FakeRepository {
            hide_reads: true,
            ..Default::default()
        });
        let result = service(repo.clone()).install_extension(request("broken"), "u").await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(InstallPhase::PostValidation));
        assert!(result.rollback_failures.is_empty());
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_rollback_failure_is_reported() {
        let repo = Arc::new(FakeRepository {
            hide_reads: true,
            fail_delete: true,
            ..Default::default()
        });
        let result = service(repo.clone()).install_extension(request("sticky"), "u").await;
        assert!(!result.success);
        assert_eq!(result.rollback_failures.len(), 1);
    }

    #[tokio::test]
    async fn test_install_reusing_id_keeps_existing_record() {
        let repo = Arc::new(FakeRepository::default());
        let svc = service(repo.clone());
        let mut first = request("alpha");
        first.extension_id = "ext-1".into();
        assert!(svc.install_extension(first, "u").await.success);

        let mut second = request("beta");
        second.extension_id = "ext-1".into();
        let result = svc.install_extension(second, "u").await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(InstallPhase::PreCheck));
        assert!(result.errors[0].starts_with("EXTENSION_ID_CONFLICT"));

        let kept = repo.find_by_id("ext-1").await.unwrap().unwrap();
        assert_eq!(kept.name(), "alpha");
    }

    #[tokio::test]
    async fn test_uninstall_requires_inactive() {
        let repo = Arc::new(FakeRepository::default());
        let svc = service(repo.clone());
        svc.install_extension(request("tool"), "u").await;
        svc.activate_extension("ext-tool", "u").await.unwrap();

        let err = svc
            .uninstall_extension("ext-tool", UninstallOptions::default(), "u")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Domain(_)));

        svc.deactivate_extension("ext-tool", "u").await.unwrap();
        let result = svc
            .uninstall_extension("ext-tool", UninstallOptions { backup_before_removal: true }, "u")
            .await
            .unwrap();
        assert!(result.backup.is_some());
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_update_and_rollback() {
        let repo = Arc::new(FakeRepository::default());
        let svc = service(repo.clone());
        svc.install_extension(request("fmt"), "u").await;

        let update = svc.update_extension("ext-fmt", "2.0.0", "major", "u").await.unwrap();
        assert!(update.breaking);
        assert_eq!(update.previous_version, "1.0.0");

        let rolled = svc.rollback_extension("ext-fmt", "1.0.0", "u").await.unwrap();
        assert_eq!(rolled.version(), "1.0.0");
        assert!(svc.rollback_extension("ext-fmt", "0.1.0", "u").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_extension_is_not_found() {
        let svc = service(Arc::new(FakeRepository::default()));
        let err = svc.activate_extension("nope", "u").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Extension nope not found");
    }

    #[test]
    fn test_validate_compatibility_scoring() {
        let mut req = request("c");
        req.compatibility.conflicts.push(ExtensionConflict {
            name: "legacy".into(),
            version: "0.9.0".into(),
            reason: "hooks clash".into(),
        });
        let ext = ExtensionEntity::new(req, "u").unwrap();
        let check = ExtensionLifecycleManagementService::validate_compatibility(&ext, "1.0.0");
        assert_eq!(check.score, 70);
        assert!(!check.compatible);

        let ext = ExtensionEntity::new(request("d"), "u").unwrap();
        let check = ExtensionLifecycleManagementService::validate_compatibility(&ext, "1.1.0");
        assert_eq!(check.score, 80);
        assert!(check.compatible);
    }

    #[test]
    fn test_version_satisfies() {
        assert!(version_satisfies("1.4.2", "^1.2.0"));
        assert!(!version_satisfies("2.0.0", "^1.2.0"));
        assert!(version_satisfies("1.2.9", "~1.2.0"));
        assert!(!version_satisfies("1.3.0", "~1.2.0"));
        assert!(version_satisfies("3.0.0", ">= 2.0.0"));
        assert!(version_satisfies("1.0.0", "1.0.0"));
        assert!(version_satisfies("0.0.1", "*"));
        assert!(!version_satisfies("garbage", "1.0.0"));
    }
}
