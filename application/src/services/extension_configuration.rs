//! Extension configuration management
//!
//! Validates, updates, backs up, and rolls back the `current_config` of
//! stored extensions. Backups and change history are kept in memory per
//! extension; the configuration itself is written through the repository.

use crate::config::ExtensionPolicy;
use chrono::{DateTime, Duration, Utc};
use mplp_domain::core::error::{DomainError, RepositoryError};
use mplp_domain::extension::{ExtensionConfiguration, ExtensionEntity, ExtensionRepository};
use serde::Serialize;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SENSITIVE_KEYS: [&str; 5] = ["password", "secret", "token", "key", "api_key"];

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Extension not found")]
    ExtensionNotFound,

    #[error("Configuration validation failed")]
    ValidationFailed(Box<ConfigurationValidation>),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("No backup found for timestamp: {0}")]
    NoBackupAtTimestamp(String),

    #[error("No backups available for rollback")]
    NoBackups,

    #[error("Invalid configuration data: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ConfigurationError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ConfigurationError::ExtensionNotFound | ConfigurationError::BackupNotFound(_) => true,
            ConfigurationError::Repository(e) => e.is_not_found(),
            ConfigurationError::Domain(e) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        match self {
            ConfigurationError::ValidationFailed(_) | ConfigurationError::InvalidFormat(_) => true,
            ConfigurationError::Domain(e) => !e.is_not_found(),
            _ => false,
        }
    }
}

/// One finding from configuration validation, located by field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFinding {
    pub code: String,
    pub message: String,
    pub path: String,
}

impl ConfigFinding {
    fn new(code: &str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigurationValidation {
    pub valid: bool,
    pub errors: Vec<ConfigFinding>,
    pub warnings: Vec<ConfigFinding>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Overlay the update on the current configuration, skipping nulls
    #[default]
    Merge,
    /// Use the update as the new configuration
    Replace,
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub backup_before_update: bool,
    pub validate: bool,
    pub merge_mode: MergeMode,
    pub reason: String,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            backup_before_update: true,
            validate: true,
            merge_mode: MergeMode::Merge,
            reason: "Configuration update".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationUpdate {
    pub extension_id: String,
    pub backup_id: Option<String>,
    pub validation: Option<ConfigurationValidation>,
    pub configuration: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationBackup {
    pub backup_id: String,
    pub extension_id: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub snapshot: Value,
    pub retention_until: DateTime<Utc>,
    pub size_bytes: usize,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub enum RollbackTarget {
    Backup(String),
    /// Most recent backup taken at or before the instant
    Timestamp(DateTime<Utc>),
    Latest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationRollback {
    pub extension_id: String,
    pub message: String,
    pub configuration: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOperation {
    Update,
    Rollback,
    Template,
    Clone,
    Import,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: ConfigOperation,
    pub reason: String,
    pub backup_id: Option<String>,
    pub configuration: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationDifference {
    pub path: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationExport {
    pub export_id: String,
    pub timestamp: DateTime<Utc>,
    /// JSON object keyed by extension ID
    pub data: String,
    pub extension_count: usize,
    pub total_keys: usize,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    ApiService,
    CliTool,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationTemplate {
    pub schema: Value,
    pub defaults: Value,
    pub validation_rules: Vec<String>,
    pub usage_instructions: Vec<String>,
}

impl TemplateKind {
    pub fn template(self, enterprise: bool) -> ConfigurationTemplate {
        let (schema, defaults, validation_rules) = match self {
            TemplateKind::ApiService => (
                json!({
                    "type": "object",
                    "properties": {
                        "api_endpoint": { "type": "string" },
                        "max_connections": { "type": "integer", "minimum": 1, "maximum": 1000 },
                        "timeout_ms": { "type": "integer", "minimum": 1000, "maximum": 60000 },
                        "enable_ssl": { "type": "boolean" },
                    },
                    "required": ["api_endpoint", "max_connections"],
                }),
                json!({
                    "api_endpoint": "https://api.example.com",
                    "max_connections": 100,
                    "timeout_ms": 30000,
                    "enable_ssl": true,
                }),
                vec!["max_connections <= 500".to_string(), "timeout_ms >= 5000".to_string()],
            ),
            TemplateKind::CliTool => (
                json!({
                    "type": "object",
                    "properties": {
                        "command_prefix": { "type": "string" },
                        "max_arguments": { "type": "integer", "minimum": 1, "maximum": 100 },
                        "timeout_seconds": { "type": "integer", "minimum": 1, "maximum": 3600 },
                        "enable_colors": { "type": "boolean" },
                        "log_level": { "type": "string", "enum": ["debug", "info", "warn", "error"] },
                    },
                    "required": ["command_prefix"],
                }),
                json!({
                    "command_prefix": "mytool",
                    "max_arguments": 10,
                    "timeout_seconds": 300,
                    "enable_colors": true,
                    "log_level": "info",
                }),
                vec!["max_arguments <= 50".to_string(), "timeout_seconds <= 1800".to_string()],
            ),
            TemplateKind::Generic => (
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "enabled": { "type": "boolean" },
                        "config": { "type": "object" },
                    },
                    "required": ["name"],
                }),
                json!({ "name": "My Extension", "enabled": true, "config": {} }),
                Vec::new(),
            ),
        };

        let mut usage_instructions = vec![
            "1. Review the generated configuration schema".to_string(),
            "2. Customize the default values according to your needs".to_string(),
            "3. Test the configuration in a development environment".to_string(),
            "4. Apply validation rules to ensure configuration integrity".to_string(),
        ];
        if enterprise {
            usage_instructions.extend([
                "5. Implement security hardening measures".to_string(),
                "6. Set up monitoring and alerting".to_string(),
                "7. Configure backup and disaster recovery".to_string(),
            ]);
        }

        ConfigurationTemplate {
            schema,
            defaults,
            validation_rules,
            usage_instructions,
        }
    }
}

// ==================== Validation ====================

/// Validate a configuration block: schema and current values present,
/// values conform to the schema, rules hold, plus security and sizing hints.
pub fn validate_configuration(configuration: &ExtensionConfiguration) -> ConfigurationValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    if configuration.schema.is_null() {
        errors.push(ConfigFinding::new(
            "CONFIGURATION_SCHEMA_MISSING",
            "Configuration schema is missing",
            "configuration.schema",
        ));
    }
    let config = &configuration.current_config;
    if config.is_null() {
        errors.push(ConfigFinding::new(
            "CURRENT_CONFIG_MISSING",
            "Current configuration is missing",
            "configuration.current_config",
        ));
    } else {
        if !configuration.schema.is_null() {
            check_schema(config, &configuration.schema, &mut errors);
        }
        check_rules(config, &configuration.validation_rules, &mut errors, &mut warnings);
    }

    if let Some(values) = config.as_object() {
        for key in values.keys() {
            let lower = key.to_lowercase();
            if SENSITIVE_KEYS.iter().any(|s| lower.contains(s)) {
                warnings.push(ConfigFinding::new(
                    "SENSITIVE_CONFIG_DETECTED",
                    format!("Potentially sensitive configuration key detected: {}", key),
                    key.as_str(),
                ));
            }
        }
        if ["host", "bind_address"]
            .iter()
            .any(|k| values.get(*k).and_then(Value::as_str) == Some("0.0.0.0"))
        {
            warnings.push(ConfigFinding::new(
                "INSECURE_BIND_ADDRESS",
                "Binding to 0.0.0.0 may expose service to external networks",
                "host",
            ));
        }
        if values.get("max_connections").and_then(Value::as_f64).is_some_and(|n| n > 1000.0) {
            warnings.push(ConfigFinding::new(
                "HIGH_CONNECTION_LIMIT",
                "High connection limit may impact performance",
                "max_connections",
            ));
        }
        if let Some(limit) = values.get("memory_limit").and_then(Value::as_f64).filter(|m| *m > 1024.0) {
            recommendations.push(format!(
                "Consider memory optimization for large memory limits: Memory limit: {}MB",
                limit
            ));
        }
    }
    recommendations.push(
        "Review security configuration guidelines: Ensure sensitive data is properly encrypted and access is restricted"
            .to_string(),
    );

    ConfigurationValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
        recommendations,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_schema(config: &Value, schema: &Value, errors: &mut Vec<ConfigFinding>) {
    let required: BTreeSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    for key in &required {
        if config.get(*key).is_none() {
            errors.push(ConfigFinding::new(
                "REQUIRED_FIELD_MISSING",
                format!("Required field '{}' is missing", key),
                *key,
            ));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    for (key, prop) in properties {
        let Some(value) = config.get(key) else {
            continue;
        };
        if let Some(expected) = prop.get("type").and_then(Value::as_str) {
            let actual = json_type(value);
            let matches = actual == expected || (expected == "number" && actual == "integer");
            if !matches {
                errors.push(ConfigFinding::new(
                    "TYPE_MISMATCH",
                    format!("Field '{}' should be {}, got {}", key, expected, actual),
                    key.as_str(),
                ));
            }
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = prop.get("minimum").and_then(Value::as_f64).filter(|min| n < *min) {
                errors.push(ConfigFinding::new(
                    "VALUE_TOO_SMALL",
                    format!("Field '{}' value {} is less than minimum {}", key, value, min),
                    key.as_str(),
                ));
            }
            if let Some(max) = prop.get("maximum").and_then(Value::as_f64).filter(|max| n > *max) {
                errors.push(ConfigFinding::new(
                    "VALUE_TOO_LARGE",
                    format!("Field '{}' value {} is greater than maximum {}", key, value, max),
                    key.as_str(),
                ));
            }
        }
        if let Some(allowed) = prop.get("enum").and_then(Value::as_array)
            && !value.is_null()
            && !allowed.contains(value)
        {
            let list: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            errors.push(ConfigFinding::new(
                "INVALID_ENUM_VALUE",
                format!("Field '{}' value {} is not in allowed values: {}", key, value, list.join(", ")),
                key.as_str(),
            ));
        }
    }
}

/// Rules have the form `field <= N` or `field >= N`
fn check_rules(config: &Value, rules: &[String], errors: &mut Vec<ConfigFinding>, warnings: &mut Vec<ConfigFinding>) {
    for rule in rules {
        let parsed = ["<=", ">="].iter().find_map(|op| {
            let (field, limit) = rule.split_once(op)?;
            Some((field.trim(), *op, limit.trim().parse::<f64>().ok()?))
        });
        let Some((field, op, limit)) = parsed else {
            warnings.push(ConfigFinding::new(
                "RULE_EVALUATION_ERROR",
                format!("Failed to evaluate rule: {}", rule),
                rule.as_str(),
            ));
            continue;
        };
        let Some(value) = config.get(field).and_then(Value::as_f64) else {
            continue;
        };
        let holds = if op == "<=" { value <= limit } else { value >= limit };
        if !holds {
            errors.push(ConfigFinding::new(
                "RULE_VIOLATION",
                format!("Rule violated: {} (value: {})", rule, value),
                field,
            ));
        }
    }
}

fn checksum(value: &Value) -> String {
    let digest = hex::encode(Sha256::digest(value.to_string().as_bytes()));
    digest[..16].to_string()
}

fn merge_skipping_nulls(current: &Value, updates: &Map<String, Value>) -> Value {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in updates {
        if !value.is_null() {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

fn diff(base: &Value, target: &Value, prefix: &str, out: &mut Vec<ConfigurationDifference>) {
    let empty = Map::new();
    let base_map = base.as_object().unwrap_or(&empty);
    let target_map = target.as_object().unwrap_or(&empty);
    let keys: BTreeSet<&String> = base_map.keys().chain(target_map.keys()).collect();
    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match (base_map.get(key), target_map.get(key)) {
            (Some(b), Some(t)) if b == t => {}
            (Some(b), Some(t)) if b.is_object() && t.is_object() => diff(b, t, &path, out),
            (b, t) => out.push(ConfigurationDifference {
                path,
                old_value: b.cloned(),
                new_value: t.cloned(),
            }),
        }
    }
}

// ==================== Service ====================

pub struct ExtensionConfigurationService {
    repository: Arc<dyn ExtensionRepository>,
    retention_days: i64,
    backups: RwLock<HashMap<String, Vec<ConfigurationBackup>>>,
    history: RwLock<HashMap<String, Vec<ConfigurationHistoryEntry>>>,
}

impl ExtensionConfigurationService {
    pub fn new(repository: Arc<dyn ExtensionRepository>) -> Self {
        Self {
            repository,
            retention_days: ExtensionPolicy::default().backup_retention_days,
            backups: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: &ExtensionPolicy) -> Self {
        self.retention_days = policy.backup_retention_days;
        self
    }

    async fn load(&self, extension_id: &str) -> Result<ExtensionEntity, ConfigurationError> {
        self.repository
            .find_by_id(extension_id)
            .await?
            .ok_or(ConfigurationError::ExtensionNotFound)
    }

    /// Validate the stored configuration of an extension
    pub async fn validate_extension(&self, extension_id: &str) -> Result<ConfigurationValidation, ConfigurationError> {
        let extension = self.load(extension_id).await?;
        Ok(validate_configuration(extension.configuration()))
    }

    pub async fn update_configuration(
        &self,
        extension_id: &str,
        updates: Value,
        options: UpdateOptions,
        user_id: &str,
    ) -> Result<ConfigurationUpdate, ConfigurationError> {
        self.apply(extension_id, updates, options, ConfigOperation::Update, user_id)
            .await
    }

    async fn apply(
        &self,
        extension_id: &str,
        updates: Value,
        options: UpdateOptions,
        operation: ConfigOperation,
        user_id: &str,
    ) -> Result<ConfigurationUpdate, ConfigurationError> {
        let mut extension = self.load(extension_id).await?;
        let Value::Object(update_map) = updates else {
            return Err(ConfigurationError::InvalidFormat(
                "configuration updates must be a JSON object".into(),
            ));
        };

        let new_config = match options.merge_mode {
            MergeMode::Replace => Value::Object(update_map),
            MergeMode::Merge => merge_skipping_nulls(&extension.configuration().current_config, &update_map),
        };

        let validation = if options.validate {
            let existing = extension.configuration();
            let candidate = ExtensionConfiguration {
                schema: if existing.schema.is_null() {
                    json!({})
                } else {
                    existing.schema.clone()
                },
                current_config: new_config.clone(),
                default_config: existing.default_config.clone(),
                validation_rules: existing.validation_rules.clone(),
            };
            let result = validate_configuration(&candidate);
            if !result.valid {
                warn!("Configuration for {} rejected: {} errors", extension_id, result.errors.len());
                return Err(ConfigurationError::ValidationFailed(Box::new(result)));
            }
            Some(result)
        } else {
            None
        };

        let backup_id = if options.backup_before_update {
            let backup = self
                .snapshot(&extension, format!("Backup before update: {}", options.reason))
                .await;
            Some(backup.backup_id)
        } else {
            None
        };

        extension.update_configuration(new_config.clone(), user_id)?;
        self.repository.update(&extension).await?;
        self.record(extension_id, operation, options.reason, backup_id.clone(), new_config.clone())
            .await;
        info!("Configuration updated for extension {}", extension_id);

        Ok(ConfigurationUpdate {
            extension_id: extension_id.to_string(),
            backup_id,
            validation,
            configuration: new_config,
        })
    }

    pub async fn backup_configuration(
        &self,
        extension_id: &str,
        reason: &str,
    ) -> Result<ConfigurationBackup, ConfigurationError> {
        let extension = self.load(extension_id).await?;
        Ok(self.snapshot(&extension, reason.to_string()).await)
    }

    async fn snapshot(&self, extension: &ExtensionEntity, reason: String) -> ConfigurationBackup {
        let snapshot = extension.configuration().current_config.clone();
        let now = Utc::now();
        let backup = ConfigurationBackup {
            backup_id: uuid::Uuid::new_v4().to_string(),
            extension_id: extension.id().to_string(),
            timestamp: now,
            reason,
            retention_until: now + Duration::days(self.retention_days),
            size_bytes: snapshot.to_string().len(),
            checksum: checksum(&snapshot),
            snapshot,
        };
        self.backups
            .write()
            .await
            .entry(extension.id().to_string())
            .or_default()
            .push(backup.clone());
        debug!("Configuration backup {} created for {}", backup.backup_id, extension.id());
        backup
    }

    pub async fn list_backups(&self, extension_id: &str) -> Vec<ConfigurationBackup> {
        self.backups
            .read()
            .await
            .get(extension_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn find_backup(&self, extension_id: &str, target: &RollbackTarget) -> Result<ConfigurationBackup, ConfigurationError> {
        let backups = self.list_backups(extension_id).await;
        match target {
            RollbackTarget::Backup(id) => backups
                .into_iter()
                .find(|b| &b.backup_id == id)
                .ok_or_else(|| ConfigurationError::BackupNotFound(id.clone())),
            RollbackTarget::Timestamp(at) => backups
                .into_iter()
                .filter(|b| b.timestamp <= *at)
                .max_by_key(|b| b.timestamp)
                .ok_or_else(|| ConfigurationError::NoBackupAtTimestamp(at.to_rfc3339())),
            RollbackTarget::Latest => backups
                .into_iter()
                .max_by_key(|b| b.timestamp)
                .ok_or(ConfigurationError::NoBackups),
        }
    }

    pub async fn rollback_configuration(
        &self,
        extension_id: &str,
        target: RollbackTarget,
        validate_after: bool,
        reason: &str,
        user_id: &str,
    ) -> Result<ConfigurationRollback, ConfigurationError> {
        let mut extension = self.load(extension_id).await?;
        let backup = self.find_backup(extension_id, &target).await?;

        if validate_after {
            let candidate = ExtensionConfiguration {
                current_config: backup.snapshot.clone(),
                ..extension.configuration().clone()
            };
            let result = validate_configuration(&candidate);
            if !result.valid {
                return Err(ConfigurationError::ValidationFailed(Box::new(result)));
            }
        }

        let message = match &target {
            RollbackTarget::Backup(id) => format!("Rolled back to backup: {}", id),
            RollbackTarget::Timestamp(at) => format!("Rolled back to timestamp: {}", at.to_rfc3339()),
            RollbackTarget::Latest => format!("Rolled back to latest backup: {}", backup.backup_id),
        };
        extension.update_configuration(backup.snapshot.clone(), user_id)?;
        self.repository.update(&extension).await?;
        self.record(
            extension_id,
            ConfigOperation::Rollback,
            reason.to_string(),
            Some(backup.backup_id.clone()),
            backup.snapshot.clone(),
        )
        .await;
        info!("{} ({})", message, extension_id);

        Ok(ConfigurationRollback {
            extension_id: extension_id.to_string(),
            message,
            configuration: backup.snapshot,
        })
    }

    /// Replace the configuration with a template's defaults
    pub async fn apply_template(
        &self,
        extension_id: &str,
        kind: TemplateKind,
        user_id: &str,
    ) -> Result<ConfigurationUpdate, ConfigurationError> {
        let template = kind.template(false);
        let check = ExtensionConfiguration {
            schema: template.schema.clone(),
            current_config: template.defaults.clone(),
            default_config: Value::Null,
            validation_rules: template.validation_rules.clone(),
        };
        let validation = validate_configuration(&check);
        if !validation.valid {
            return Err(ConfigurationError::ValidationFailed(Box::new(validation)));
        }
        let options = UpdateOptions {
            merge_mode: MergeMode::Replace,
            validate: false,
            reason: "Configuration template applied".to_string(),
            ..Default::default()
        };
        self.apply(extension_id, template.defaults, options, ConfigOperation::Template, user_id)
            .await
    }

    /// Copy one extension's configuration to another, renaming keys per
    /// `renames` (old key to new key)
    pub async fn clone_configuration(
        &self,
        source_id: &str,
        target_id: &str,
        renames: &BTreeMap<String, String>,
        user_id: &str,
    ) -> Result<ConfigurationUpdate, ConfigurationError> {
        let source = self.load(source_id).await?;
        let mut config = source
            .configuration()
            .current_config
            .as_object()
            .cloned()
            .unwrap_or_default();
        for (from, to) in renames {
            if let Some(value) = config.remove(from) {
                config.insert(to.clone(), value);
            }
        }
        let options = UpdateOptions {
            merge_mode: MergeMode::Replace,
            reason: format!("Configuration cloned from {}", source_id),
            ..Default::default()
        };
        self.apply(target_id, Value::Object(config), options, ConfigOperation::Clone, user_id)
            .await
    }

    /// Differences between two configuration versions. Either side defaults
    /// to the current configuration.
    pub async fn compare_configurations(
        &self,
        extension_id: &str,
        base_backup_id: Option<&str>,
        target_backup_id: Option<&str>,
    ) -> Result<Vec<ConfigurationDifference>, ConfigurationError> {
        let current = self.load(extension_id).await?.configuration().current_config.clone();
        let base = match base_backup_id {
            Some(id) => self.find_backup(extension_id, &RollbackTarget::Backup(id.to_string())).await?.snapshot,
            None => current.clone(),
        };
        let target = match target_backup_id {
            Some(id) => self.find_backup(extension_id, &RollbackTarget::Backup(id.to_string())).await?.snapshot,
            None => current,
        };
        let mut out = Vec::new();
        diff(&base, &target, "", &mut out);
        Ok(out)
    }

    /// Export current configurations as a JSON object keyed by extension ID.
    /// Unknown IDs are skipped.
    pub async fn export_configuration(&self, extension_ids: &[String]) -> Result<ConfigurationExport, ConfigurationError> {
        let mut exported = Map::new();
        let mut total_keys = 0;
        for id in extension_ids {
            match self.repository.find_by_id(id).await? {
                Some(extension) => {
                    let config = extension.configuration().current_config.clone();
                    total_keys += config.as_object().map_or(0, Map::len);
                    exported.insert(id.clone(), config);
                }
                None => warn!("Configuration not found for extension: {}", id),
            }
        }
        let extension_count = exported.len();
        let data = serde_json::to_string_pretty(&Value::Object(exported))
            .map_err(|e| ConfigurationError::InvalidFormat(e.to_string()))?;
        Ok(ConfigurationExport {
            export_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            size_bytes: data.len(),
            data,
            extension_count,
            total_keys,
        })
    }

    /// Import configurations from an export document. Each listed extension
    /// is replaced, validated, and backed up independently.
    pub async fn import_configuration(
        &self,
        data: &str,
        extension_ids: &[String],
        user_id: &str,
    ) -> Result<Vec<(String, Result<ConfigurationUpdate, ConfigurationError>)>, ConfigurationError> {
        let parsed: Map<String, Value> =
            serde_json::from_str(data).map_err(|e| ConfigurationError::InvalidFormat(e.to_string()))?;
        let mut results = Vec::with_capacity(extension_ids.len());
        for id in extension_ids {
            let outcome = match parsed.get(id) {
                Some(config) => {
                    let options = UpdateOptions {
                        merge_mode: MergeMode::Replace,
                        reason: "Configuration imported from JSON".to_string(),
                        ..Default::default()
                    };
                    self.apply(id, config.clone(), options, ConfigOperation::Import, user_id)
                        .await
                }
                None => Err(ConfigurationError::InvalidFormat(format!(
                    "Configuration data not found for extension: {}",
                    id
                ))),
            };
            results.push((id.clone(), outcome));
        }
        Ok(results)
    }

    /// Drop backups past their retention date. Returns how many were removed.
    pub async fn cleanup_expired_backups(&self) -> usize {
        self.cleanup_expired_at(Utc::now()).await
    }

    async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut backups = self.backups.write().await;
        let mut removed = 0;
        for list in backups.values_mut() {
            let before = list.len();
            list.retain(|b| b.retention_until > now);
            removed += before - list.len();
        }
        if removed > 0 {
            info!("Removed {} expired configuration backups", removed);
        }
        removed
    }

    pub async fn configuration_history(&self, extension_id: &str) -> Vec<ConfigurationHistoryEntry> {
        self.history
            .read()
            .await
            .get(extension_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn record(
        &self,
        extension_id: &str,
        operation: ConfigOperation,
        reason: String,
        backup_id: Option<String>,
        configuration: Value,
    ) {
        self.history
            .write()
            .await
            .entry(extension_id.to_string())
            .or_default()
            .push(ConfigurationHistoryEntry {
                timestamp: Utc::now(),
                operation,
                reason,
                backup_id,
                configuration,
            });
    }
}
