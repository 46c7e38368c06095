//! CLI entrypoint for mplp
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mplp_application::{
    AuditLogger, CollabManagementService, CollabMonitoringService, CollabSecurityService,
    ExtensionConfigurationService, ExtensionManagementService, NoAuditLogger, NoGovernance,
    PermitAll,
};
use mplp_domain::collab::CollabCoordinationService;
use mplp_infrastructure::{
    CollabMapper, ConfigLoader, FileConfig, InMemoryCollabRepository, InMemoryExtensionRepository,
    JsonlAuditLogger,
};
use mplp_presentation::{
    ApiState, Cli, CollabController, Command, ConsoleFormatter, ExtensionController, OutputFormat,
    router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often `serve` refreshes monitoring and prunes expired backups
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!("{}", e))?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_config_issues(&issues));
    }

    match cli.command {
        Command::Serve { bind } => serve(&config, bind.as_deref()).await,
        Command::Recommend {
            mode,
            participants,
            capabilities,
        } => {
            let matrix = Command::capability_matrix(&capabilities);
            let recommendation = CollabCoordinationService::calculate_optimal_strategy(mode, participants, &matrix);
            match cli.output {
                OutputFormat::Text => {
                    print!("{}", ConsoleFormatter::format_recommendation(mode, participants, &recommendation))
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recommendation)?),
            }
            Ok(())
        }
        Command::ValidateSchema { file } => validate_schema(&file, cli.output),
        Command::ShowConfig => {
            let sources = if cli.no_config {
                Vec::new()
            } else {
                ConfigLoader::sources(cli.config.as_ref())
            };
            match cli.output {
                OutputFormat::Text => {
                    print!("{}", ConsoleFormatter::format_config_sources(&sources));
                    print!("{}", ConsoleFormatter::section_header("Effective configuration"));
                    println!("{}", toml::to_string_pretty(&config)?);
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            }
            Ok(())
        }
    }
}

fn validate_schema(file: &Path, output: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let document: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))?;
    let issues = CollabMapper::validate_schema(&document);

    match output {
        OutputFormat::Text => print!(
            "{}",
            ConsoleFormatter::format_schema_issues(&file.display().to_string(), &issues)
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
    }

    if issues.iter().any(|i| i.is_error()) {
        bail!("{} is not a valid collaboration", file.display());
    }
    Ok(())
}

async fn serve(config: &FileConfig, bind: Option<&str>) -> Result<()> {
    // === Dependency Injection ===
    let (collab_policy, _) = config.collab.to_policy();
    let (extension_policy, _) = config.extension.to_policy();
    let (thresholds, _) = config.monitoring.to_thresholds();
    let addr: SocketAddr = match bind {
        Some(bind) => bind.parse().with_context(|| format!("invalid bind address: {}", bind))?,
        None => config.server.parse_bind().0,
    };

    let audit: Arc<dyn AuditLogger> = match config.audit.resolved_path() {
        Some(path) => match JsonlAuditLogger::new(&path) {
            Some(logger) => {
                info!("Writing audit trail to {}", logger.path().display());
                Arc::new(logger)
            }
            None => Arc::new(NoAuditLogger),
        },
        None => Arc::new(NoAuditLogger),
    };

    let collab_repo = Arc::new(InMemoryCollabRepository::new());
    let extension_repo = Arc::new(InMemoryExtensionRepository::new());

    let collab_service = Arc::new(CollabManagementService::new(collab_repo.clone()).with_policy(collab_policy));
    let monitoring = Arc::new(CollabMonitoringService::new(collab_repo).with_thresholds(thresholds));
    let security = Arc::new(CollabSecurityService::new(
        Arc::new(PermitAll),
        Arc::new(NoGovernance),
        audit,
    ));
    let extension_service = Arc::new(
        ExtensionManagementService::new(extension_repo.clone())
            .with_platform_version(extension_policy.platform_version.clone()),
    );
    let configuration = Arc::new(ExtensionConfigurationService::new(extension_repo).with_policy(&extension_policy));

    let state = ApiState::new(
        CollabController::new(collab_service)
            .with_security(security)
            .with_monitoring(monitoring.clone()),
        ExtensionController::new(extension_service),
    );

    let token = CancellationToken::new();
    let maintenance = tokio::spawn(maintenance_loop(monitoring, configuration, token.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}/api/v1", addr);

    let shutdown = token.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    token.cancel();
    if let Err(e) = maintenance.await {
        warn!("Maintenance task ended abnormally: {}", e);
    }
    Ok(())
}

/// Periodic monitoring refresh and backup retention until `token` fires
async fn maintenance_loop(
    monitoring: Arc<CollabMonitoringService>,
    configuration: Arc<ExtensionConfigurationService>,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let failed = monitoring.refresh_all().await;
                if !failed.is_empty() {
                    warn!("Monitoring refresh failed for: {}", failed.join(", "));
                }
                configuration.cleanup_expired_backups().await;
            }
        }
    }
}
