//! Dashboard Operator - Background reconciliation daemon
//!
//! Keeps the dashboard component in line with its declared state:
//! - Periodic and on-demand reconciliation passes
//! - Graceful shutdown that cancels an in-flight health probe
//! - Single-pass mode for scripting (`--once`)

use std::sync::Arc;

use clap::Parser;
use dashboard_operator::{run_once, OperatorConfig, OperatorError, OperatorResult, Scheduler};
use dashboard_reconcile::DashboardReconciler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dashboard Operator CLI
#[derive(Parser)]
#[command(name = "dashboard-operatord")]
#[command(about = "Dashboard Operator - Background reconciliation daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<String>,

    /// Log level
    #[arg(long, env = "DASHBOARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "DASHBOARD_LOG_JSON")]
    json: bool,

    /// Run a single reconciliation pass and exit
    #[arg(long)]
    once: bool,

    /// The dashboard is already installed; keeps its OAuth client on `--once`
    #[arg(long, env = "DASHBOARD_PRIOR_INSTANCE")]
    prior_instance: bool,
}

#[tokio::main]
async fn main() -> OperatorResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = OperatorConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    init_tracing(&config);

    if cli.once {
        let report = run_once(&config, cli.prior_instance).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let cluster = Arc::new(
        config
            .simulation
            .build_cluster(&config.reconciler, &config.dashboard.applications_namespace),
    );
    let reconciler = DashboardReconciler::new(config.reconciler.clone(), cluster);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = %config.simulation.platform,
        namespace = %config.dashboard.applications_namespace,
        "Dashboard operator starting"
    );

    let (scheduler, handle) = Scheduler::new(config.scheduler, reconciler, config.dashboard);
    let run = tokio::spawn(scheduler.run());

    shutdown_signal().await;
    handle.shutdown();

    let stats = run
        .await
        .map_err(|e| OperatorError::Io(std::io::Error::other(e)))?;
    tracing::info!(
        passes = stats.passes,
        succeeded = stats.succeeded,
        failed = stats.failed,
        cancelled = stats.cancelled,
        "Dashboard operator stopped"
    );
    Ok(())
}

fn init_tracing(config: &OperatorConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
