//! Dashboard Operator library
//!
//! Core components of the dashboard reconciliation daemon:
//! - Layered configuration (defaults, file, environment)
//! - Scheduler serializing reconciliation passes
//! - Simulated cluster backend for running without a live cluster

pub mod config;
pub mod error;
pub mod scheduler;
pub mod simulation;

pub use config::{LoggingConfig, OperatorConfig, SchedulerConfig};
pub use error::{OperatorError, OperatorResult};
pub use scheduler::{PassStats, Scheduler, SchedulerHandle};
pub use simulation::SimulationConfig;

use std::sync::Arc;

use dashboard_reconcile::{Cancellation, DashboardReconciler, ReconcileReport};

/// Run a single pass against the configured cluster
///
/// `prior_instance_existed` must reflect whether the dashboard is already
/// installed; passing `false` for a live install purges its OAuth client.
pub async fn run_once(
    config: &OperatorConfig,
    prior_instance_existed: bool,
) -> OperatorResult<ReconcileReport> {
    let cluster = Arc::new(
        config
            .simulation
            .build_cluster(&config.reconciler, &config.dashboard.applications_namespace),
    );
    let reconciler = DashboardReconciler::new(config.reconciler.clone(), cluster);
    let report = reconciler
        .reconcile(&config.dashboard, prior_instance_existed, &Cancellation::never())
        .await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_reconcile::CleanupOutcome;

    fn stale_credential_config() -> OperatorConfig {
        let mut config = OperatorConfig::default();
        config.simulation.stale_credential = true;
        config
    }

    #[tokio::test]
    async fn test_run_once_keeps_credential_of_existing_install() {
        let report = run_once(&stale_credential_config(), true).await.unwrap();
        assert!(report.enabled);
        assert_eq!(report.cleanup, CleanupOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_run_once_purges_credential_on_fresh_install() {
        let report = run_once(&stale_credential_config(), false).await.unwrap();
        assert_eq!(report.cleanup, CleanupOutcome::Purged);
    }
}
