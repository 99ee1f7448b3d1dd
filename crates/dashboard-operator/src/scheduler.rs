//! Reconciliation loop and scheduler
//!
//! One task owns the reconciler and runs passes one at a time: on every
//! interval tick, on an explicit trigger and whenever the observed spec
//! changes. A failed pass is logged and retried on the next tick.
//!
//! The in-flight pass is cancelled by shutdown and by a newly published
//! spec; the superseding spec is reconciled right after.

use dashboard_reconcile::{Cancellation, DashboardReconciler, ReconcileError, ReconcileReport};
use dashboard_types::DashboardSpec;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::SchedulerConfig;

/// Pass counters accumulated over the scheduler's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub passes: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
}

/// Control side of a running scheduler
#[derive(Debug)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
    spec_tx: watch::Sender<DashboardSpec>,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Request a pass as soon as the current one finishes
    pub fn trigger_reconcile(&self) {
        if self.trigger_tx.try_send(()).is_err() {
            tracing::debug!("Reconcile already pending, trigger dropped");
        }
    }

    /// Publish a newly observed spec; the next pass picks it up
    pub fn update_spec(&self, spec: DashboardSpec) {
        self.spec_tx.send_replace(spec);
    }

    /// Stop the loop and cancel the in-flight pass, if any
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Scheduler state
pub struct Scheduler {
    config: SchedulerConfig,
    reconciler: DashboardReconciler,
    spec_rx: watch::Receiver<DashboardSpec>,
    trigger_rx: mpsc::Receiver<()>,
    shutdown_rx: watch::Receiver<bool>,
    /// Whether the last successful pass left the dashboard installed
    prior_instance_existed: bool,
    stats: PassStats,
}

impl Scheduler {
    /// Create a new scheduler and its control handle
    pub fn new(
        config: SchedulerConfig,
        reconciler: DashboardReconciler,
        initial_spec: DashboardSpec,
    ) -> (Self, SchedulerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(config.trigger_capacity.max(1));
        let (spec_tx, spec_rx) = watch::channel(initial_spec);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = Self {
            config,
            reconciler,
            spec_rx,
            trigger_rx,
            shutdown_rx,
            prior_instance_existed: false,
            stats: PassStats::default(),
        };
        let handle = SchedulerHandle {
            trigger_tx,
            spec_tx,
            shutdown_tx,
        };

        (scheduler, handle)
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }

    pub fn prior_instance_existed(&self) -> bool {
        self.prior_instance_existed
    }

    /// Run passes until shutdown is requested or the handle is dropped
    pub async fn run(mut self) -> PassStats {
        let mut ticker = interval(Duration::from_secs(
            self.config.reconcile_interval_secs.max(1),
        ));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.reconcile_interval_secs,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
                Some(()) = self.trigger_rx.recv() => {
                    tracing::debug!("Triggered reconciliation");
                }
                Ok(()) = self.spec_rx.changed() => {
                    tracing::debug!("Spec changed, reconciling");
                }
            }

            if *self.shutdown_rx.borrow() {
                break;
            }
            // Failures are already logged; the next tick retries.
            let _ = self.reconcile_once().await;
        }

        tracing::info!(
            passes = self.stats.passes,
            failed = self.stats.failed,
            "Scheduler stopped"
        );
        self.stats
    }

    /// Run a single pass against the latest observed spec
    pub async fn reconcile_once(&mut self) -> Result<ReconcileReport, ReconcileError> {
        let spec = self.spec_rx.borrow_and_update().clone();
        let (cancel_tx, cancel) = Cancellation::channel();
        let watcher = tokio::spawn(watch_for_cancel(
            self.shutdown_rx.clone(),
            self.spec_rx.clone(),
            cancel_tx,
        ));
        self.stats.passes += 1;

        let result = self
            .reconciler
            .reconcile(&spec, self.prior_instance_existed, &cancel)
            .await;
        watcher.abort();

        match result {
            Ok(report) => {
                self.prior_instance_existed = report.enabled;
                self.stats.succeeded += 1;
                tracing::info!(
                    pass_id = %report.pass_id,
                    platform = %report.platform,
                    enabled = report.enabled,
                    "Reconciliation pass succeeded"
                );
                Ok(report)
            }
            Err(e) if e.is_cancelled() => {
                self.stats.cancelled += 1;
                let superseded = self.spec_rx.has_changed().unwrap_or(false);
                tracing::info!(
                    pass_id = %e.pass_id,
                    step = %e.step(),
                    superseded,
                    "Reconciliation pass cancelled"
                );
                Err(e)
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::error!(
                    pass_id = %e.pass_id,
                    step = %e.step(),
                    kind = e.cause().kind(),
                    error = %e,
                    "Reconciliation pass failed"
                );
                Err(e)
            }
        }
    }
}

/// Raise `cancel` once shutdown is requested or a newer spec is published
async fn watch_for_cancel(
    mut shutdown_rx: watch::Receiver<bool>,
    mut spec_rx: watch::Receiver<DashboardSpec>,
    cancel: watch::Sender<bool>,
) {
    tokio::select! {
        true = shutdown_requested(&mut shutdown_rx) => {
            tracing::debug!("Shutdown requested, cancelling pass");
        }
        Ok(()) = spec_rx.changed() => {
            tracing::debug!("Spec superseded, cancelling pass");
        }
        else => return,
    }
    cancel.send_replace(true);
}

/// Resolves `true` once shutdown is set, `false` if the handle is gone
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) -> bool {
    loop {
        if *rx.borrow_and_update() {
            return true;
        }
        if rx.changed().await.is_err() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_reconcile::{
        CleanupOutcome, ClusterCall, FailurePoint, InMemoryCluster, ReconcilerConfig,
    };
    use dashboard_types::{Bundle, ReconcileStep};
    use std::sync::Arc;

    const CREDENTIAL: &str = "dashboard-oauth-client";
    const NS: &str = "opendatahub";

    fn scheduler(cluster: &Arc<InMemoryCluster>, config: ReconcilerConfig) -> (Scheduler, SchedulerHandle) {
        let reconciler = DashboardReconciler::new(config, cluster.clone());
        Scheduler::new(SchedulerConfig::default(), reconciler, DashboardSpec::managed())
    }

    fn manifest_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (relative, content) in [
            ("dashboard/odhdashboardconfig/odhdashboardconfig.yaml", "adminGroups: <admin_groups>\n"),
            (
                "dashboard/consolelink/consolelink.yaml",
                "href: <rhods-dashboard-url>\nsection: <section-title>\n",
            ),
        ] {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_prior_instance_tracks_last_successful_pass() {
        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_platform("Open Data Hub")
                .with_credential(CREDENTIAL, NS),
        );
        let (mut scheduler, handle) = scheduler(&cluster, ReconcilerConfig::default());

        let first = scheduler.reconcile_once().await.unwrap();
        assert_eq!(first.cleanup, CleanupOutcome::Purged);
        assert!(scheduler.prior_instance_existed());

        let second = scheduler.reconcile_once().await.unwrap();
        assert_eq!(second.cleanup, CleanupOutcome::Skipped);

        handle.update_spec(DashboardSpec::removed());
        let removed = scheduler.reconcile_once().await.unwrap();
        assert!(!removed.enabled);
        assert!(!scheduler.prior_instance_existed());

        handle.update_spec(DashboardSpec::managed());
        let reinstalled = scheduler.reconcile_once().await.unwrap();
        assert_eq!(reinstalled.cleanup, CleanupOutcome::AlreadyClean);
        assert_eq!(scheduler.stats().succeeded, 4);
    }

    #[tokio::test]
    async fn test_failed_pass_keeps_prior_state() {
        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_platform("Open Data Hub")
                .with_failure(FailurePoint::Apply(Bundle::Primary), "admission webhook denied"),
        );
        let (mut scheduler, _handle) = scheduler(&cluster, ReconcilerConfig::default());

        let err = scheduler.reconcile_once().await.unwrap_err();
        assert_eq!(err.step(), ReconcileStep::ApplyPrimary);
        assert!(!scheduler.prior_instance_existed());

        cluster.clear_failures();
        scheduler.reconcile_once().await.unwrap();
        assert!(scheduler.prior_instance_existed());
        assert_eq!(
            scheduler.stats(),
            PassStats {
                passes: 2,
                succeeded: 1,
                failed: 1,
                cancelled: 0,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_on_tick_and_trigger_then_stops() {
        let cluster = Arc::new(InMemoryCluster::new().with_platform("Open Data Hub"));
        let (scheduler, handle) = scheduler(&cluster, ReconcilerConfig::default());
        let run = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.trigger_reconcile();
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown();

        let stats = run.await.unwrap();
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.succeeded, 2);
        let detections = cluster
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ClusterCall::DetectPlatform))
            .count();
        assert_eq!(detections, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_inflight_health_probe() {
        let dir = manifest_tree();

        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_platform("OpenShift AI Cloud Service")
                .with_route("console", "openshift-console", "console.apps.example.com")
                .with_deployment_never_ready(),
        );
        let config = ReconcilerConfig::default().with_manifest_root(dir.path());
        let (scheduler, handle) = scheduler(&cluster, config);
        let run = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.shutdown();

        let stats = run.await.unwrap();
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.cancelled, 1);
        assert!(cluster.probe_attempts() < 20);
        assert_eq!(cluster.alerting_enabled("rhods-dashboard"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spec_change_supersedes_inflight_pass() {
        let dir = manifest_tree();
        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_platform("OpenShift AI Cloud Service")
                .with_route("console", "openshift-console", "console.apps.example.com")
                .with_deployment_never_ready(),
        );
        let config = ReconcilerConfig::default().with_manifest_root(dir.path());
        let (scheduler, handle) = scheduler(&cluster, config);
        let run = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_secs(12)).await;
        let attempts_before = cluster.probe_attempts();
        handle.update_spec(DashboardSpec::removed());
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown();

        let stats = run.await.unwrap();
        assert_eq!(
            stats,
            PassStats {
                passes: 2,
                succeeded: 1,
                failed: 0,
                cancelled: 1,
            }
        );
        assert_eq!(cluster.probe_attempts(), attempts_before);
        assert_eq!(cluster.applied_state().get(&Bundle::Primary), Some(&false));
        assert_eq!(cluster.alerting_enabled("rhods-dashboard"), None);
    }
}
