//! Health gate in front of monitoring changes.
//!
//! Alerting rules are only switched on once the dashboard deployment is
//! available, so a rollout in progress does not page anyone.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::cancel::Cancellation;
use crate::cluster::DeploymentProbe;
use crate::error::StepError;

/// Polls a deployment at a fixed interval until it is available.
pub struct MonitoringGate {
    probe: Arc<dyn DeploymentProbe>,
}

impl MonitoringGate {
    pub fn new(probe: Arc<dyn DeploymentProbe>) -> Self {
        Self { probe }
    }

    /// Wait until `name` in `namespace` is available.
    ///
    /// Probes at most `max_attempts` times, sleeping `interval` between
    /// attempts without backoff. Probe errors count as a failed attempt.
    /// Returns the attempt that succeeded.
    #[instrument(skip(self, cancel), fields(deployment = %name, namespace = %namespace))]
    pub async fn wait_healthy(
        &self,
        name: &str,
        namespace: &str,
        max_attempts: u32,
        interval: Duration,
        cancel: &Cancellation,
    ) -> Result<u32, StepError> {
        let cancelled = || StepError::Cancelled {
            operation: format!("waiting for deployment {namespace}/{name}"),
        };
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            match self.probe.deployment_available(name, namespace).await {
                Ok(true) => {
                    info!(attempt, "Deployment available");
                    return Ok(attempt);
                }
                Ok(false) => {
                    debug!(attempt, max_attempts, "Deployment not yet available");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Deployment probe failed");
                    last_error = Some(e.to_string());
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = cancel.cancelled() => return Err(cancelled()),
                }
            }
        }

        Err(StepError::HealthProbeTimeout {
            target: format!("{namespace}/{name}"),
            attempts: max_attempts,
            last_error,
        })
    }
}
