//! Simulated cluster backend
//!
//! Seeds an [`InMemoryCluster`] so the operator can run end to end without
//! a live cluster.

use dashboard_reconcile::{InMemoryCluster, ReconcilerConfig};
use serde::{Deserialize, Serialize};

/// Seed data for the simulated cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Identity the platform detector reports
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Host of the console route; empty leaves the route absent
    #[serde(default = "default_console_host")]
    pub console_host: String,

    /// Probe attempt from which the dashboard deployment reports available
    #[serde(default = "default_ready_after")]
    pub deployment_ready_after: u32,

    /// Leave an OAuth client credential from a previous install behind
    #[serde(default)]
    pub stale_credential: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            console_host: default_console_host(),
            deployment_ready_after: default_ready_after(),
            stale_credential: false,
        }
    }
}

fn default_platform() -> String {
    "Open Data Hub".to_string()
}

fn default_console_host() -> String {
    "console-openshift-console.apps.example.com".to_string()
}

fn default_ready_after() -> u32 {
    1
}

impl SimulationConfig {
    /// Build the in-memory cluster described by this seed
    pub fn build_cluster(&self, reconciler: &ReconcilerConfig, namespace: &str) -> InMemoryCluster {
        let mut cluster = InMemoryCluster::new()
            .with_platform(self.platform.clone())
            .with_deployment_ready_after(self.deployment_ready_after);

        if !self.console_host.is_empty() {
            let route = &reconciler.console_route;
            cluster = cluster.with_route(
                route.name.clone(),
                route.namespace.clone(),
                self.console_host.clone(),
            );
        }

        if self.stale_credential {
            cluster = cluster.with_credential(reconciler.credential_name.clone(), namespace);
        }

        cluster
    }
}
