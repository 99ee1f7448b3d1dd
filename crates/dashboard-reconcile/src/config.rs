//! Reconciler configuration.
//!
//! Defaults describe the layout and names the dashboard manifests ship with.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Root directory all bundle paths are resolved under.
    #[serde(default = "default_manifest_root")]
    pub manifest_root: PathBuf,

    /// Bounds for the pre-monitoring health gate.
    #[serde(default)]
    pub health_gate: HealthGateConfig,

    /// Credential left behind by a previous install.
    #[serde(default = "default_credential_name")]
    pub credential_name: String,

    /// Route whose host provides the cluster's application domain.
    #[serde(default)]
    pub console_route: RouteRef,

    /// Access secret required by the anaconda partner bundle.
    #[serde(default = "default_anaconda_secret")]
    pub anaconda_secret: String,

    /// Image parameter name to related-image environment variable.
    #[serde(default = "default_image_params")]
    pub image_params: BTreeMap<String, String>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            manifest_root: default_manifest_root(),
            health_gate: HealthGateConfig::default(),
            credential_name: default_credential_name(),
            console_route: RouteRef::default(),
            anaconda_secret: default_anaconda_secret(),
            image_params: default_image_params(),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_manifest_root(mut self, manifest_root: impl Into<PathBuf>) -> Self {
        self.manifest_root = manifest_root.into();
        self
    }

    pub fn with_health_gate(mut self, max_attempts: u32, interval_secs: u64) -> Self {
        self.health_gate = HealthGateConfig {
            max_attempts,
            interval_secs,
        };
        self
    }
}

/// Bounded, fixed-interval polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthGateConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for HealthGateConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl HealthGateConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Name and namespace of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRef {
    pub name: String,
    pub namespace: String,
}

impl Default for RouteRef {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            namespace: "openshift-console".to_string(),
        }
    }
}

impl std::fmt::Display for RouteRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "route {}/{}", self.namespace, self.name)
    }
}

// Default value helpers
fn default_manifest_root() -> PathBuf {
    PathBuf::from("/opt/manifests")
}

fn default_credential_name() -> String {
    "dashboard-oauth-client".to_string()
}

fn default_anaconda_secret() -> String {
    "anaconda-ce-access".to_string()
}

fn default_image_params() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "odh-dashboard-image".to_string(),
        "RELATED_IMAGE_ODH_DASHBOARD_IMAGE".to_string(),
    )])
}

fn default_max_attempts() -> u32 {
    20
}

fn default_interval_secs() -> u64 {
    3
}
