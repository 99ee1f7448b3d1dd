//! Declared and per-pass desired state for the dashboard

use serde::{Deserialize, Serialize};

use crate::bundle::Bundle;
use crate::platform::PlatformVariant;

/// Whether the dashboard should be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ManagementState {
    /// Installed and kept in line with the manifests
    #[default]
    Managed,
    /// Torn down; resources previously applied are de-provisioned
    Removed,
}

impl ManagementState {
    pub fn is_managed(&self) -> bool {
        matches!(self, ManagementState::Managed)
    }
}

impl std::fmt::Display for ManagementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagementState::Managed => write!(f, "Managed"),
            ManagementState::Removed => write!(f, "Removed"),
        }
    }
}

/// Developer override pointing a bundle at manifests fetched from elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevOverride {
    /// Bundle the override replaces
    #[serde(default = "default_override_bundle")]
    pub bundle: Bundle,

    /// Where to fetch the manifests from (tarball URI)
    pub uri: String,

    /// Directory inside the fetched tree that replaces the default base/overlay
    #[serde(default)]
    pub source_path: Option<String>,
}

fn default_override_bundle() -> Bundle {
    Bundle::Primary
}

impl DevOverride {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            bundle: Bundle::Primary,
            uri: uri.into(),
            source_path: None,
        }
    }

    pub fn with_source_path(mut self, source_path: impl Into<String>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    /// Source path, ignoring an empty string
    pub fn effective_source_path(&self) -> Option<&str> {
        self.source_path.as_deref().filter(|path| !path.is_empty())
    }
}

/// Dashboard section of the cluster-observed spec
///
/// Re-read from the cluster at the start of every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSpec {
    #[serde(default)]
    pub management_state: ManagementState,

    #[serde(default)]
    pub dev_overrides: Vec<DevOverride>,

    #[serde(default)]
    pub monitoring_enabled: bool,

    #[serde(default = "default_applications_namespace")]
    pub applications_namespace: String,

    #[serde(default = "default_monitoring_namespace")]
    pub monitoring_namespace: String,

    /// Cluster-wide manifests override; suppresses image parameter updates
    #[serde(default)]
    pub cluster_manifests_uri: Option<String>,
}

fn default_applications_namespace() -> String {
    "opendatahub".to_string()
}

fn default_monitoring_namespace() -> String {
    "redhat-ods-monitoring".to_string()
}

impl Default for DashboardSpec {
    fn default() -> Self {
        Self {
            management_state: ManagementState::Managed,
            dev_overrides: Vec::new(),
            monitoring_enabled: false,
            applications_namespace: default_applications_namespace(),
            monitoring_namespace: default_monitoring_namespace(),
            cluster_manifests_uri: None,
        }
    }
}

impl DashboardSpec {
    pub fn managed() -> Self {
        Self::default()
    }

    pub fn removed() -> Self {
        Self {
            management_state: ManagementState::Removed,
            ..Self::default()
        }
    }
}

/// Immutable snapshot a single reconciliation pass works from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub management_state: ManagementState,
    pub platform: PlatformVariant,
    pub dev_overrides: Vec<DevOverride>,
    pub monitoring_enabled: bool,
    pub prior_instance_existed: bool,
    pub applications_namespace: String,
    pub monitoring_namespace: String,
    pub cluster_manifests_uri: Option<String>,
}

impl DesiredState {
    /// Combine the observed spec with this pass's platform classification
    pub fn from_spec(
        spec: &DashboardSpec,
        platform: PlatformVariant,
        prior_instance_existed: bool,
    ) -> Self {
        Self {
            management_state: spec.management_state,
            platform,
            dev_overrides: spec.dev_overrides.clone(),
            monitoring_enabled: spec.monitoring_enabled,
            prior_instance_existed,
            applications_namespace: spec.applications_namespace.clone(),
            monitoring_namespace: spec.monitoring_namespace.clone(),
            cluster_manifests_uri: spec.cluster_manifests_uri.clone(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.management_state.is_managed()
    }

    /// First override declared for a bundle; later entries are ignored
    pub fn override_for(&self, bundle: Bundle) -> Option<&DevOverride> {
        self.dev_overrides.iter().find(|o| o.bundle == bundle)
    }

    /// True when any manifests override is in effect, component or cluster wide
    pub fn has_manifest_overrides(&self) -> bool {
        !self.dev_overrides.is_empty()
            || self
                .cluster_manifests_uri
                .as_deref()
                .is_some_and(|uri| !uri.is_empty())
    }
}
