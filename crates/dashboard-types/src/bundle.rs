//! Manifest bundles and their resolved locations

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the manifest root holding the dashboard's own bundles
pub const COMPONENT_DIR: &str = "dashboard";

/// Logical manifest bundles the dashboard pass can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bundle {
    /// The dashboard deployment itself (base or overlay)
    Primary,
    /// Custom resource definitions the dashboard owns
    Crds,
    /// Dashboard configuration resource (admin groups)
    DashboardConfig,
    /// Model-serving runtime templates
    ModelServing,
    /// Anaconda partner integration
    Anaconda,
    /// Add-on applications for self-managed installs
    IsvOnPrem,
    /// Add-on applications for the cloud service
    IsvAddOn,
    /// Console navigation link
    ConsoleLink,
    /// Prometheus scrape and alerting configuration
    MonitoringApps,
}

impl Bundle {
    pub const ALL: [Bundle; 9] = [
        Bundle::Primary,
        Bundle::Crds,
        Bundle::DashboardConfig,
        Bundle::ModelServing,
        Bundle::Anaconda,
        Bundle::IsvOnPrem,
        Bundle::IsvAddOn,
        Bundle::ConsoleLink,
        Bundle::MonitoringApps,
    ];

    /// Stable name used in logs and dev-override entries
    pub fn logical_name(&self) -> &'static str {
        match self {
            Bundle::Primary => "primary",
            Bundle::Crds => "crds",
            Bundle::DashboardConfig => "dashboard-config",
            Bundle::ModelServing => "model-serving",
            Bundle::Anaconda => "anaconda",
            Bundle::IsvOnPrem => "isv-on-prem",
            Bundle::IsvAddOn => "isv-add-on",
            Bundle::ConsoleLink => "console-link",
            Bundle::MonitoringApps => "monitoring-apps",
        }
    }

    /// Directory, relative to the manifest root, that a dev override for
    /// this bundle is unpacked into
    ///
    /// The default location always lies beneath it, so an override without
    /// a source path replaces the bundle's content in place.
    pub fn override_dir(&self) -> &'static Path {
        match self {
            Bundle::Anaconda => Path::new("partners/anaconda"),
            Bundle::MonitoringApps => Path::new("monitoring/prometheus"),
            _ => Path::new(COMPONENT_DIR),
        }
    }

    /// Default location relative to the manifest root
    pub fn default_relative_path(&self) -> PathBuf {
        let component = Path::new(COMPONENT_DIR);
        match self {
            Bundle::Primary => component.join("base"),
            Bundle::Crds => component.join("crd"),
            Bundle::DashboardConfig => component.join("odhdashboardconfig"),
            Bundle::ModelServing => component.join("modelserving"),
            Bundle::Anaconda => PathBuf::from("partners/anaconda/base"),
            Bundle::IsvOnPrem => component.join("apps/apps-onprem"),
            Bundle::IsvAddOn => component.join("apps/apps-addon"),
            Bundle::ConsoleLink => component.join("consolelink"),
            Bundle::MonitoringApps => PathBuf::from("monitoring/prometheus/apps"),
        }
    }

    /// Platform overlay relative to the component directory, if the bundle has one
    pub fn default_overlay_suffix(&self) -> Option<&'static str> {
        match self {
            Bundle::Primary => Some("overlays/rhods"),
            _ => None,
        }
    }

    /// Config file inside the bundle that receives placeholder substitution
    pub fn substitution_target(&self) -> Option<&'static str> {
        match self {
            Bundle::DashboardConfig => Some("odhdashboardconfig.yaml"),
            Bundle::ConsoleLink => Some("consolelink.yaml"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.logical_name())
    }
}

/// Resolved location of a bundle for one reconciliation pass
///
/// Built once by the manifest locator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRef {
    pub bundle: Bundle,
    pub base_path: PathBuf,
    pub overlay_path: Option<PathBuf>,
}

impl BundleRef {
    pub fn new(bundle: Bundle, base_path: impl Into<PathBuf>) -> Self {
        Self {
            bundle,
            base_path: base_path.into(),
            overlay_path: None,
        }
    }

    pub fn with_overlay(mut self, overlay_path: impl Into<PathBuf>) -> Self {
        self.overlay_path = Some(overlay_path.into());
        self
    }

    pub fn logical_name(&self) -> &'static str {
        self.bundle.logical_name()
    }

    /// Path handed to the apply primitive
    pub fn effective_path(&self) -> &Path {
        self.overlay_path.as_deref().unwrap_or(&self.base_path)
    }

    /// Path of the bundle's substitution target file, if it has one
    pub fn substitution_file(&self) -> Option<PathBuf> {
        self.bundle
            .substitution_target()
            .map(|file| self.effective_path().join(file))
    }
}
