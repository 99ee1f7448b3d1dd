//! Identity of each step in a reconciliation pass

use serde::{Deserialize, Serialize};

/// A step of the reconciliation pass, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileStep {
    ClassifyPlatform,
    CredentialCleanup,
    ResolveManifests,
    PodSecurity,
    InstallCrds,
    PlatformConfig,
    ImageParams,
    ApplyPrimary,
    IsvManifests,
    ConsoleLink,
    HealthProbe,
    MonitoringRules,
    MonitoringBundle,
}

impl ReconcileStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStep::ClassifyPlatform => "classify-platform",
            ReconcileStep::CredentialCleanup => "credential-cleanup",
            ReconcileStep::ResolveManifests => "resolve-manifests",
            ReconcileStep::PodSecurity => "pod-security",
            ReconcileStep::InstallCrds => "install-crds",
            ReconcileStep::PlatformConfig => "platform-config",
            ReconcileStep::ImageParams => "image-params",
            ReconcileStep::ApplyPrimary => "apply-primary",
            ReconcileStep::IsvManifests => "isv-manifests",
            ReconcileStep::ConsoleLink => "console-link",
            ReconcileStep::HealthProbe => "health-probe",
            ReconcileStep::MonitoringRules => "monitoring-rules",
            ReconcileStep::MonitoringBundle => "monitoring-bundle",
        }
    }
}

impl std::fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
