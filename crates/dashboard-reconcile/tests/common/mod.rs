//! Shared fixtures for the reconciliation integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use dashboard_reconcile::{ClusterCall, DashboardReconciler, InMemoryCluster, ReconcilerConfig};
use dashboard_types::platform::{FULLY_MANAGED_IDENTITY, OPEN_DATA_HUB_IDENTITY, SELF_MANAGED_IDENTITY};
use dashboard_types::{Bundle, DashboardSpec};
use tempfile::TempDir;

pub const APPS_NS: &str = "redhat-ods-applications";
pub const MONITORING_NS: &str = "redhat-ods-monitoring";
pub const CONSOLE_HOST: &str = "console-openshift-console.apps.cluster.example.com";
pub const CREDENTIAL: &str = "dashboard-oauth-client";

pub const DASHBOARD_CONFIG: &str = "\
apiVersion: opendatahub.io/v1alpha
kind: OdhDashboardConfig
spec:
  groupsConfig:
    adminGroups: <admin_groups>
";

pub const CONSOLE_LINK: &str = "\
apiVersion: console.openshift.io/v1
kind: ConsoleLink
spec:
  href: <rhods-dashboard-url>
  applicationMenu:
    section: <section-title>
";

/// Manifest tree holding the two files that carry placeholders.
pub struct ManifestTree {
    pub dir: TempDir,
}

impl ManifestTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "dashboard/odhdashboardconfig/odhdashboardconfig.yaml", DASHBOARD_CONFIG);
        write(root, "dashboard/consolelink/consolelink.yaml", CONSOLE_LINK);
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root().join(relative)).unwrap()
    }

    pub fn dashboard_config(&self) -> String {
        self.read("dashboard/odhdashboardconfig/odhdashboardconfig.yaml")
    }

    pub fn console_link(&self) -> String {
        self.read("dashboard/consolelink/consolelink.yaml")
    }

    pub fn config(&self) -> ReconcilerConfig {
        ReconcilerConfig::default().with_manifest_root(self.root())
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

pub fn open_cluster() -> InMemoryCluster {
    InMemoryCluster::new().with_platform(OPEN_DATA_HUB_IDENTITY)
}

pub fn self_managed_cluster() -> InMemoryCluster {
    InMemoryCluster::new()
        .with_platform(SELF_MANAGED_IDENTITY)
        .with_route("console", "openshift-console", CONSOLE_HOST)
}

pub fn fully_managed_cluster() -> InMemoryCluster {
    InMemoryCluster::new()
        .with_platform(FULLY_MANAGED_IDENTITY)
        .with_route("console", "openshift-console", CONSOLE_HOST)
}

pub fn managed_spec() -> DashboardSpec {
    DashboardSpec {
        applications_namespace: APPS_NS.to_string(),
        monitoring_enabled: true,
        ..DashboardSpec::managed()
    }
}

pub fn removed_spec() -> DashboardSpec {
    DashboardSpec {
        applications_namespace: APPS_NS.to_string(),
        ..DashboardSpec::removed()
    }
}

pub fn reconciler(tree: &ManifestTree, cluster: &Arc<InMemoryCluster>) -> DashboardReconciler {
    DashboardReconciler::new(tree.config(), cluster.clone())
}

/// Index of the first call matching `predicate`.
pub fn position(calls: &[ClusterCall], predicate: impl Fn(&ClusterCall) -> bool) -> usize {
    calls
        .iter()
        .position(predicate)
        .unwrap_or_else(|| panic!("expected call not found in {calls:#?}"))
}

pub fn is_apply_of(bundle: Bundle) -> impl Fn(&ClusterCall) -> bool {
    move |call| matches!(call, ClusterCall::ApplyBundle { bundle: b, .. } if *b == bundle)
}

pub fn is_crd_install(call: &ClusterCall) -> bool {
    matches!(call, ClusterCall::InstallCrds { .. })
}

pub fn is_credential_call(call: &ClusterCall) -> bool {
    matches!(
        call,
        ClusterCall::GetCredential { .. } | ClusterCall::DeleteCredential { .. }
    )
}

pub fn is_monitoring_call(call: &ClusterCall) -> bool {
    matches!(call, ClusterCall::PrometheusConfig { .. })
        || is_apply_of(Bundle::MonitoringApps)(call)
}
