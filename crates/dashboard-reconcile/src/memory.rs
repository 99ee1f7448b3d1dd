//! In-memory cluster for development, simulation and tests.
//!
//! Implements every collaborator trait against local maps and records each
//! call in order, so a pass can be inspected after the fact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dashboard_types::{Bundle, BundleRef, DevOverride};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use crate::cluster::{
    ClusterResources, Credential, DeploymentProbe, ManifestDeployer, ManifestSource,
    PlatformDetector,
};
use crate::error::{ClusterError, ClusterResult};

/// One collaborator invocation as observed by the in-memory cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterCall {
    DetectPlatform,
    FetchOverride {
        bundle: Bundle,
        uri: String,
        destination: PathBuf,
    },
    ApplyBundle {
        bundle: Bundle,
        path: PathBuf,
        namespace: String,
        component: String,
        enabled: bool,
    },
    InstallCrds {
        path: PathBuf,
        namespace: String,
        component: String,
        enabled: bool,
    },
    ApplyParams {
        path: PathBuf,
        params: BTreeMap<String, String>,
    },
    CreateSecret {
        name: String,
        namespace: String,
    },
    GetRouteHost {
        name: String,
        namespace: String,
    },
    GetCredential {
        name: String,
        namespace: String,
    },
    DeleteCredential {
        name: String,
        namespace: String,
    },
    PodSecurity {
        namespace: String,
        service_account: String,
    },
    PrometheusConfig {
        enabled: bool,
        component: String,
    },
    ProbeDeployment {
        name: String,
        namespace: String,
    },
}

impl ClusterCall {
    /// Whether the call changes cluster state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ClusterCall::DetectPlatform
                | ClusterCall::GetRouteHost { .. }
                | ClusterCall::GetCredential { .. }
                | ClusterCall::ProbeDeployment { .. }
        )
    }
}

/// Operations that can be made to fail with an API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailurePoint {
    DetectPlatform,
    FetchOverride,
    Apply(Bundle),
    InstallCrds,
    ApplyParams,
    CreateSecret,
    GetRouteHost,
    GetCredential,
    DeleteCredential,
    PodSecurity,
    PrometheusConfig,
    ProbeDeployment,
}

/// In-memory implementation of the cluster collaborators.
pub struct InMemoryCluster {
    platform_identity: Mutex<String>,
    routes: DashMap<(String, String), String>,
    credentials: DashSet<Credential>,
    secrets: DashSet<(String, String)>,
    applied: DashMap<Bundle, bool>,
    alerting_enabled: DashMap<String, bool>,
    /// Probe answers available from this attempt on; `None` never.
    ready_after: Mutex<Option<u32>>,
    probe_attempts: AtomicU32,
    failures: DashMap<FailurePoint, String>,
    calls: Mutex<Vec<ClusterCall>>,
}

impl InMemoryCluster {
    /// Empty cluster: unknown platform, no routes, deployments ready at once.
    pub fn new() -> Self {
        Self {
            platform_identity: Mutex::new(String::new()),
            routes: DashMap::new(),
            credentials: DashSet::new(),
            secrets: DashSet::new(),
            applied: DashMap::new(),
            alerting_enabled: DashMap::new(),
            ready_after: Mutex::new(Some(1)),
            probe_attempts: AtomicU32::new(0),
            failures: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_platform(self, identity: impl Into<String>) -> Self {
        *lock(&self.platform_identity) = identity.into();
        self
    }

    pub fn with_route(
        self,
        name: impl Into<String>,
        namespace: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        self.routes
            .insert((name.into(), namespace.into()), host.into());
        self
    }

    pub fn with_credential(self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.credentials.insert(Credential::new(name, namespace));
        self
    }

    /// Deployments report available from the `attempt`-th probe on.
    pub fn with_deployment_ready_after(self, attempt: u32) -> Self {
        *lock(&self.ready_after) = Some(attempt.max(1));
        self
    }

    pub fn with_deployment_never_ready(self) -> Self {
        *lock(&self.ready_after) = None;
        self
    }

    pub fn with_failure(self, point: FailurePoint, message: impl Into<String>) -> Self {
        self.failures.insert(point, message.into());
        self
    }

    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    /// Snapshot of every call so far, in order.
    pub fn calls(&self) -> Vec<ClusterCall> {
        lock(&self.calls).clone()
    }

    /// Drain the call log.
    pub fn take_calls(&self) -> Vec<ClusterCall> {
        std::mem::take(&mut *lock(&self.calls))
    }

    /// Last `enabled` flag each bundle was applied with.
    pub fn applied_state(&self) -> BTreeMap<Bundle, bool> {
        self.applied.iter().map(|e| (*e.key(), *e.value())).collect()
    }

    pub fn has_credential(&self, name: &str, namespace: &str) -> bool {
        self.credentials.contains(&Credential::new(name, namespace))
    }

    pub fn has_secret(&self, name: &str, namespace: &str) -> bool {
        self.secrets
            .contains(&(name.to_string(), namespace.to_string()))
    }

    pub fn alerting_enabled(&self, component: &str) -> Option<bool> {
        self.alerting_enabled.get(component).map(|v| *v)
    }

    pub fn probe_attempts(&self) -> u32 {
        self.probe_attempts.load(Ordering::SeqCst)
    }

    fn record(&self, call: ClusterCall) {
        lock(&self.calls).push(call);
    }

    fn check(&self, point: FailurePoint) -> ClusterResult<()> {
        match self.failures.get(&point) {
            Some(message) => Err(ClusterError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl PlatformDetector for InMemoryCluster {
    async fn detect_platform(&self) -> ClusterResult<String> {
        self.record(ClusterCall::DetectPlatform);
        self.check(FailurePoint::DetectPlatform)?;
        Ok(lock(&self.platform_identity).clone())
    }
}

#[async_trait]
impl ManifestSource for InMemoryCluster {
    async fn fetch_override_manifests(
        &self,
        dev_override: &DevOverride,
        destination: &Path,
    ) -> ClusterResult<()> {
        self.record(ClusterCall::FetchOverride {
            bundle: dev_override.bundle,
            uri: dev_override.uri.clone(),
            destination: destination.to_path_buf(),
        });
        self.check(FailurePoint::FetchOverride)
    }
}

#[async_trait]
impl ManifestDeployer for InMemoryCluster {
    async fn apply_manifest_bundle(
        &self,
        bundle: &BundleRef,
        namespace: &str,
        component: &str,
        enabled: bool,
    ) -> ClusterResult<()> {
        self.record(ClusterCall::ApplyBundle {
            bundle: bundle.bundle,
            path: bundle.effective_path().to_path_buf(),
            namespace: namespace.to_string(),
            component: component.to_string(),
            enabled,
        });
        self.check(FailurePoint::Apply(bundle.bundle))?;
        self.applied.insert(bundle.bundle, enabled);
        Ok(())
    }

    async fn install_crd_bundle(
        &self,
        bundle: &BundleRef,
        namespace: &str,
        component: &str,
        enabled: bool,
    ) -> ClusterResult<()> {
        self.record(ClusterCall::InstallCrds {
            path: bundle.effective_path().to_path_buf(),
            namespace: namespace.to_string(),
            component: component.to_string(),
            enabled,
        });
        self.check(FailurePoint::InstallCrds)?;
        self.applied.insert(bundle.bundle, enabled);
        Ok(())
    }

    async fn apply_params(
        &self,
        bundle: &BundleRef,
        params: &BTreeMap<String, String>,
    ) -> ClusterResult<()> {
        self.record(ClusterCall::ApplyParams {
            path: bundle.effective_path().to_path_buf(),
            params: params.clone(),
        });
        self.check(FailurePoint::ApplyParams)
    }
}

#[async_trait]
impl ClusterResources for InMemoryCluster {
    async fn create_secret_if_absent(&self, name: &str, namespace: &str) -> ClusterResult<()> {
        self.record(ClusterCall::CreateSecret {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
        self.check(FailurePoint::CreateSecret)?;
        self.secrets
            .insert((name.to_string(), namespace.to_string()));
        Ok(())
    }

    async fn get_route_host(&self, name: &str, namespace: &str) -> ClusterResult<String> {
        self.record(ClusterCall::GetRouteHost {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
        self.check(FailurePoint::GetRouteHost)?;
        self.routes
            .get(&(name.to_string(), namespace.to_string()))
            .map(|host| host.clone())
            .ok_or_else(|| ClusterError::not_found("Route", name, namespace))
    }

    async fn get_credential(&self, name: &str, namespace: &str) -> ClusterResult<Credential> {
        self.record(ClusterCall::GetCredential {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
        self.check(FailurePoint::GetCredential)?;
        let credential = Credential::new(name, namespace);
        if self.credentials.contains(&credential) {
            Ok(credential)
        } else {
            Err(ClusterError::not_found("Secret", name, namespace))
        }
    }

    async fn delete_credential(&self, credential: &Credential) -> ClusterResult<()> {
        self.record(ClusterCall::DeleteCredential {
            name: credential.name.clone(),
            namespace: credential.namespace.clone(),
        });
        self.check(FailurePoint::DeleteCredential)?;
        self.credentials
            .remove(credential)
            .map(|_| ())
            .ok_or_else(|| {
                ClusterError::not_found("Secret", &credential.name, &credential.namespace)
            })
    }

    async fn update_pod_security_rolebinding(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> ClusterResult<()> {
        self.record(ClusterCall::PodSecurity {
            namespace: namespace.to_string(),
            service_account: service_account.to_string(),
        });
        self.check(FailurePoint::PodSecurity)
    }

    async fn update_prometheus_config(
        &self,
        enabled: bool,
        component: &str,
    ) -> ClusterResult<()> {
        self.record(ClusterCall::PrometheusConfig {
            enabled,
            component: component.to_string(),
        });
        self.check(FailurePoint::PrometheusConfig)?;
        self.alerting_enabled.insert(component.to_string(), enabled);
        Ok(())
    }
}

#[async_trait]
impl DeploymentProbe for InMemoryCluster {
    async fn deployment_available(&self, name: &str, namespace: &str) -> ClusterResult<bool> {
        self.record(ClusterCall::ProbeDeployment {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
        let attempt = self.probe_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.check(FailurePoint::ProbeDeployment)?;
        Ok(lock(&self.ready_after).is_some_and(|ready| attempt >= ready))
    }
}
