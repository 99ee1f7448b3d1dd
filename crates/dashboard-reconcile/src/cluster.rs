//! Collaborator interfaces the reconciliation engine drives.
//!
//! The engine only decides when and with what arguments these are called.
//! Applying manifests, talking to the API server and fetching tarballs are
//! owned by the implementations.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use dashboard_types::{BundleRef, DevOverride};
use serde::{Deserialize, Serialize};

use crate::error::ClusterResult;

/// A credential object (secret) in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    pub name: String,
    pub namespace: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reports which platform the operator is running on.
#[async_trait]
pub trait PlatformDetector: Send + Sync {
    /// Raw platform identity; empty when nothing could be determined.
    async fn detect_platform(&self) -> ClusterResult<String>;
}

/// Materializes developer override manifests on local disk.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch `dev_override` and unpack it into `destination`.
    async fn fetch_override_manifests(
        &self,
        dev_override: &DevOverride,
        destination: &Path,
    ) -> ClusterResult<()>;
}

/// Applies manifest bundles to the cluster.
#[async_trait]
pub trait ManifestDeployer: Send + Sync {
    /// Apply a bundle. `enabled = false` de-provisions what the bundle
    /// previously created; it is never a no-op.
    async fn apply_manifest_bundle(
        &self,
        bundle: &BundleRef,
        namespace: &str,
        component: &str,
        enabled: bool,
    ) -> ClusterResult<()>;

    /// Install a CRD bundle.
    async fn install_crd_bundle(
        &self,
        bundle: &BundleRef,
        namespace: &str,
        component: &str,
        enabled: bool,
    ) -> ClusterResult<()>;

    /// Update image parameters of a bundle. Keys are parameter names,
    /// values the environment variables holding the related image.
    async fn apply_params(
        &self,
        bundle: &BundleRef,
        params: &BTreeMap<String, String>,
    ) -> ClusterResult<()>;
}

/// Direct object operations outside of manifest bundles.
#[async_trait]
pub trait ClusterResources: Send + Sync {
    async fn create_secret_if_absent(&self, name: &str, namespace: &str) -> ClusterResult<()>;

    /// Host of a route; `NotFound` when the route does not exist.
    async fn get_route_host(&self, name: &str, namespace: &str) -> ClusterResult<String>;

    /// Fetch a credential; `NotFound` when it does not exist.
    async fn get_credential(&self, name: &str, namespace: &str) -> ClusterResult<Credential>;

    async fn delete_credential(&self, credential: &Credential) -> ClusterResult<()>;

    /// Refresh the pod-security role binding for a service account.
    async fn update_pod_security_rolebinding(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> ClusterResult<()>;

    /// Switch the component's alerting rules on or off.
    async fn update_prometheus_config(&self, enabled: bool, component: &str)
        -> ClusterResult<()>;
}

/// Single-shot availability check for a deployment.
#[async_trait]
pub trait DeploymentProbe: Send + Sync {
    async fn deployment_available(&self, name: &str, namespace: &str) -> ClusterResult<bool>;
}
