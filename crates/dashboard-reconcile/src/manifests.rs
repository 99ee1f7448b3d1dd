//! Manifest bundle resolution.
//!
//! Every bundle path used by a pass is resolved up front, developer
//! overrides included, and frozen into a [`BundlePlan`]. Nothing re-resolves
//! a path after the first apply of the pass.

use std::path::PathBuf;
use std::sync::Arc;

use dashboard_types::bundle::COMPONENT_DIR;
use dashboard_types::{Bundle, BundleRef, DesiredState, DevOverride, PlatformBranch, PlatformVariant};
use tracing::{info, instrument};

use crate::cluster::ManifestSource;
use crate::error::StepError;

/// Resolves bundle locations under a manifest root.
pub struct ManifestLocator {
    root: PathBuf,
    source: Arc<dyn ManifestSource>,
}

impl ManifestLocator {
    pub fn new(root: impl Into<PathBuf>, source: Arc<dyn ManifestSource>) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }

    /// Directory holding the dashboard's own bundles and overlays.
    pub fn component_dir(&self) -> PathBuf {
        self.root.join(COMPONENT_DIR)
    }

    /// Directory a bundle's override manifests are unpacked into.
    pub fn override_dir(&self, bundle: Bundle) -> PathBuf {
        self.root.join(bundle.override_dir())
    }

    /// Location of a bundle when no override applies.
    ///
    /// Managed platforms select the overlay of bundles that have one; the
    /// open platform (and an undetected one) uses the base.
    pub fn default_ref(&self, bundle: Bundle, platform: PlatformVariant) -> BundleRef {
        let base = self.root.join(bundle.default_relative_path());
        match (bundle.default_overlay_suffix(), platform.branch()) {
            (Some(suffix), PlatformBranch::Managed) => {
                BundleRef::new(bundle, base).with_overlay(self.component_dir().join(suffix))
            }
            (Some(_), PlatformBranch::Open) | (None, _) => BundleRef::new(bundle, base),
        }
    }

    /// Resolve one bundle, materializing its override first when present.
    ///
    /// Manifests are unpacked into the bundle's own override directory. A
    /// source path, relative to that directory, replaces the default base
    /// or overlay suffix entirely; without one the default location is
    /// kept and now holds the fetched content.
    #[instrument(skip(self, dev_override), fields(bundle = %bundle, platform = %platform))]
    pub async fn resolve(
        &self,
        bundle: Bundle,
        dev_override: Option<&DevOverride>,
        platform: PlatformVariant,
    ) -> Result<BundleRef, StepError> {
        let default = self.default_ref(bundle, platform);
        let Some(dev_override) = dev_override else {
            return Ok(default);
        };

        let destination = self.override_dir(bundle);
        self.source
            .fetch_override_manifests(dev_override, &destination)
            .await
            .map_err(|source| StepError::Fetch {
                bundle,
                uri: dev_override.uri.clone(),
                source,
            })?;

        info!(uri = %dev_override.uri, destination = %destination.display(), "Override manifests fetched");

        let Some(source_path) = dev_override.effective_source_path() else {
            return Ok(default);
        };

        let replaced = destination.join(source_path);
        Ok(match default.overlay_path {
            Some(_) => BundleRef {
                overlay_path: Some(replaced),
                ..default
            },
            None => BundleRef {
                base_path: replaced,
                ..default
            },
        })
    }

    /// Resolve every bundle for a pass. Overrides only take effect while the
    /// dashboard is enabled; a disabled pass tears down from default paths.
    pub async fn plan(&self, desired: &DesiredState) -> Result<BundlePlan, StepError> {
        let mut refs = Vec::with_capacity(Bundle::ALL.len());
        for bundle in Bundle::ALL {
            let dev_override = if desired.enabled() {
                desired.override_for(bundle)
            } else {
                None
            };
            refs.push(self.resolve(bundle, dev_override, desired.platform).await?);
        }
        Ok(BundlePlan { refs })
    }
}

/// Frozen bundle locations for a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePlan {
    /// One entry per bundle, in `Bundle::ALL` order.
    refs: Vec<BundleRef>,
}

impl BundlePlan {
    pub fn get(&self, bundle: Bundle) -> &BundleRef {
        &self.refs[bundle as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ClusterCall, FailurePoint, InMemoryCluster};
    use dashboard_types::DashboardSpec;
    use std::path::Path;

    fn locator(cluster: &Arc<InMemoryCluster>) -> ManifestLocator {
        ManifestLocator::new("/m", cluster.clone())
    }

    fn desired(platform: PlatformVariant, overrides: Vec<DevOverride>) -> DesiredState {
        let mut spec = DashboardSpec::managed();
        spec.dev_overrides = overrides;
        DesiredState::from_spec(&spec, platform, true)
    }

    #[test]
    fn test_plan_order_matches_bundle_discriminants() {
        for (index, bundle) in Bundle::ALL.into_iter().enumerate() {
            assert_eq!(bundle as usize, index);
        }
    }

    #[tokio::test]
    async fn test_default_paths_per_platform() {
        let cluster = Arc::new(InMemoryCluster::new());
        let locator = locator(&cluster);

        let open = locator
            .resolve(Bundle::Primary, None, PlatformVariant::OpenDataHub)
            .await
            .unwrap();
        assert_eq!(open.effective_path(), Path::new("/m/dashboard/base"));

        let unknown = locator
            .resolve(Bundle::Primary, None, PlatformVariant::Unknown)
            .await
            .unwrap();
        assert_eq!(unknown.effective_path(), Path::new("/m/dashboard/base"));

        let managed = locator
            .resolve(Bundle::Primary, None, PlatformVariant::FullyManaged)
            .await
            .unwrap();
        assert_eq!(managed.effective_path(), Path::new("/m/dashboard/overlays/rhods"));

        let monitoring = locator
            .resolve(Bundle::MonitoringApps, None, PlatformVariant::FullyManaged)
            .await
            .unwrap();
        assert_eq!(
            monitoring.effective_path(),
            Path::new("/m/monitoring/prometheus/apps")
        );
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn test_override_source_path_replaces_suffix() {
        let cluster = Arc::new(InMemoryCluster::new());
        let locator = locator(&cluster);
        let dev_override = DevOverride::new("https://example.com/d.tar.gz").with_source_path("custom");

        let managed = locator
            .resolve(Bundle::Primary, Some(&dev_override), PlatformVariant::SelfManaged)
            .await
            .unwrap();
        assert_eq!(managed.effective_path(), Path::new("/m/dashboard/custom"));
        assert_eq!(managed.base_path, PathBuf::from("/m/dashboard/base"));

        let open = locator
            .resolve(Bundle::Primary, Some(&dev_override), PlatformVariant::OpenDataHub)
            .await
            .unwrap();
        assert_eq!(open.effective_path(), Path::new("/m/dashboard/custom"));
        assert!(open.overlay_path.is_none());

        assert_eq!(
            cluster.calls()[0],
            ClusterCall::FetchOverride {
                bundle: Bundle::Primary,
                uri: "https://example.com/d.tar.gz".into(),
                destination: PathBuf::from("/m/dashboard"),
            }
        );
    }

    #[tokio::test]
    async fn test_override_without_source_path_keeps_default() {
        let cluster = Arc::new(InMemoryCluster::new());
        let dev_override = DevOverride::new("https://example.com/d.tar.gz");
        let resolved = locator(&cluster)
            .resolve(Bundle::Primary, Some(&dev_override), PlatformVariant::FullyManaged)
            .await
            .unwrap();
        assert_eq!(resolved.effective_path(), Path::new("/m/dashboard/overlays/rhods"));
        assert_eq!(cluster.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_partner_and_monitoring_overrides_unpack_beside_their_bundle() {
        let cluster = Arc::new(InMemoryCluster::new());
        let locator = locator(&cluster);
        let dev_override = DevOverride::new("https://example.com/partner.tar.gz");

        let anaconda = locator
            .resolve(Bundle::Anaconda, Some(&dev_override), PlatformVariant::SelfManaged)
            .await
            .unwrap();
        assert_eq!(anaconda.effective_path(), Path::new("/m/partners/anaconda/base"));

        let monitoring = locator
            .resolve(
                Bundle::MonitoringApps,
                Some(&dev_override.clone().with_source_path("apps-dev")),
                PlatformVariant::FullyManaged,
            )
            .await
            .unwrap();
        assert_eq!(
            monitoring.effective_path(),
            Path::new("/m/monitoring/prometheus/apps-dev")
        );

        let destinations: Vec<_> = cluster
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                ClusterCall::FetchOverride { destination, .. } => Some(destination),
                _ => None,
            })
            .collect();
        assert_eq!(
            destinations,
            vec![
                PathBuf::from("/m/partners/anaconda"),
                PathBuf::from("/m/monitoring/prometheus"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let cluster = Arc::new(
            InMemoryCluster::new().with_failure(FailurePoint::FetchOverride, "404"),
        );
        let err = locator(&cluster)
            .plan(&desired(
                PlatformVariant::OpenDataHub,
                vec![DevOverride::new("https://example.com/missing.tar.gz")],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Fetch { bundle: Bundle::Primary, .. }));
    }

    #[tokio::test]
    async fn test_plan_fetches_once_and_ignores_overrides_when_removed() {
        let cluster = Arc::new(InMemoryCluster::new());
        let locator = locator(&cluster);
        let overrides = vec![DevOverride::new("https://example.com/d.tar.gz").with_source_path("dev")];

        let plan = locator
            .plan(&desired(PlatformVariant::OpenDataHub, overrides.clone()))
            .await
            .unwrap();
        assert_eq!(
            plan.get(Bundle::Primary).effective_path(),
            Path::new("/m/dashboard/dev")
        );
        assert_eq!(cluster.take_calls().len(), 1);

        let mut spec = DashboardSpec::removed();
        spec.dev_overrides = overrides;
        let removed = DesiredState::from_spec(&spec, PlatformVariant::OpenDataHub, true);
        let plan = locator.plan(&removed).await.unwrap();
        assert_eq!(
            plan.get(Bundle::Primary).effective_path(),
            Path::new("/m/dashboard/base")
        );
        assert!(cluster.calls().is_empty());
    }
}
