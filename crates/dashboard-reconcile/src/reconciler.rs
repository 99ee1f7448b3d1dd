//! Dashboard Reconciler - the reconciliation decision engine
//!
//! A pass classifies the platform, then walks a fixed sequence of steps:
//!
//! 1. Credential cleanup (enabled only, before anything else is applied)
//! 2. Bundle resolution, dev overrides included, frozen for the pass
//! 3. Pod-security binding and CRDs (enabled only)
//! 4. Managed platform configuration and image parameters (enabled, managed)
//! 5. Primary bundle, applied with `enabled = false` when removed
//! 6. Add-on bundle, console link, health gate, monitoring (enabled, managed)
//!
//! The first failing step aborts the pass. Nothing is rolled back; the next
//! pass re-runs everything and converges because every call is repeatable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashboard_types::{
    Bundle, BundleRef, DashboardSpec, DesiredState, PassId, PlatformBranch, PlatformVariant,
    ReconcileStep, SubstitutionSet, SubstitutionToken,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cancel::Cancellation;
use crate::cleanup::{CleanupAgent, CleanupOutcome};
use crate::cluster::{
    ClusterResources, DeploymentProbe, ManifestDeployer, ManifestSource, PlatformDetector,
};
use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, Result, StepError, SubstitutionError};
use crate::manifests::{BundlePlan, ManifestLocator};
use crate::monitoring::MonitoringGate;
use crate::platform::PlatformClassifier;
use crate::substitution::{ParameterSubstitutor, SubstitutionReport};

/// Component name the monitoring bundle is applied under
const MONITORING_COMPONENT: &str = "prometheus";

/// Outcome of a successful pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub pass_id: PassId,
    pub platform: PlatformVariant,
    pub enabled: bool,
    /// Steps that ran, in order
    pub steps: Vec<ReconcileStep>,
    pub cleanup: CleanupOutcome,
    /// Attempt on which the health gate passed, if it ran
    pub health_probe_attempts: Option<u32>,
    /// Placeholder substitutions made this pass, in order
    pub substitutions: Vec<SubstitutionReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Tracks completed steps and tags the first failure
struct PassLog {
    pass_id: PassId,
    steps: Vec<ReconcileStep>,
}

impl PassLog {
    fn new(pass_id: PassId) -> Self {
        Self {
            pass_id,
            steps: Vec::new(),
        }
    }

    fn record<T>(&mut self, step: ReconcileStep, result: std::result::Result<T, StepError>) -> Result<T> {
        match result {
            Ok(value) => {
                debug!(step = %step, "Step complete");
                self.steps.push(step);
                Ok(value)
            }
            Err(source) => {
                warn!(step = %step, kind = source.kind(), error = %source, "Step failed, aborting pass");
                Err(ReconcileError {
                    pass_id: self.pass_id,
                    step,
                    source,
                })
            }
        }
    }
}

/// Brings the dashboard into line with its declared state
pub struct DashboardReconciler {
    config: ReconcilerConfig,
    classifier: PlatformClassifier,
    locator: ManifestLocator,
    substitutor: ParameterSubstitutor,
    gate: MonitoringGate,
    cleanup: CleanupAgent,
    deployer: Arc<dyn ManifestDeployer>,
    resources: Arc<dyn ClusterResources>,
}

impl DashboardReconciler {
    /// Create a reconciler backed by one cluster implementation
    pub fn new<C>(config: ReconcilerConfig, cluster: Arc<C>) -> Self
    where
        C: PlatformDetector
            + ManifestSource
            + ManifestDeployer
            + ClusterResources
            + DeploymentProbe
            + 'static,
    {
        Self::from_parts(
            config,
            cluster.clone(),
            cluster.clone(),
            cluster.clone(),
            cluster.clone(),
            cluster,
        )
    }

    /// Create a reconciler from individual collaborators
    pub fn from_parts(
        config: ReconcilerConfig,
        detector: Arc<dyn PlatformDetector>,
        source: Arc<dyn ManifestSource>,
        deployer: Arc<dyn ManifestDeployer>,
        resources: Arc<dyn ClusterResources>,
        probe: Arc<dyn DeploymentProbe>,
    ) -> Self {
        Self {
            classifier: PlatformClassifier::new(detector),
            locator: ManifestLocator::new(config.manifest_root.clone(), source),
            substitutor: ParameterSubstitutor::new(),
            gate: MonitoringGate::new(probe),
            cleanup: CleanupAgent::new(resources.clone()),
            deployer,
            resources,
            config,
        }
    }

    /// Run one reconciliation pass against a freshly observed spec
    ///
    /// `prior_instance_existed` tells whether the dashboard was already
    /// installed before this pass; when it was not, leftover credentials
    /// from an older install are purged first.
    #[instrument(skip_all, fields(pass_id = tracing::field::Empty, state = %spec.management_state))]
    pub async fn reconcile(
        &self,
        spec: &DashboardSpec,
        prior_instance_existed: bool,
        cancel: &Cancellation,
    ) -> Result<ReconcileReport> {
        let pass_id = PassId::generate();
        tracing::Span::current().record("pass_id", tracing::field::display(pass_id));
        let started_at = Utc::now();
        let mut log = PassLog::new(pass_id);

        let platform = log.record(ReconcileStep::ClassifyPlatform, self.classifier.classify().await)?;
        let desired = DesiredState::from_spec(spec, platform, prior_instance_existed);
        let enabled = desired.enabled();
        let namespace = desired.applications_namespace.as_str();
        let component = platform.component_name();

        info!(platform = %platform, enabled, prior_instance_existed, "Reconciling dashboard");

        let mut substitutions = Vec::new();
        let mut cleanup = CleanupOutcome::NotRun;
        if enabled {
            cleanup = log.record(
                ReconcileStep::CredentialCleanup,
                self.cleanup
                    .purge_if_transitioning(&self.config.credential_name, namespace, prior_instance_existed)
                    .await,
            )?;
        }

        let plan = log.record(ReconcileStep::ResolveManifests, self.locator.plan(&desired).await)?;

        if enabled {
            let account = platform.pod_security_account();
            log.record(
                ReconcileStep::PodSecurity,
                self.resources
                    .update_pod_security_rolebinding(namespace, account)
                    .await
                    .map_err(|e| StepError::apply(format!("pod-security binding for {account}"), e)),
            )?;

            let crds = plan.get(Bundle::Crds);
            log.record(
                ReconcileStep::InstallCrds,
                self.deployer
                    .install_crd_bundle(crds, namespace, component, enabled)
                    .await
                    .map_err(|e| StepError::apply(bundle_target(crds), e)),
            )?;

            match platform.branch() {
                PlatformBranch::Managed => {
                    log.record(
                        ReconcileStep::PlatformConfig,
                        self.apply_platform_config(&desired, &plan, &mut substitutions)
                            .await,
                    )?;

                    if !desired.has_manifest_overrides() {
                        let primary = plan.get(Bundle::Primary);
                        log.record(
                            ReconcileStep::ImageParams,
                            self.deployer
                                .apply_params(primary, &self.config.image_params)
                                .await
                                .map_err(|e| {
                                    StepError::apply(format!("image params for {}", bundle_target(primary)), e)
                                }),
                        )?;
                    }
                }
                PlatformBranch::Open => {}
            }
        }

        log.record(
            ReconcileStep::ApplyPrimary,
            self.apply_bundle(plan.get(Bundle::Primary), namespace, component, enabled)
                .await,
        )?;

        let mut health_probe_attempts = None;
        if enabled {
            match platform.branch() {
                PlatformBranch::Managed => {
                    if let Some(isv) = platform.isv_bundle() {
                        log.record(
                            ReconcileStep::IsvManifests,
                            self.apply_bundle(plan.get(isv), namespace, component, enabled)
                                .await,
                        )?;
                    }

                    log.record(
                        ReconcileStep::ConsoleLink,
                        self.register_console_link(&desired, &plan, &mut substitutions)
                            .await,
                    )?;

                    if platform.requires_health_gate() {
                        health_probe_attempts =
                            Some(self.wire_monitoring(&desired, &plan, &mut log, cancel).await?);
                    }
                }
                PlatformBranch::Open => {}
            }
        }

        let report = ReconcileReport {
            pass_id,
            platform,
            enabled,
            steps: log.steps,
            cleanup,
            health_probe_attempts,
            substitutions,
            started_at,
            finished_at: Utc::now(),
        };

        info!(steps = report.steps.len(), cleanup = ?report.cleanup, "Dashboard reconciled");
        Ok(report)
    }

    /// Admin-group substitution, dashboard config, model serving and the
    /// anaconda partner integration
    async fn apply_platform_config(
        &self,
        desired: &DesiredState,
        plan: &BundlePlan,
        substitutions: &mut Vec<SubstitutionReport>,
    ) -> std::result::Result<(), StepError> {
        let namespace = desired.applications_namespace.as_str();
        let component = desired.platform.component_name();

        let dashboard_config = plan.get(Bundle::DashboardConfig);
        if let Some(admin_group) = desired.platform.admin_group() {
            let set = SubstitutionSet::new().with(SubstitutionToken::AdminGroups, admin_group);
            substitutions.push(self.substitute_into(dashboard_config, &set).await?);
        }
        self.apply_bundle(dashboard_config, namespace, component, true)
            .await?;

        self.apply_bundle(plan.get(Bundle::ModelServing), namespace, component, true)
            .await?;

        let secret = &self.config.anaconda_secret;
        self.resources
            .create_secret_if_absent(secret, namespace)
            .await
            .map_err(|e| StepError::apply(format!("secret {namespace}/{secret}"), e))?;

        self.apply_bundle(plan.get(Bundle::Anaconda), namespace, component, true)
            .await
    }

    /// Point the console link at the dashboard route and apply it
    async fn register_console_link(
        &self,
        desired: &DesiredState,
        plan: &BundlePlan,
        substitutions: &mut Vec<SubstitutionReport>,
    ) -> std::result::Result<(), StepError> {
        let namespace = desired.applications_namespace.as_str();
        let route = &self.config.console_route;

        // Only a missing route means "not ready yet"; anything else is a
        // cluster failure.
        let host = match self
            .resources
            .get_route_host(&route.name, &route.namespace)
            .await
        {
            Ok(host) => host,
            Err(source) if source.is_not_found() => {
                return Err(StepError::DependencyNotReady {
                    dependency: route.to_string(),
                    source,
                })
            }
            Err(source) => return Err(StepError::apply(route.to_string(), source)),
        };

        let url = dashboard_url(namespace, &host);
        let mut set = SubstitutionSet::new().with(SubstitutionToken::DashboardUrl, url.clone());
        if let Some(title) = desired.platform.section_title() {
            set = set.with(SubstitutionToken::SectionTitle, title);
        }

        let console_link = plan.get(Bundle::ConsoleLink);
        substitutions.push(self.substitute_into(console_link, &set).await?);
        self.apply_bundle(console_link, namespace, desired.platform.component_name(), true)
            .await?;

        info!(url = %url, "Console link registered");
        Ok(())
    }

    /// Health gate, then alerting rules, then the monitoring bundle
    async fn wire_monitoring(
        &self,
        desired: &DesiredState,
        plan: &BundlePlan,
        log: &mut PassLog,
        cancel: &Cancellation,
    ) -> Result<u32> {
        let component = desired.platform.component_name();
        let gate = self.config.health_gate;

        let attempts = log.record(
            ReconcileStep::HealthProbe,
            self.gate
                .wait_healthy(
                    component,
                    &desired.applications_namespace,
                    gate.max_attempts,
                    gate.interval(),
                    cancel,
                )
                .await,
        )?;

        log.record(
            ReconcileStep::MonitoringRules,
            self.resources
                .update_prometheus_config(desired.monitoring_enabled, component)
                .await
                .map_err(|e| StepError::apply(format!("alerting rules for {component}"), e)),
        )?;

        log.record(
            ReconcileStep::MonitoringBundle,
            self.apply_bundle(
                plan.get(Bundle::MonitoringApps),
                &desired.monitoring_namespace,
                MONITORING_COMPONENT,
                true,
            )
            .await,
        )?;

        Ok(attempts)
    }

    async fn substitute_into(
        &self,
        bundle: &BundleRef,
        set: &SubstitutionSet,
    ) -> std::result::Result<SubstitutionReport, StepError> {
        let path = bundle
            .substitution_file()
            .ok_or_else(|| SubstitutionError::Missing(bundle.effective_path().to_path_buf()))?;
        let report = self.substitutor.substitute(&path, set).await?;
        debug!(
            bundle = %bundle.bundle,
            replaced = ?report.replaced,
            absent = ?report.absent,
            "Placeholders substituted"
        );
        Ok(report)
    }

    async fn apply_bundle(
        &self,
        bundle: &BundleRef,
        namespace: &str,
        component: &str,
        enabled: bool,
    ) -> std::result::Result<(), StepError> {
        self.deployer
            .apply_manifest_bundle(bundle, namespace, component, enabled)
            .await
            .map_err(|e| StepError::apply(bundle_target(bundle), e))?;
        debug!(bundle = %bundle.bundle, enabled, "Bundle applied");
        Ok(())
    }
}

fn bundle_target(bundle: &BundleRef) -> String {
    format!("bundle {} from {}", bundle.logical_name(), bundle.effective_path().display())
}

/// Domain a route host lives under: everything after the first `.`
///
/// A host without a dot is its own domain.
pub fn parent_domain(host: &str) -> &str {
    host.split_once('.').map_or(host, |(_, domain)| domain)
}

/// Public dashboard URL derived from the console route host
pub fn dashboard_url(namespace: &str, console_host: &str) -> String {
    format!("https://rhods-dashboard-{namespace}.{}", parent_domain(console_host))
}
