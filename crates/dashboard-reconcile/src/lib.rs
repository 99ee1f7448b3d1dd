//! Dashboard Reconcile - Reconciliation engine for the dashboard component
//!
//! Drives the dashboard's cluster footprint toward its declared state:
//! classifies the platform, resolves manifest bundles, patches their
//! configuration, applies them in order and gates monitoring on the
//! deployment's health.
//!
//! ## Architectural Boundaries
//!
//! - `dashboard-types` owns: the data flowing through a pass
//! - `dashboard-reconcile` owns: step ordering, per-platform branching, failure tagging
//! - collaborators own: manifest rendering, cluster API access, archive download
//!
//! ## Key Principle
//!
//! The engine only talks to the cluster through the traits in [`cluster`].
//! A pass is a pure sequence of calls on them; [`memory::InMemoryCluster`]
//! implements all of them for simulation and tests.
//!
//! ## Usage
//!
//! ```no_run
//! use dashboard_reconcile::{Cancellation, DashboardReconciler, InMemoryCluster, ReconcilerConfig};
//! use dashboard_types::DashboardSpec;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = Arc::new(InMemoryCluster::new().with_platform("Open Data Hub"));
//! let reconciler = DashboardReconciler::new(ReconcilerConfig::default(), cluster);
//!
//! let report = reconciler
//!     .reconcile(&DashboardSpec::managed(), false, &Cancellation::never())
//!     .await?;
//! println!("{} steps", report.steps.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cancel;
pub mod cleanup;
pub mod cluster;
pub mod config;
pub mod error;
pub mod manifests;
pub mod memory;
pub mod monitoring;
pub mod platform;
pub mod reconciler;
pub mod substitution;

pub use cancel::Cancellation;
pub use cleanup::{CleanupAgent, CleanupOutcome};
pub use cluster::{
    ClusterResources, Credential, DeploymentProbe, ManifestDeployer, ManifestSource,
    PlatformDetector,
};
pub use config::{HealthGateConfig, ReconcilerConfig, RouteRef};
pub use error::{
    ClusterError, ClusterResult, DetectionError, ReconcileError, Result, StepError,
    SubstitutionError,
};
pub use manifests::{BundlePlan, ManifestLocator};
pub use memory::{ClusterCall, FailurePoint, InMemoryCluster};
pub use monitoring::MonitoringGate;
pub use platform::PlatformClassifier;
pub use reconciler::{dashboard_url, parent_domain, DashboardReconciler, ReconcileReport};
pub use substitution::{ParameterSubstitutor, SubstitutionReport};
