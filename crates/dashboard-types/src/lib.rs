//! Dashboard Types - Core types for the dashboard reconciliation engine
//!
//! The dashboard component is brought into line with a declared desired
//! state by a reconciliation pass. This crate holds the data that flows
//! through a pass and nothing that performs I/O.
//!
//! ## Key Concepts
//!
//! - **DashboardSpec**: What the cluster asks for (enabled, overrides, namespaces)
//! - **DesiredState**: Immutable per-pass snapshot: spec + classified platform
//! - **PlatformVariant**: Closed set of platforms, each with its own bundle set
//! - **BundleRef**: Resolved on-disk location of one manifest bundle
//! - **SubstitutionSet**: Typed placeholder replacements for config manifests
//! - **ReconcileStep**: Identity of each step, used to tag failures

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod bundle;
pub mod ids;
pub mod platform;
pub mod spec;
pub mod step;
pub mod substitution;

// Re-export main types
pub use bundle::{Bundle, BundleRef};
pub use ids::PassId;
pub use platform::{PlatformBranch, PlatformVariant, UnknownPlatformError};
pub use spec::{DashboardSpec, DesiredState, DevOverride, ManagementState};
pub use step::ReconcileStep;
pub use substitution::{SubstitutionSet, SubstitutionToken};
