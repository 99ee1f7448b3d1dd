//! Platform variants the dashboard can be deployed on
//!
//! Every platform maps to exactly one branch of the reconciliation pass:
//! - Open: upstream Open Data Hub bundle set (also used when detection is empty)
//! - Managed: downstream bundle set, split into self-managed and fully-managed

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::bundle::Bundle;

/// Platform identity reported for Open Data Hub clusters
pub const OPEN_DATA_HUB_IDENTITY: &str = "Open Data Hub";

/// Platform identity reported for self-managed downstream installs
pub const SELF_MANAGED_IDENTITY: &str = "OpenShift AI Self-Managed";

/// Platform identity reported for the fully-managed cloud service
pub const FULLY_MANAGED_IDENTITY: &str = "OpenShift AI Cloud Service";

/// Closed set of platforms the dashboard reconciles against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlatformVariant {
    /// Upstream Open Data Hub
    OpenDataHub,

    /// Downstream, operated by the cluster owner
    SelfManaged,

    /// Downstream cloud service, operated by the vendor
    ///
    /// The only variant that wires alerting, and therefore the only one
    /// that gates on dashboard health.
    FullyManaged,

    /// Detection reported no platform
    ///
    /// Reconciled with the open bundle set but never receives
    /// managed-only side effects.
    #[default]
    Unknown,
}

/// The two reconciliation branches a platform can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformBranch {
    /// Base bundle, open naming convention
    Open,
    /// Overlay bundle, managed naming convention and add-ons
    Managed,
}

/// Raised when the detected identity is not one of the known platforms
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised platform identity: {0:?}")]
pub struct UnknownPlatformError(pub String);

impl PlatformVariant {
    pub const ALL: [PlatformVariant; 4] = [
        PlatformVariant::OpenDataHub,
        PlatformVariant::SelfManaged,
        PlatformVariant::FullyManaged,
        PlatformVariant::Unknown,
    ];

    /// Select the reconciliation branch for this platform
    pub fn branch(&self) -> PlatformBranch {
        match self {
            PlatformVariant::OpenDataHub | PlatformVariant::Unknown => PlatformBranch::Open,
            PlatformVariant::SelfManaged | PlatformVariant::FullyManaged => {
                PlatformBranch::Managed
            }
        }
    }

    /// Component name the apply primitive records resources under
    pub fn component_name(&self) -> &'static str {
        match self.branch() {
            PlatformBranch::Open => "dashboard",
            PlatformBranch::Managed => "rhods-dashboard",
        }
    }

    /// Service account whose pod-security role binding is refreshed
    pub fn pod_security_account(&self) -> &'static str {
        match self.branch() {
            PlatformBranch::Open => "odh-dashboard",
            PlatformBranch::Managed => "rhods-dashboard",
        }
    }

    /// Group granted dashboard admin rights, managed variants only
    pub fn admin_group(&self) -> Option<&'static str> {
        match self {
            PlatformVariant::SelfManaged => Some("rhods-admins"),
            PlatformVariant::FullyManaged => Some("dedicated-admins"),
            PlatformVariant::OpenDataHub | PlatformVariant::Unknown => None,
        }
    }

    /// Console-link section title, managed variants only
    pub fn section_title(&self) -> Option<&'static str> {
        match self {
            PlatformVariant::SelfManaged => Some("OpenShift Self Managed Services"),
            PlatformVariant::FullyManaged => Some("OpenShift Managed Services"),
            PlatformVariant::OpenDataHub | PlatformVariant::Unknown => None,
        }
    }

    /// Add-on bundle layered on top of the primary bundle
    pub fn isv_bundle(&self) -> Option<Bundle> {
        match self {
            PlatformVariant::SelfManaged => Some(Bundle::IsvOnPrem),
            PlatformVariant::FullyManaged => Some(Bundle::IsvAddOn),
            PlatformVariant::OpenDataHub | PlatformVariant::Unknown => None,
        }
    }

    /// Whether monitoring changes must wait for the dashboard to be healthy
    pub fn requires_health_gate(&self) -> bool {
        matches!(self, PlatformVariant::FullyManaged)
    }

    /// Identity string as reported by platform detection
    pub fn identity(&self) -> &'static str {
        match self {
            PlatformVariant::OpenDataHub => OPEN_DATA_HUB_IDENTITY,
            PlatformVariant::SelfManaged => SELF_MANAGED_IDENTITY,
            PlatformVariant::FullyManaged => FULLY_MANAGED_IDENTITY,
            PlatformVariant::Unknown => "",
        }
    }
}

impl FromStr for PlatformVariant {
    type Err = UnknownPlatformError;

    /// Map a detected identity onto a variant. Empty means unknown.
    fn from_str(identity: &str) -> Result<Self, Self::Err> {
        let trimmed = identity.trim();
        if trimmed.is_empty() {
            return Ok(PlatformVariant::Unknown);
        }

        PlatformVariant::ALL
            .into_iter()
            .filter(|variant| *variant != PlatformVariant::Unknown)
            .find(|variant| variant.identity().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownPlatformError(trimmed.to_string()))
    }
}

impl std::fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformVariant::OpenDataHub => write!(f, "open-data-hub"),
            PlatformVariant::SelfManaged => write!(f, "self-managed"),
            PlatformVariant::FullyManaged => write!(f, "fully-managed"),
            PlatformVariant::Unknown => write!(f, "unknown"),
        }
    }
}
