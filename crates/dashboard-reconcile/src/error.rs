//! Error types for dashboard-reconcile.
//!
//! Collaborator failures are reported as [`ClusterError`]; each pass step
//! wraps them into a [`StepError`], and the orchestrator tags the first
//! failing step with its identity in [`ReconcileError`].

use std::path::PathBuf;

use dashboard_types::{Bundle, PassId, ReconcileStep, SubstitutionToken, UnknownPlatformError};
use thiserror::Error;

/// Errors returned by cluster collaborators.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The requested object does not exist.
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    /// The cluster rejected or failed the request.
    #[error("cluster API error: {0}")]
    Api(String),

    /// Local filesystem failure while staging manifests.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    pub fn not_found(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        ClusterError::NotFound {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}

/// Result type for collaborator calls.
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Platform detection failures.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The detection probe itself failed.
    #[error("platform probe failed: {0}")]
    Probe(#[source] ClusterError),

    /// The probe answered with an identity outside the known set.
    #[error(transparent)]
    Unrecognised(#[from] UnknownPlatformError),
}

/// Placeholder substitution failures.
#[derive(Debug, Error)]
pub enum SubstitutionError {
    /// Target file does not exist.
    #[error("substitution target {0} is missing")]
    Missing(PathBuf),

    /// Target file could not be read or written.
    #[error("substitution target {path} is not writable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Placeholders would remain after substitution.
    #[error("substitution target {path} still contains unresolved placeholders {tokens:?}")]
    UnresolvedToken {
        path: PathBuf,
        tokens: Vec<SubstitutionToken>,
    },
}

/// Failure of a single pass step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("platform detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("failed to fetch override manifests for {bundle} from {uri}: {source}")]
    Fetch {
        bundle: Bundle,
        uri: String,
        #[source]
        source: ClusterError,
    },

    #[error("substitution failed: {0}")]
    Substitution(#[from] SubstitutionError),

    #[error("dependency {dependency} is not ready: {source}")]
    DependencyNotReady {
        dependency: String,
        #[source]
        source: ClusterError,
    },

    #[error("deployment {target} not healthy after {attempts} attempts")]
    HealthProbeTimeout {
        target: String,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("failed to apply {target}: {source}")]
    Apply {
        target: String,
        #[source]
        source: ClusterError,
    },

    #[error("credential cleanup failed for {credential}: {source}")]
    Cleanup {
        credential: String,
        #[source]
        source: ClusterError,
    },

    #[error("cancelled while {operation}")]
    Cancelled { operation: String },
}

impl StepError {
    pub(crate) fn apply(target: impl Into<String>, source: ClusterError) -> Self {
        StepError::Apply {
            target: target.into(),
            source,
        }
    }

    /// Short taxonomy name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Detection(_) => "detection",
            StepError::Fetch { .. } => "fetch",
            StepError::Substitution(_) => "substitution",
            StepError::DependencyNotReady { .. } => "dependency-not-ready",
            StepError::HealthProbeTimeout { .. } => "health-probe-timeout",
            StepError::Apply { .. } => "apply",
            StepError::Cleanup { .. } => "cleanup",
            StepError::Cancelled { .. } => "cancelled",
        }
    }
}

/// A failed reconciliation pass, tagged with the step that aborted it.
#[derive(Debug, Error)]
#[error("{pass_id} failed at step {step}: {source}")]
pub struct ReconcileError {
    pub pass_id: PassId,
    pub step: ReconcileStep,
    #[source]
    pub source: StepError,
}

impl ReconcileError {
    pub fn step(&self) -> ReconcileStep {
        self.step
    }

    pub fn cause(&self) -> &StepError {
        &self.source
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, StepError::Cancelled { .. })
    }
}

/// Result type for reconciliation passes.
pub type Result<T> = std::result::Result<T, ReconcileError>;
