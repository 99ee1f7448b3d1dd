//! Credential cleanup on the not-installed to installed transition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cluster::ClusterResources;
use crate::error::StepError;

/// What the cleanup agent did during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CleanupOutcome {
    /// Not part of this pass (dashboard removed).
    #[default]
    NotRun,
    /// A prior instance exists; its credential is still in use.
    Skipped,
    /// Nothing was left behind.
    AlreadyClean,
    /// A stale credential was deleted.
    Purged,
}

/// Removes the OAuth client credential a previous install left behind.
pub struct CleanupAgent {
    resources: Arc<dyn ClusterResources>,
}

impl CleanupAgent {
    pub fn new(resources: Arc<dyn ClusterResources>) -> Self {
        Self { resources }
    }

    /// Purge the credential unless a prior instance still owns it.
    ///
    /// "Not found" on either the lookup or the delete means the credential
    /// is already gone and counts as success.
    #[instrument(skip(self))]
    pub async fn purge_if_transitioning(
        &self,
        credential_name: &str,
        namespace: &str,
        prior_instance_existed: bool,
    ) -> Result<CleanupOutcome, StepError> {
        if prior_instance_existed {
            return Ok(CleanupOutcome::Skipped);
        }

        let cleanup_err = |source| StepError::Cleanup {
            credential: format!("{namespace}/{credential_name}"),
            source,
        };

        let credential = match self
            .resources
            .get_credential(credential_name, namespace)
            .await
        {
            Ok(credential) => credential,
            Err(e) if e.is_not_found() => return Ok(CleanupOutcome::AlreadyClean),
            Err(e) => return Err(cleanup_err(e)),
        };

        match self.resources.delete_credential(&credential).await {
            Ok(()) => {
                info!(credential = %credential, "Stale credential from previous install removed");
                Ok(CleanupOutcome::Purged)
            }
            Err(e) if e.is_not_found() => Ok(CleanupOutcome::AlreadyClean),
            Err(e) => Err(cleanup_err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ClusterCall, FailurePoint, InMemoryCluster};

    const NAME: &str = "dashboard-oauth-client";
    const NS: &str = "opendatahub";

    #[tokio::test]
    async fn test_prior_instance_is_a_no_op() {
        let cluster = Arc::new(InMemoryCluster::new().with_credential(NAME, NS));
        let outcome = CleanupAgent::new(cluster.clone())
            .purge_if_transitioning(NAME, NS, true)
            .await
            .unwrap();

        assert_eq!(outcome, CleanupOutcome::Skipped);
        assert!(cluster.calls().is_empty());
        assert!(cluster.has_credential(NAME, NS));
    }

    #[tokio::test]
    async fn test_purges_existing_credential() {
        let cluster = Arc::new(InMemoryCluster::new().with_credential(NAME, NS));
        let outcome = CleanupAgent::new(cluster.clone())
            .purge_if_transitioning(NAME, NS, false)
            .await
            .unwrap();

        assert_eq!(outcome, CleanupOutcome::Purged);
        assert!(!cluster.has_credential(NAME, NS));
        assert!(matches!(
            cluster.calls().last(),
            Some(ClusterCall::DeleteCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_absent_credential_is_success() {
        let cluster = Arc::new(InMemoryCluster::new());
        let outcome = CleanupAgent::new(cluster.clone())
            .purge_if_transitioning(NAME, NS, false)
            .await
            .unwrap();

        assert_eq!(outcome, CleanupOutcome::AlreadyClean);
        assert_eq!(cluster.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_error_is_fatal() {
        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_credential(NAME, NS)
                .with_failure(FailurePoint::GetCredential, "forbidden"),
        );
        let err = CleanupAgent::new(cluster)
            .purge_if_transitioning(NAME, NS, false)
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Cleanup { .. }));
    }

    #[tokio::test]
    async fn test_delete_error_is_fatal() {
        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_credential(NAME, NS)
                .with_failure(FailurePoint::DeleteCredential, "conflict"),
        );
        let err = CleanupAgent::new(cluster.clone())
            .purge_if_transitioning(NAME, NS, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "cleanup");
        assert!(cluster.has_credential(NAME, NS));
    }
}
