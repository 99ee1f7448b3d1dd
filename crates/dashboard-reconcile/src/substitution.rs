//! In-place placeholder substitution for configuration manifests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dashboard_types::{SubstitutionSet, SubstitutionToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::SubstitutionError;

/// What a substitution did to its target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionReport {
    pub path: PathBuf,
    /// Tokens found and replaced.
    pub replaced: Vec<SubstitutionToken>,
    /// Tokens in the set with no placeholder left in the file, typically
    /// because an earlier pass already replaced them.
    pub absent: Vec<SubstitutionToken>,
}

impl SubstitutionReport {
    pub fn changed(&self) -> bool {
        !self.replaced.is_empty()
    }
}

/// Replaces placeholder tokens in a manifest file before it is applied.
///
/// The file is either fully substituted or left untouched: unresolved
/// placeholders abort before anything is written, and the new content
/// replaces the old through a rename.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterSubstitutor;

impl ParameterSubstitutor {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, set), fields(path = %path.display()))]
    pub async fn substitute(
        &self,
        path: &Path,
        set: &SubstitutionSet,
    ) -> Result<SubstitutionReport, SubstitutionError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SubstitutionError::Missing(path.to_path_buf()))
            }
            Err(source) => {
                return Err(SubstitutionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let unresolved = set.unresolved_in(&content);
        if !unresolved.is_empty() {
            return Err(SubstitutionError::UnresolvedToken {
                path: path.to_path_buf(),
                tokens: unresolved,
            });
        }

        let (output, replaced) = set.apply_to(&content);
        let absent = set
            .iter()
            .map(|(token, _)| token)
            .filter(|token| !replaced.contains(token))
            .collect();

        if !replaced.is_empty() {
            write_replacing(path, &output).await?;
        }

        debug!(replaced = ?replaced, absent = ?absent, "Substitution complete");
        Ok(SubstitutionReport {
            path: path.to_path_buf(),
            replaced,
            absent,
        })
    }
}

async fn write_replacing(path: &Path, content: &str) -> Result<(), SubstitutionError> {
    let io_err = |source| SubstitutionError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut staging = path.as_os_str().to_owned();
    staging.push(".subst");
    let staging = PathBuf::from(staging);

    tokio::fs::write(&staging, content).await.map_err(io_err)?;
    if let Err(source) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(io_err(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console_set() -> SubstitutionSet {
        SubstitutionSet::new()
            .with(
                SubstitutionToken::DashboardUrl,
                "https://rhods-dashboard-ns.apps.example.com",
            )
            .with(SubstitutionToken::SectionTitle, "OpenShift Managed Services")
    }

    #[tokio::test]
    async fn test_replaces_all_tokens_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consolelink.yaml");
        std::fs::write(
            &path,
            "href: <rhods-dashboard-url>\nsection: <section-title>\n",
        )
        .unwrap();

        let report = ParameterSubstitutor::new()
            .substitute(&path, &console_set())
            .await
            .unwrap();

        assert!(report.changed());
        assert!(report.absent.is_empty());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "href: https://rhods-dashboard-ns.apps.example.com\nsection: OpenShift Managed Services\n"
        );
        assert!(!dir.path().join("consolelink.yaml.subst").exists());
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consolelink.yaml");
        std::fs::write(&path, "href: <rhods-dashboard-url>\nsection: <section-title>\n").unwrap();

        let substitutor = ParameterSubstitutor::new();
        substitutor.substitute(&path, &console_set()).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let report = substitutor.substitute(&path, &console_set()).await.unwrap();
        assert!(!report.changed());
        assert_eq!(report.absent.len(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ParameterSubstitutor::new()
            .substitute(&dir.path().join("nope.yaml"), &console_set())
            .await
            .unwrap_err();
        assert!(matches!(err, SubstitutionError::Missing(_)));
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consolelink.yaml");
        let original = "href: <rhods-dashboard-url>\nsection: <section-title>\n";
        std::fs::write(&path, original).unwrap();

        let partial = SubstitutionSet::new().with(SubstitutionToken::DashboardUrl, "https://x");
        let err = ParameterSubstitutor::new()
            .substitute(&path, &partial)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubstitutionError::UnresolvedToken { ref tokens, .. }
                if tokens == &vec![SubstitutionToken::SectionTitle]
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
