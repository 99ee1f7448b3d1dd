//! Typed placeholder substitutions for configuration manifests
//!
//! Placeholders are a closed set so a manifest that still carries one after
//! substitution can be detected instead of being applied half-configured.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholders the dashboard's config manifests may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubstitutionToken {
    /// Groups allowed to administer the dashboard
    AdminGroups,
    /// Public URL of the dashboard route
    DashboardUrl,
    /// Console navigation section the link is listed under
    SectionTitle,
}

impl SubstitutionToken {
    pub const ALL: [SubstitutionToken; 3] = [
        SubstitutionToken::AdminGroups,
        SubstitutionToken::DashboardUrl,
        SubstitutionToken::SectionTitle,
    ];

    /// Literal text of the placeholder inside the manifest
    pub fn placeholder(&self) -> &'static str {
        match self {
            SubstitutionToken::AdminGroups => "<admin_groups>",
            SubstitutionToken::DashboardUrl => "<rhods-dashboard-url>",
            SubstitutionToken::SectionTitle => "<section-title>",
        }
    }
}

impl std::fmt::Display for SubstitutionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.placeholder())
    }
}

/// Replacement values keyed by placeholder; each token appears at most once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionSet {
    values: BTreeMap<SubstitutionToken, String>,
}

impl SubstitutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a replacement, overwriting an earlier value for the same token
    pub fn with(mut self, token: SubstitutionToken, value: impl Into<String>) -> Self {
        self.values.insert(token, value.into());
        self
    }

    pub fn get(&self, token: SubstitutionToken) -> Option<&str> {
        self.values.get(&token).map(String::as_str)
    }

    pub fn contains(&self, token: SubstitutionToken) -> bool {
        self.values.contains_key(&token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubstitutionToken, &str)> {
        self.values.iter().map(|(token, value)| (*token, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Apply every replacement to `content`, returning the new text and
    /// the tokens that were actually present
    pub fn apply_to(&self, content: &str) -> (String, Vec<SubstitutionToken>) {
        let mut output = content.to_string();
        let mut replaced = Vec::new();
        for (token, value) in self.iter() {
            if output.contains(token.placeholder()) {
                output = output.replace(token.placeholder(), value);
                replaced.push(token);
            }
        }
        (output, replaced)
    }

    /// Known placeholders still present in `content` that this set cannot fill
    pub fn unresolved_in(&self, content: &str) -> Vec<SubstitutionToken> {
        SubstitutionToken::ALL
            .into_iter()
            .filter(|token| content.contains(token.placeholder()) && !self.contains(*token))
            .collect()
    }
}
