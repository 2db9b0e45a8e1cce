//! The declared rule catalog.
//!
//! Providers contribute repositories of rule declarations at load time.
//! The catalog is a flat sequence of repository records tagged primary or
//! extension — an extension carries the key of an existing primary
//! repository and contributes additional rules to it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::enums::{
    DescriptionFormat, ParamKind, RemediationFnKind, RuleStatus, RuleType, Severity,
};
use crate::key::RuleKey;

/// A parameter spec on a declared rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeclaredParam {
    pub name: String,
    #[serde(default)]
    pub kind: ParamKind,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A declared debt remediation function.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeclaredRemediation {
    pub kind: RemediationFnKind,
    #[serde(default)]
    pub gap_multiplier: Option<String>,
    #[serde(default)]
    pub base_effort: Option<String>,
}

/// A rule definition supplied by a provider, not yet reconciled against
/// storage.
///
/// Exactly one of `html_description` / `markdown_description` is expected
/// to be set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeclaredRule {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub html_description: Option<String>,
    #[serde(default)]
    pub markdown_description: Option<String>,
    #[serde(default)]
    pub config_key: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub remediation: Option<DeclaredRemediation>,
    #[serde(default)]
    pub gap_description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub params: Vec<DeclaredParam>,
}

impl DeclaredRule {
    /// Minimal declaration with defaults for everything but key and name.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            html_description: None,
            markdown_description: None,
            config_key: None,
            severity: Severity::default(),
            status: RuleStatus::default(),
            is_template: false,
            remediation: None,
            gap_description: None,
            tags: BTreeSet::new(),
            rule_type: RuleType::default(),
            params: Vec::new(),
        }
    }

    /// The declared description, HTML form winning when both are present.
    #[must_use]
    pub fn description(&self) -> Option<(DescriptionFormat, &str)> {
        if let Some(html) = self.html_description.as_deref() {
            Some((DescriptionFormat::Html, html))
        } else {
            self.markdown_description
                .as_deref()
                .map(|md| (DescriptionFormat::Markdown, md))
        }
    }

    /// Look up a declared parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&DeclaredParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A declared repository of rules.
///
/// `extension == true` marks a contribution to an existing primary
/// repository of the same `key` rather than a repository of its own.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeclaredRepository {
    pub key: String,
    pub language: String,
    pub name: String,
    #[serde(default)]
    pub extension: bool,
    #[serde(default)]
    pub rules: Vec<DeclaredRule>,
}

impl DeclaredRepository {
    /// Natural key of a rule declared in this repository.
    #[must_use]
    pub fn rule_key(&self, rule: &DeclaredRule) -> RuleKey {
        RuleKey::of(self.key.clone(), rule.key.clone())
    }
}

/// The full declared catalog for one synchronization pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RuleCatalog {
    pub repositories: Vec<DeclaredRepository>,
}

impl RuleCatalog {
    #[must_use]
    pub fn new(repositories: Vec<DeclaredRepository>) -> Self {
        Self { repositories }
    }

    /// Primary repositories in declaration order.
    pub fn primary(&self) -> impl Iterator<Item = &DeclaredRepository> {
        self.repositories.iter().filter(|r| !r.extension)
    }

    /// Look up a primary repository by key.
    #[must_use]
    pub fn repository(&self, key: &str) -> Option<&DeclaredRepository> {
        self.primary().find(|r| r.key == key)
    }

    /// Keys of all declared primary repositories.
    ///
    /// This is the set used to decide whether removing a rule cascades to
    /// its activations: extensions do not count.
    #[must_use]
    pub fn primary_keys(&self) -> BTreeSet<&str> {
        self.primary().map(|r| r.key.as_str()).collect()
    }

    /// Repositories to process, in order: primaries first, then extensions
    /// whose target primary exists. Orphan extensions are excluded with a
    /// warning.
    #[must_use]
    pub fn repositories_for_sync(&self) -> Vec<&DeclaredRepository> {
        let mut repos: Vec<&DeclaredRepository> = self.primary().collect();
        for ext in self.repositories.iter().filter(|r| r.extension) {
            if self.repository(&ext.key).is_none() {
                tracing::warn!(
                    repository = %ext.key,
                    "extension is ignored, repository does not exist"
                );
            } else {
                repos.push(ext);
            }
        }
        repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(key: &str, extension: bool) -> DeclaredRepository {
        DeclaredRepository {
            key: key.to_string(),
            language: "xoo".to_string(),
            name: format!("{key} repo"),
            extension,
            rules: Vec::new(),
        }
    }

    #[test]
    fn orphan_extensions_are_excluded() {
        let catalog = RuleCatalog::new(vec![
            repo("xoo", false),
            repo("xoo", true),
            repo("ghost", true),
        ]);

        let keys: Vec<(&str, bool)> = catalog
            .repositories_for_sync()
            .iter()
            .map(|r| (r.key.as_str(), r.extension))
            .collect();
        assert_eq!(keys, vec![("xoo", false), ("xoo", true)]);
    }

    #[test]
    fn primary_keys_ignore_extensions() {
        let catalog = RuleCatalog::new(vec![repo("xoo", false), repo("other", true)]);
        assert_eq!(catalog.primary_keys(), BTreeSet::from(["xoo"]));
    }

    #[test]
    fn description_prefers_html() {
        let mut rule = DeclaredRule::new("R1", "One");
        assert_eq!(rule.description(), None);

        rule.markdown_description = Some("*md*".to_string());
        assert_eq!(rule.description(), Some((DescriptionFormat::Markdown, "*md*")));

        rule.html_description = Some("<p>html</p>".to_string());
        assert_eq!(rule.description(), Some((DescriptionFormat::Html, "<p>html</p>")));
    }

    #[test]
    fn catalog_roundtrips_through_json() {
        let mut rule = DeclaredRule::new("R1", "One");
        rule.html_description = Some("<p>d</p>".to_string());
        rule.params.push(DeclaredParam {
            name: "max".to_string(),
            kind: ParamKind::Integer,
            default_value: Some("10".to_string()),
            description: None,
        });
        let mut repository = repo("xoo", false);
        repository.rules.push(rule);
        let catalog = RuleCatalog::new(vec![repository]);

        let json = serde_json::to_string(&catalog).unwrap();
        let back: RuleCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
