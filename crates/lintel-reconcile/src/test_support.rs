//! Shared test utilities for reconciliation tests.

pub(crate) mod helpers {
    use std::collections::BTreeSet;

    use lintel_core::catalog::{DeclaredRepository, DeclaredRule, RuleCatalog};
    use lintel_core::languages::Languages;
    use lintel_db::RuleStore;

    use crate::SyncOutcome;

    /// In-memory store for pure reconciliation tests.
    pub async fn mem_store() -> RuleStore {
        RuleStore::open(":memory:").await.unwrap()
    }

    /// Minimal declaration with an HTML description.
    pub fn decl(key: &str) -> DeclaredRule {
        let mut rule = DeclaredRule::new(key, format!("Rule {key}"));
        rule.html_description = Some(format!("<p>{key}</p>"));
        rule
    }

    pub fn repo(key: &str, language: &str, rules: Vec<DeclaredRule>) -> DeclaredRepository {
        DeclaredRepository {
            key: key.to_string(),
            language: language.to_string(),
            name: format!("{key} repository"),
            extension: false,
            rules,
        }
    }

    pub fn catalog(repos: Vec<DeclaredRepository>) -> RuleCatalog {
        RuleCatalog::new(repos)
    }

    pub fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    /// Run a pass with the default test languages (xoo and java installed).
    pub async fn sync(store: &mut RuleStore, catalog: &RuleCatalog) -> SyncOutcome {
        crate::synchronize(store, catalog, &Languages::of(&["xoo", "java"]))
            .await
            .unwrap()
    }
}
