//! Command handlers.

use std::path::Path;

use anyhow::Context;

use lintel_core::catalog::RuleCatalog;
use lintel_core::languages::Languages;
use lintel_db::RuleStore;

use crate::cli::{RulesArgs, SyncArgs};

pub async fn sync(db_path: &str, args: &SyncArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    tracing::debug!(
        repositories = catalog.repositories.len(),
        "declared catalog loaded"
    );
    let languages: Languages = if args.languages.is_empty() {
        catalog
            .repositories
            .iter()
            .map(|r| r.language.clone())
            .collect()
    } else {
        args.languages.iter().cloned().collect()
    };

    let mut store = RuleStore::open(db_path)
        .await
        .context("failed to open rule store")?;
    let outcome = lintel_reconcile::synchronize(&mut store, &catalog, &languages)
        .await
        .context("rule synchronization failed")?;

    println!(
        "synchronized: {} created, {} updated, {} removed",
        outcome.created,
        outcome.updated,
        outcome.removed.len()
    );
    for change in &outcome.active_rule_changes {
        println!(
            "deactivated {} in profile {}",
            change.rule_key, change.profile_id
        );
    }
    Ok(())
}

pub async fn repos(db_path: &str) -> anyhow::Result<()> {
    let store = RuleStore::open(db_path).await?;
    for repo in store.select_repositories().await? {
        println!("{}\t{}\t{}", repo.key, repo.language, repo.name);
    }
    Ok(())
}

pub async fn rules(db_path: &str, args: &RulesArgs) -> anyhow::Result<()> {
    let store = RuleStore::open(db_path).await?;
    for rule in store.select_all_definitions().await? {
        if args.repo.as_deref().is_some_and(|r| r != rule.repo_key) {
            continue;
        }
        println!("{}\t{}\t{}", rule.key(), rule.status, rule.name);
    }
    Ok(())
}

fn load_catalog(path: &Path) -> anyhow::Result<RuleCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw).context("invalid JSON catalog")
    } else {
        toml::from_str(&raw).context("invalid TOML catalog")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::enums::{ParamKind, Severity};
    use pretty_assertions::assert_eq;

    #[test]
    fn load_catalog_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
            [[repositories]]
            key = "xoo"
            language = "xoo"
            name = "Xoo"

            [[repositories.rules]]
            key = "R1"
            name = "Rule one"
            html_description = "<p>one</p>"
            severity = "critical"
            tags = ["convention"]

            [[repositories.rules.params]]
            name = "max"
            kind = "integer"
            default_value = "10"
            "#,
        )
        .unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.repositories.len(), 1);
        let rule = &catalog.repositories[0].rules[0];
        assert_eq!(rule.severity, Severity::Critical);
        assert_eq!(rule.params[0].kind, ParamKind::Integer);
        assert_eq!(rule.params[0].default_value, Some("10".to_string()));
    }

    #[test]
    fn load_catalog_parses_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"repositories": [{"key": "xoo", "language": "xoo", "name": "Xoo",
                "rules": [{"key": "R1", "name": "One", "markdown_description": "*one*"}]}]}"#,
        )
        .unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.repositories[0].rules[0].key, "R1");
    }
}
