//! Parameter reconciliation for one rule under synchronization.

use std::collections::HashSet;

use lintel_core::catalog::{DeclaredParam, DeclaredRule};
use lintel_core::entities::{RuleDef, RuleParam};

use crate::error::ReconcileError;
use crate::pass::SyncPass;

impl SyncPass<'_> {
    /// Bring the persisted parameter set of `rule` in line with the
    /// declaration.
    ///
    /// Runs for every registered rule, freshly created or merged. Dropped
    /// parameters cascade to the per-activation overrides that referenced
    /// them; new parameters with a non-empty default propagate that default
    /// to every profile where the rule is already switched on.
    pub(crate) async fn merge_params(
        &mut self,
        decl: &DeclaredRule,
        rule: &RuleDef,
    ) -> Result<(), ReconcileError> {
        let persisted = self.store.select_params_by_rule_key(&rule.key()).await?;
        let mut kept: HashSet<String> = HashSet::new();

        for mut param in persisted {
            match decl.param(&param.name) {
                None => {
                    self.store
                        .delete_active_param_overrides(&rule.id, &param.name)
                        .await?;
                    self.store.delete_param(&rule.id, &param.name).await?;
                }
                Some(declared) => {
                    if merge_param(&mut param, declared) {
                        self.store.update_param(&param).await?;
                    }
                    kept.insert(param.name);
                }
            }
        }

        for declared in &decl.params {
            if kept.contains(&declared.name) {
                continue;
            }
            let param = RuleParam {
                rule_id: rule.id.clone(),
                name: declared.name.clone(),
                kind: declared.kind,
                default_value: declared.default_value.clone(),
                description: declared.description.clone(),
            };
            self.store.insert_param(&param).await?;

            let Some(default) = declared.default_value.as_deref().filter(|v| !v.is_empty())
            else {
                continue;
            };
            // Pre-existing activations gain the new parameter's default
            // rather than silently lacking it.
            for active in self.store.select_active_rules_by_rule_id(&rule.id).await? {
                self.store
                    .insert_active_param_override(&active.id, &declared.name, default)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Diff a persisted parameter against its declaration.
pub(crate) fn merge_param(param: &mut RuleParam, declared: &DeclaredParam) -> bool {
    let mut changed = false;
    if param.kind != declared.kind {
        param.kind = declared.kind;
        changed = true;
    }
    if param.default_value != declared.default_value {
        param.default_value = declared.default_value.clone();
        changed = true;
    }
    if param.description != declared.description {
        param.description = declared.description.clone();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{catalog, decl, mem_store, repo, sync};
    use lintel_core::enums::{ParamKind, Severity};
    use pretty_assertions::assert_eq;

    fn param(name: &str, default: Option<&str>) -> DeclaredParam {
        DeclaredParam {
            name: name.to_string(),
            kind: ParamKind::Integer,
            default_value: default.map(ToString::to_string),
            description: Some(format!("param {name}")),
        }
    }

    #[test]
    fn merge_param_diffs_each_field() {
        let mut persisted = RuleParam {
            rule_id: "rul-1".to_string(),
            name: "max".to_string(),
            kind: ParamKind::String,
            default_value: Some("10".to_string()),
            description: None,
        };
        let declared = param("max", Some("20"));

        assert!(merge_param(&mut persisted, &declared));
        assert_eq!(persisted.kind, ParamKind::Integer);
        assert_eq!(persisted.default_value, Some("20".to_string()));
        assert!(!merge_param(&mut persisted, &declared));
    }

    #[tokio::test]
    async fn new_param_default_propagates_to_existing_activations() {
        let mut store = mem_store().await;
        let first = catalog(vec![repo("xoo", "xoo", vec![decl("R1")])]);
        sync(&mut store, &first).await;

        let rule = store
            .select_definition_by_key(&lintel_core::key::RuleKey::of("xoo", "R1"))
            .await
            .unwrap()
            .unwrap();
        let p1 = store.create_profile("One", "xoo").await.unwrap();
        let p2 = store.create_profile("Two", "xoo").await.unwrap();
        let a1 = store.activate_rule(&p1.id, &rule.id, Severity::Major).await.unwrap();
        let a2 = store.activate_rule(&p2.id, &rule.id, Severity::Minor).await.unwrap();
        store.commit().await.unwrap();

        let mut with_param = decl("R1");
        with_param.params.push(param("max", Some("42")));
        let second = catalog(vec![repo("xoo", "xoo", vec![with_param])]);
        sync(&mut store, &second).await;

        for active_id in [&a1.id, &a2.id] {
            let overrides = store.select_active_params(active_id).await.unwrap();
            assert_eq!(overrides.len(), 1);
            assert_eq!(overrides[0].name, "max");
            assert_eq!(overrides[0].value, "42");
        }
    }

    #[tokio::test]
    async fn empty_default_does_not_propagate() {
        let mut store = mem_store().await;
        sync(&mut store, &catalog(vec![repo("xoo", "xoo", vec![decl("R1")])])).await;

        let rule = store
            .select_definition_by_key(&lintel_core::key::RuleKey::of("xoo", "R1"))
            .await
            .unwrap()
            .unwrap();
        let profile = store.create_profile("One", "xoo").await.unwrap();
        let active = store
            .activate_rule(&profile.id, &rule.id, Severity::Major)
            .await
            .unwrap();
        store.commit().await.unwrap();

        let mut with_param = decl("R1");
        with_param.params.push(param("threshold", None));
        sync(&mut store, &catalog(vec![repo("xoo", "xoo", vec![with_param])])).await;

        assert!(store.select_active_params(&active.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropped_param_cascades_to_overrides() {
        let mut store = mem_store().await;
        let mut with_param = decl("R1");
        with_param.params.push(param("max", Some("10")));
        sync(&mut store, &catalog(vec![repo("xoo", "xoo", vec![with_param])])).await;

        let rule = store
            .select_definition_by_key(&lintel_core::key::RuleKey::of("xoo", "R1"))
            .await
            .unwrap()
            .unwrap();
        let profile = store.create_profile("One", "xoo").await.unwrap();
        let active = store
            .activate_rule(&profile.id, &rule.id, Severity::Major)
            .await
            .unwrap();
        store
            .insert_active_param_override(&active.id, "max", "99")
            .await
            .unwrap();
        store.commit().await.unwrap();

        sync(&mut store, &catalog(vec![repo("xoo", "xoo", vec![decl("R1")])])).await;

        assert!(
            store
                .select_params_by_rule_key(&rule.key())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.select_active_params(&active.id).await.unwrap().is_empty());
        // the activation itself survives, only the override is gone
        assert_eq!(
            store
                .select_active_rules_by_rule_id(&rule.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn param_declaration_change_updates_in_place() {
        let mut store = mem_store().await;
        let mut with_param = decl("R1");
        with_param.params.push(param("max", Some("10")));
        sync(&mut store, &catalog(vec![repo("xoo", "xoo", vec![with_param])])).await;

        let mut changed = decl("R1");
        changed.params.push(param("max", Some("20")));
        let second = catalog(vec![repo("xoo", "xoo", vec![changed])]);
        sync(&mut store, &second).await;

        let params = store
            .select_params_by_rule_key(&lintel_core::key::RuleKey::of("xoo", "R1"))
            .await
            .unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].default_value, Some("20".to_string()));

        // unchanged redeclaration settles
        let outcome = sync(&mut store, &second).await;
        assert!(outcome.is_noop());
    }
}
