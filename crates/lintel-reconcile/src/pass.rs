//! The synchronization pass: working set, repository loop, create/merge.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use lintel_core::catalog::{DeclaredRepository, DeclaredRule, RuleCatalog};
use lintel_core::entities::RuleDef;
use lintel_core::enums::RuleStatus;
use lintel_core::key::RuleKey;
use lintel_core::languages::Languages;
use lintel_db::RuleStore;

use crate::error::ReconcileError;
use crate::outcome::{ActiveRuleChange, SyncOutcome};

/// Reconcile persisted rule storage against the declared catalog.
///
/// Runs to completion in declaration order, committing per repository and
/// at the removal cadence described on [`crate`]. Returns the write
/// summary and the deactivation events for the downstream collaborators.
///
/// The caller must guarantee at most one pass in flight per store; the
/// pass exclusively owns the working set and the store for its duration.
///
/// # Errors
///
/// Returns `ReconcileError::Store` on the first storage failure and
/// `ReconcileError::Integrity` when continuing would corrupt cross-rule
/// relationships. Storage is left in the last-committed state.
pub async fn synchronize(
    store: &mut RuleStore,
    catalog: &RuleCatalog,
    languages: &Languages,
) -> Result<SyncOutcome, ReconcileError> {
    let mut pass = SyncPass::new(store, catalog, languages);
    pass.load_working_set().await?;
    pass.register_declared().await?;
    pass.process_residual().await?;
    pass.cascade_deactivations().await?;
    pass.persist_repositories().await?;

    let outcome = pass.into_outcome();
    tracing::debug!(
        created = outcome.created,
        updated = outcome.updated,
        removed = outcome.removed.len(),
        deactivated = outcome.active_rule_changes.len(),
        "rule synchronization finished"
    );
    Ok(outcome)
}

/// State of one synchronization pass.
///
/// Owns the in-memory working map of persisted rules; entries are claimed
/// (removed) as declared rules match them, and whatever remains afterwards
/// is the residual set.
pub(crate) struct SyncPass<'a> {
    pub(crate) store: &'a mut RuleStore,
    pub(crate) catalog: &'a RuleCatalog,
    pub(crate) languages: &'a Languages,
    pub(crate) working: HashMap<RuleKey, RuleDef>,
    pub(crate) created: usize,
    pub(crate) updated: usize,
    pub(crate) removed: Vec<RuleDef>,
    pub(crate) changes: Vec<ActiveRuleChange>,
}

impl<'a> SyncPass<'a> {
    pub(crate) fn new(
        store: &'a mut RuleStore,
        catalog: &'a RuleCatalog,
        languages: &'a Languages,
    ) -> Self {
        Self {
            store,
            catalog,
            languages,
            working: HashMap::new(),
            created: 0,
            updated: 0,
            removed: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub(crate) async fn load_working_set(&mut self) -> Result<(), ReconcileError> {
        for rule in self.store.select_all_definitions().await? {
            self.working.insert(rule.key(), rule);
        }
        Ok(())
    }

    /// Consume the declared catalog repository by repository, committing
    /// after each one.
    pub(crate) async fn register_declared(&mut self) -> Result<(), ReconcileError> {
        let catalog = self.catalog;
        for repo in catalog.repositories_for_sync() {
            if !self.languages.is_installed(&repo.language) {
                tracing::debug!(
                    repository = %repo.key,
                    language = %repo.language,
                    "language not installed, repository skipped"
                );
                // Claim the repository's persisted rules without touching
                // them: they stay as-is until the language comes back.
                self.working.retain(|key, _| key.repository != repo.key);
                continue;
            }
            for decl in &repo.rules {
                self.register_rule(repo, decl).await?;
            }
            self.store.commit().await?;
        }
        Ok(())
    }

    async fn register_rule(
        &mut self,
        repo: &DeclaredRepository,
        decl: &DeclaredRule,
    ) -> Result<(), ReconcileError> {
        let key = repo.rule_key(decl);
        let rule = match self.working.remove(&key) {
            Some(mut rule) => {
                let mut changed = merge_rule(decl, repo, &mut rule);
                changed |= merge_debt(decl, &mut rule);
                changed |= merge_tags(decl, &mut rule);
                if changed {
                    self.stamp_and_update(&mut rule).await?;
                    self.updated += 1;
                }
                rule
            }
            None => self.create_rule(repo, decl).await?,
        };
        self.merge_params(decl, &rule).await
    }

    async fn create_rule(
        &mut self,
        repo: &DeclaredRepository,
        decl: &DeclaredRule,
    ) -> Result<RuleDef, ReconcileError> {
        let key = repo.rule_key(decl);
        let (description_format, description) = decl.description().ok_or_else(|| {
            ReconcileError::Integrity(format!("declared rule {key} has no description"))
        })?;

        let now = Utc::now();
        let system_tags = if decl.status == RuleStatus::Removed {
            BTreeSet::new()
        } else {
            decl.tags.clone()
        };
        let rule = RuleDef {
            id: self.store.next_rule_id().await?,
            repo_key: repo.key.clone(),
            rule_key: decl.key.clone(),
            name: decl.name.clone(),
            description: description.to_string(),
            description_format,
            config_key: decl.config_key.clone(),
            severity: decl.severity,
            status: decl.status,
            is_template: decl.is_template,
            template_id: None,
            language: Some(repo.language.clone()),
            remediation_fn: decl.remediation.as_ref().map(|r| r.kind),
            remediation_gap_multiplier: decl
                .remediation
                .as_ref()
                .and_then(|r| r.gap_multiplier.clone()),
            remediation_base_effort: decl
                .remediation
                .as_ref()
                .and_then(|r| r.base_effort.clone()),
            // Gap description is only meaningful alongside a remediation
            // function; without one it is kept cleared.
            gap_description: if decl.remediation.is_some() {
                decl.gap_description.clone()
            } else {
                None
            },
            system_tags,
            rule_type: decl.rule_type,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_rule(&rule).await?;
        self.created += 1;
        Ok(rule)
    }

    /// Stamp `updated_at` and write the rule back, verifying the row is
    /// still there.
    pub(crate) async fn stamp_and_update(
        &mut self,
        rule: &mut RuleDef,
    ) -> Result<(), ReconcileError> {
        rule.updated_at = Utc::now();
        let affected = self.store.update_rule(rule).await?;
        if affected != 1 {
            return Err(ReconcileError::Integrity(format!(
                "rule {} vanished during synchronization",
                rule.key()
            )));
        }
        Ok(())
    }

    pub(crate) fn into_outcome(self) -> SyncOutcome {
        SyncOutcome {
            created: self.created,
            updated: self.updated,
            removed: self.removed.iter().map(RuleDef::key).collect(),
            active_rule_changes: self.changes,
        }
    }
}

/// Diff the scalar fields of a declaration against the persisted rule.
pub(crate) fn merge_rule(
    decl: &DeclaredRule,
    repo: &DeclaredRepository,
    rule: &mut RuleDef,
) -> bool {
    let mut changed = false;
    if rule.name != decl.name {
        rule.name = decl.name.clone();
        changed = true;
    }
    changed |= merge_description(decl, rule);
    if rule.config_key != decl.config_key {
        rule.config_key = decl.config_key.clone();
        changed = true;
    }
    if rule.severity != decl.severity {
        rule.severity = decl.severity;
        changed = true;
    }
    if rule.is_template != decl.is_template {
        rule.is_template = decl.is_template;
        changed = true;
    }
    if rule.status != decl.status {
        rule.status = decl.status;
        changed = true;
    }
    if rule.language.as_deref() != Some(repo.language.as_str()) {
        rule.language = Some(repo.language.clone());
        changed = true;
    }
    if rule.rule_type != decl.rule_type {
        rule.rule_type = decl.rule_type;
        changed = true;
    }
    changed
}

/// Adopt the declared description when its text differs, HTML form first.
fn merge_description(decl: &DeclaredRule, rule: &mut RuleDef) -> bool {
    let Some((format, text)) = decl.description() else {
        return false;
    };
    if rule.description == text {
        return false;
    }
    rule.description = text.to_string();
    rule.description_format = format;
    true
}

/// Diff the remediation function and gap description as one unit: a
/// declaration without a remediation function clears all four fields.
pub(crate) fn merge_debt(decl: &DeclaredRule, rule: &mut RuleDef) -> bool {
    let (target_fn, target_gap, target_effort, target_desc) = match &decl.remediation {
        Some(r) => (
            Some(r.kind),
            r.gap_multiplier.clone(),
            r.base_effort.clone(),
            decl.gap_description.clone(),
        ),
        None => (None, None, None, None),
    };

    let mut changed = false;
    if rule.remediation_fn != target_fn {
        rule.remediation_fn = target_fn;
        changed = true;
    }
    if rule.remediation_gap_multiplier != target_gap {
        rule.remediation_gap_multiplier = target_gap;
        changed = true;
    }
    if rule.remediation_base_effort != target_effort {
        rule.remediation_base_effort = target_effort;
        changed = true;
    }
    if rule.gap_description != target_desc {
        rule.gap_description = target_desc;
        changed = true;
    }
    changed
}

/// Replace the persisted system tag set when membership differs. A rule
/// declared `removed` gets its system tags forced empty regardless of the
/// declared set; end-user tags are not touched here.
pub(crate) fn merge_tags(decl: &DeclaredRule, rule: &mut RuleDef) -> bool {
    if decl.status == RuleStatus::Removed {
        if rule.system_tags.is_empty() {
            return false;
        }
        rule.system_tags.clear();
        true
    } else if rule.system_tags == decl.tags {
        false
    } else {
        rule.system_tags = decl.tags.clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::catalog::DeclaredRemediation;
    use lintel_core::enums::{DescriptionFormat, RemediationFnKind, RuleType, Severity};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn xoo_repo() -> DeclaredRepository {
        DeclaredRepository {
            key: "xoo".to_string(),
            language: "xoo".to_string(),
            name: "Xoo".to_string(),
            extension: false,
            rules: Vec::new(),
        }
    }

    fn decl(key: &str) -> DeclaredRule {
        let mut rule = DeclaredRule::new(key, format!("Rule {key}"));
        rule.html_description = Some(format!("<p>{key}</p>"));
        rule
    }

    fn persisted(decl: &DeclaredRule, repo: &DeclaredRepository) -> RuleDef {
        let now = Utc::now();
        RuleDef {
            id: "rul-1".to_string(),
            repo_key: repo.key.clone(),
            rule_key: decl.key.clone(),
            name: decl.name.clone(),
            description: decl.html_description.clone().unwrap(),
            description_format: DescriptionFormat::Html,
            config_key: decl.config_key.clone(),
            severity: decl.severity,
            status: decl.status,
            is_template: decl.is_template,
            template_id: None,
            language: Some(repo.language.clone()),
            remediation_fn: None,
            remediation_gap_multiplier: None,
            remediation_base_effort: None,
            gap_description: None,
            system_tags: decl.tags.clone(),
            rule_type: decl.rule_type,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn merge_is_a_noop_for_identical_declaration() {
        let repo = xoo_repo();
        let declared = decl("R1");
        let mut rule = persisted(&declared, &repo);

        assert!(!merge_rule(&declared, &repo, &mut rule));
        assert!(!merge_debt(&declared, &mut rule));
        assert!(!merge_tags(&declared, &mut rule));
    }

    #[rstest]
    #[case::severity(|d: &mut DeclaredRule| d.severity = Severity::Blocker)]
    #[case::name(|d: &mut DeclaredRule| d.name = "Renamed".to_string())]
    #[case::status(|d: &mut DeclaredRule| d.status = RuleStatus::Deprecated)]
    #[case::rule_type(|d: &mut DeclaredRule| d.rule_type = RuleType::Bug)]
    #[case::template(|d: &mut DeclaredRule| d.is_template = true)]
    #[case::config_key(|d: &mut DeclaredRule| d.config_key = Some("cfg".to_string()))]
    fn merge_detects_scalar_diffs(#[case] mutate: fn(&mut DeclaredRule)) {
        let repo = xoo_repo();
        let mut declared = decl("R1");
        let mut rule = persisted(&declared, &repo);

        mutate(&mut declared);
        assert!(merge_rule(&declared, &repo, &mut rule));
        // a second merge of the same declaration settles
        assert!(!merge_rule(&declared, &repo, &mut rule));
    }

    #[test]
    fn merge_description_switches_form() {
        let repo = xoo_repo();
        let mut declared = decl("R1");
        let mut rule = persisted(&declared, &repo);

        declared.html_description = None;
        declared.markdown_description = Some("*now markdown*".to_string());
        assert!(merge_rule(&declared, &repo, &mut rule));
        assert_eq!(rule.description, "*now markdown*");
        assert_eq!(rule.description_format, DescriptionFormat::Markdown);
    }

    #[test]
    fn merge_debt_clears_all_fields_when_undeclared() {
        let declared = decl("R1");
        let repo = xoo_repo();
        let mut rule = persisted(&declared, &repo);
        rule.remediation_fn = Some(RemediationFnKind::Linear);
        rule.remediation_gap_multiplier = Some("5min".to_string());
        rule.gap_description = Some("per file".to_string());

        assert!(merge_debt(&declared, &mut rule));
        assert_eq!(rule.remediation_fn, None);
        assert_eq!(rule.remediation_gap_multiplier, None);
        assert_eq!(rule.gap_description, None);
    }

    #[test]
    fn merge_debt_adopts_declared_function() {
        let mut declared = decl("R1");
        declared.remediation = Some(DeclaredRemediation {
            kind: RemediationFnKind::LinearOffset,
            gap_multiplier: Some("5min".to_string()),
            base_effort: Some("10min".to_string()),
        });
        declared.gap_description = Some("per issue".to_string());
        let repo = xoo_repo();
        let mut rule = persisted(&decl("R1"), &repo);

        assert!(merge_debt(&declared, &mut rule));
        assert_eq!(rule.remediation_fn, Some(RemediationFnKind::LinearOffset));
        assert_eq!(rule.remediation_base_effort, Some("10min".to_string()));
        assert_eq!(rule.gap_description, Some("per issue".to_string()));
        assert!(!merge_debt(&declared, &mut rule));
    }

    #[test]
    fn tags_replaced_on_membership_difference_only() {
        let repo = xoo_repo();
        let mut declared = decl("R1");
        declared.tags = ["a", "b"].iter().map(ToString::to_string).collect();
        let mut rule = persisted(&declared, &repo);

        // same members, nothing to do
        assert!(!merge_tags(&declared, &mut rule));

        declared.tags.insert("c".to_string());
        assert!(merge_tags(&declared, &mut rule));
        assert_eq!(rule.system_tags.len(), 3);
    }

    #[test]
    fn removed_status_forces_empty_tags() {
        let repo = xoo_repo();
        let mut declared = decl("R1");
        declared.tags = ["a", "b"].iter().map(ToString::to_string).collect();
        let mut rule = persisted(&declared, &repo);

        declared.status = RuleStatus::Removed;
        assert!(merge_tags(&declared, &mut rule));
        assert!(rule.system_tags.is_empty());
        // settles once cleared, declared tags notwithstanding
        assert!(!merge_tags(&declared, &mut rule));
    }
}
