//! Residual handling: custom-rule re-derivation, soft removal with
//! checkpointed commits, activation cascade, and the repository listing.

use lintel_core::entities::{RepoMeta, RuleDef};
use lintel_core::enums::{ActiveRuleChangeKind, RuleStatus};

use crate::error::ReconcileError;
use crate::outcome::ActiveRuleChange;
use crate::pass::SyncPass;

/// Commit checkpoint cadence while processing large removal sets (e.g. a
/// repository dropped entirely).
const REMOVAL_COMMIT_INTERVAL: usize = 100;

impl SyncPass<'_> {
    /// Handle every persisted rule the declared catalog did not claim.
    ///
    /// Custom rules check the status of their template, which may have
    /// been created or updated earlier in this same pass, so they are
    /// processed only after every declared repository has been registered.
    pub(crate) async fn process_residual(&mut self) -> Result<(), ReconcileError> {
        let mut residual: Vec<RuleDef> = self.working.drain().map(|(_, rule)| rule).collect();
        // map drain order is arbitrary; key order keeps logs and commit
        // cadence deterministic
        residual.sort_by(|a, b| {
            (a.repo_key.as_str(), a.rule_key.as_str())
                .cmp(&(b.repo_key.as_str(), b.rule_key.as_str()))
        });

        let mut custom_rules = Vec::new();
        for rule in residual {
            if rule.is_custom() {
                custom_rules.push(rule);
            } else if rule.status != RuleStatus::Removed {
                self.remove_rule(rule).await?;
            }
        }

        for mut custom in custom_rules {
            let Some(template_id) = custom.template_id.clone() else {
                return Err(ReconcileError::Integrity(format!(
                    "custom rule {} has no template id",
                    custom.key()
                )));
            };
            match self.store.select_definition_by_id(&template_id).await? {
                Some(template) if template.status != RuleStatus::Removed => {
                    if update_custom_from_template(&mut custom, &template) {
                        self.stamp_and_update(&mut custom).await?;
                        self.updated += 1;
                    }
                }
                _ => self.remove_rule(custom).await?,
            }
        }

        self.store.commit().await.map_err(Into::into)
    }

    async fn remove_rule(&mut self, mut rule: RuleDef) -> Result<(), ReconcileError> {
        tracing::info!(rule = %rule.key(), "disable rule");
        rule.status = RuleStatus::Removed;
        rule.system_tags.clear();
        self.stamp_and_update(&mut rule).await?;
        self.removed.push(rule);
        if self.removed.len() % REMOVAL_COMMIT_INTERVAL == 0 {
            self.store.commit().await?;
        }
        Ok(())
    }

    /// Deactivate removed rules — but only where the repository itself is
    /// still declared. A repository that vanished wholesale (plugin
    /// uninstalled or temporarily disabled) keeps its activation state so
    /// profiles are not silently wiped.
    pub(crate) async fn cascade_deactivations(&mut self) -> Result<(), ReconcileError> {
        let declared = self.catalog.primary_keys();
        for rule in &self.removed {
            if !declared.contains(rule.repo_key.as_str()) {
                continue;
            }
            for active in self.store.deactivate_rule(&rule.id).await? {
                self.changes.push(ActiveRuleChange {
                    kind: ActiveRuleChangeKind::Deactivated,
                    rule_key: rule.key(),
                    profile_id: active.profile_id,
                    active_rule_id: active.id,
                });
            }
        }
        self.store.commit().await.map_err(Into::into)
    }

    /// Replace the persisted repository listing with the declared primary
    /// set. Unconditional: the table carries display metadata only.
    pub(crate) async fn persist_repositories(&mut self) -> Result<(), ReconcileError> {
        let repos: Vec<RepoMeta> = self
            .catalog
            .primary()
            .map(|r| RepoMeta {
                key: r.key.clone(),
                language: r.language.clone(),
                name: r.name.clone(),
            })
            .collect();
        self.store.truncate_repositories().await?;
        self.store.insert_repositories(&repos).await?;
        self.store.commit().await.map_err(Into::into)
    }
}

/// Re-derive the fields a custom rule inherits from its template.
pub(crate) fn update_custom_from_template(custom: &mut RuleDef, template: &RuleDef) -> bool {
    let mut changed = false;
    if custom.language != template.language {
        custom.language = template.language.clone();
        changed = true;
    }
    if custom.config_key != template.config_key {
        custom.config_key = template.config_key.clone();
        changed = true;
    }
    if custom.remediation_fn != template.remediation_fn {
        custom.remediation_fn = template.remediation_fn;
        changed = true;
    }
    if custom.remediation_gap_multiplier != template.remediation_gap_multiplier {
        custom.remediation_gap_multiplier = template.remediation_gap_multiplier.clone();
        changed = true;
    }
    if custom.remediation_base_effort != template.remediation_base_effort {
        custom.remediation_base_effort = template.remediation_base_effort.clone();
        changed = true;
    }
    if custom.gap_description != template.gap_description {
        custom.gap_description = template.gap_description.clone();
        changed = true;
    }
    if custom.status != template.status {
        custom.status = template.status;
        changed = true;
    }
    if custom.severity != template.severity {
        custom.severity = template.severity;
        changed = true;
    }
    changed
}
