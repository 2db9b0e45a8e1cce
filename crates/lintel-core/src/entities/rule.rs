use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::enums::{DescriptionFormat, RemediationFnKind, RuleStatus, RuleType, Severity};
use crate::key::RuleKey;

/// A persisted rule definition.
///
/// Created the first time a provider declares the key and never physically
/// deleted afterwards: historical analysis data references the row, so a
/// rule that disappears from the declared catalog transitions to
/// `RuleStatus::Removed` instead. The surrogate `id` is stable across
/// removal and re-declaration.
///
/// Invariants: `description`/`description_format` hold exactly one form of
/// the declared text; `status == Removed` implies `system_tags` is empty;
/// `template_id` is set only on custom rules, which are never declared by
/// a provider themselves.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RuleDef {
    pub id: String,
    pub repo_key: String,
    pub rule_key: String,
    pub name: String,
    pub description: String,
    pub description_format: DescriptionFormat,
    pub config_key: Option<String>,
    pub severity: Severity,
    pub status: RuleStatus,
    pub is_template: bool,
    pub template_id: Option<String>,
    pub language: Option<String>,
    pub remediation_fn: Option<RemediationFnKind>,
    pub remediation_gap_multiplier: Option<String>,
    pub remediation_base_effort: Option<String>,
    pub gap_description: Option<String>,
    pub system_tags: BTreeSet<String>,
    pub rule_type: RuleType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RuleDef {
    /// The natural key this rule is matched on during synchronization.
    #[must_use]
    pub fn key(&self) -> RuleKey {
        RuleKey::of(self.repo_key.clone(), self.rule_key.clone())
    }

    /// Whether this is a user-created instance of a template rule.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.template_id.is_some()
    }
}
