use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Severity;

/// A rule switched on within a quality profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ActiveRule {
    pub id: String,
    pub profile_id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A per-activation parameter override.
///
/// `name` references the owning rule's parameter of the same name; rows
/// are deleted when that parameter disappears from the declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ActiveRuleParam {
    pub active_rule_id: String,
    pub name: String,
    pub value: String,
}
