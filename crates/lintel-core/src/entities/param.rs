use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ParamKind;

/// A parameter declared on a persisted rule.
///
/// Addressed by `(rule_id, name)`; the name is unique within the owning
/// rule. Dropping a parameter from the declaration deletes the row and
/// every per-activation override that referenced it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RuleParam {
    pub rule_id: String,
    pub name: String,
    pub kind: ParamKind,
    pub default_value: Option<String>,
    pub description: Option<String>,
}
