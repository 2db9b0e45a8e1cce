//! Status, severity, and type enums for rule definitions.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` returning the exact string stored in SQL columns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RuleStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a rule definition.
///
/// `Removed` is terminal from the provider's point of view but not from
/// storage's: a removed rule keeps its row and may come back if the same
/// key is declared again.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Beta,
    Deprecated,
    #[default]
    Ready,
    Removed,
}

impl RuleStatus {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::Deprecated => "deprecated",
            Self::Ready => "ready",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Default severity of a rule, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Minor,
    #[default]
    Major,
    Critical,
    Blocker,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
            Self::Blocker => "blocker",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RuleType
// ---------------------------------------------------------------------------

/// Classification of what a rule detects.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    #[default]
    CodeSmell,
    Bug,
    Vulnerability,
}

impl RuleType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CodeSmell => "code_smell",
            Self::Bug => "bug",
            Self::Vulnerability => "vulnerability",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DescriptionFormat
// ---------------------------------------------------------------------------

/// Markup format of a rule description. Exactly one form is set per rule.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionFormat {
    #[default]
    Html,
    Markdown,
}

impl DescriptionFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for DescriptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RemediationFnKind
// ---------------------------------------------------------------------------

/// Shape of a rule's debt remediation function.
///
/// `Linear` uses only the gap multiplier, `Constant` only the base effort,
/// `LinearOffset` both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemediationFnKind {
    Linear,
    LinearOffset,
    Constant,
}

impl RemediationFnKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::LinearOffset => "linear_offset",
            Self::Constant => "constant",
        }
    }
}

impl fmt::Display for RemediationFnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParamKind
// ---------------------------------------------------------------------------

/// Value type of a rule parameter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    String,
    Text,
    Boolean,
    Integer,
    Float,
}

impl ParamKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActiveRuleChangeKind
// ---------------------------------------------------------------------------

/// Kind of change applied to an active rule in a quality profile.
///
/// Synchronization itself only produces `Deactivated`; the other variants
/// exist for the downstream profile/index collaborators that consume the
/// same change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActiveRuleChangeKind {
    Activated,
    Updated,
    Deactivated,
}

impl ActiveRuleChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activated => "activated",
            Self::Updated => "updated",
            Self::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for ActiveRuleChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&RuleType::CodeSmell).unwrap();
        assert_eq!(json, "\"code_smell\"");
        let back: RuleType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RuleType::CodeSmell);

        let json = serde_json::to_string(&RemediationFnKind::LinearOffset).unwrap();
        assert_eq!(json, format!("\"{}\"", RemediationFnKind::LinearOffset.as_str()));
    }

    #[test]
    fn defaults() {
        assert_eq!(RuleStatus::default(), RuleStatus::Ready);
        assert_eq!(Severity::default(), Severity::Major);
        assert_eq!(RuleType::default(), RuleType::CodeSmell);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Blocker);
        assert!(Severity::Major < Severity::Critical);
    }
}
