//! Rule natural keys.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Natural key of a rule: the repository key plus the rule key within it.
///
/// Rendered as `"repository:rule"`. This is the identity rules are matched
/// on during synchronization, independent of the surrogate row id.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct RuleKey {
    pub repository: String,
    pub rule: String,
}

impl RuleKey {
    #[must_use]
    pub fn of(repository: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            rule: rule.into(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.rule)
    }
}

/// Error parsing a `"repository:rule"` string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid rule key '{0}': expected 'repository:rule'")]
pub struct ParseRuleKeyError(String);

impl FromStr for RuleKey {
    type Err = ParseRuleKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((repo, rule)) if !repo.is_empty() && !rule.is_empty() => {
                Ok(Self::of(repo, rule))
            }
            _ => Err(ParseRuleKeyError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_and_parse_roundtrip() {
        let key = RuleKey::of("xoo", "R1");
        assert_eq!(key.to_string(), "xoo:R1");
        assert_eq!("xoo:R1".parse::<RuleKey>().unwrap(), key);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("xoo".parse::<RuleKey>().is_err());
        assert!(":R1".parse::<RuleKey>().is_err());
        assert!("xoo:".parse::<RuleKey>().is_err());
    }

    #[test]
    fn rule_part_may_contain_colons() {
        let key = "squid:S100:legacy".parse::<RuleKey>().unwrap();
        assert_eq!(key.repository, "squid");
        assert_eq!(key.rule, "S100:legacy");
    }
}
