//! Results of a synchronization pass.

use serde::Serialize;

use lintel_core::enums::ActiveRuleChangeKind;
use lintel_core::key::RuleKey;

/// A change to an active rule, produced when a removed rule was switched
/// on in a profile whose repository is still declared.
///
/// Transient: handed to the downstream notification sink (search index,
/// active-rule caches), never persisted by this crate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActiveRuleChange {
    pub kind: ActiveRuleChangeKind,
    pub rule_key: RuleKey,
    pub profile_id: String,
    pub active_rule_id: String,
}

/// Summary of one synchronization pass.
#[derive(Debug, Default, Serialize)]
pub struct SyncOutcome {
    /// Rules inserted for keys never seen before.
    pub created: usize,
    /// Rules whose field diff produced an update (custom rules included).
    pub updated: usize,
    /// Rules transitioned to `removed` this pass.
    pub removed: Vec<RuleKey>,
    /// Deactivation events for the downstream index collaborators.
    pub active_rule_changes: Vec<ActiveRuleChange>,
}

impl SyncOutcome {
    /// True when the pass wrote nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0
            && self.updated == 0
            && self.removed.is_empty()
            && self.active_rule_changes.is_empty()
    }
}
