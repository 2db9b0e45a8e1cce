//! # lintel-reconcile
//!
//! The rule-catalog reconciliation engine. One pass of [`synchronize`]
//! makes persisted rule storage match the declared catalog:
//!
//! 1. Every persisted definition is loaded into an in-memory working set.
//! 2. Declared repositories are consumed in order (skipping languages that
//!    are not installed); each declared rule claims its persisted match by
//!    natural key and is created or field-diffed and updated, parameters
//!    included. One commit per repository.
//! 3. Residual custom rules re-derive their inherited fields from their
//!    template, or are removed when the template is gone.
//! 4. All other residual rules are soft-deleted (status `removed`, tags
//!    cleared), with a commit every 100 removals.
//! 5. Removals cascade to profile activations only where the rule's
//!    repository is still declared; the resulting deactivation events are
//!    returned for the index collaborators to apply.
//! 6. The persisted repository listing is replaced with the declared set.
//!
//! The pass is single-threaded, runs to completion, and is idempotent: an
//! unchanged catalog produces zero writes.

mod error;
mod outcome;
mod params;
mod pass;
mod residual;

#[cfg(test)]
mod test_support;

pub use error::ReconcileError;
pub use outcome::{ActiveRuleChange, SyncOutcome};
pub use pass::synchronize;
