//! Reconciliation error types.

use lintel_db::error::StoreError;
use thiserror::Error;

/// Errors that abort a synchronization pass.
///
/// Storage failures propagate unretried — the commit checkpoints already
/// taken bound the redo work on restart. Non-fatal conditions (orphan
/// extension repositories, custom rules whose template is gone) are
/// handled inline and never surface here.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A read or write failed at the store boundary.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// Cross-rule relationships would be corrupted by continuing.
    #[error("Data integrity violation: {0}")]
    Integrity(String),
}
