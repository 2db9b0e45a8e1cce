//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent
//! re-running.

use crate::LintelDb;
use crate::error::StoreError;

/// Rule schema: 6 tables, 3 indexes.
const MIGRATION_001: &str = include_str!("../migrations/001_rules.sql");

impl LintelDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn()
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| StoreError::Migration(format!("001_rules: {e}")))?;
        tracing::debug!("rule schema migrations applied");
        Ok(())
    }
}
