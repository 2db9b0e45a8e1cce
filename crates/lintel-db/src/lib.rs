//! # lintel-db
//!
//! libSQL rule record store for Lintel.
//!
//! Holds persisted rule definitions, their parameters, quality-profile
//! activations with per-activation parameter overrides, and the
//! repository display catalog. Uses the `libsql` crate (C `SQLite` fork) —
//! stable API, native FTS5 if search ever lands here.

pub mod error;
pub mod helpers;
mod migrations;
pub mod store;

pub use store::RuleStore;

use error::StoreError;
use libsql::Builder;

/// Central database handle for rule storage.
///
/// Wraps a libSQL database and connection; runs migrations on open and
/// provides prefixed id generation.
pub struct LintelDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl LintelDb {
    /// Open a local-only database at the given path (`":memory:"` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrations
    /// fail.
    pub async fn open_local(path: &str) -> Result<Self, StoreError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| StoreError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let lintel_db = Self { db, conn };
        lintel_db.run_migrations().await?;
        Ok(lintel_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"rul-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the
    /// prefix.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
