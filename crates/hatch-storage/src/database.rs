// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread. Other
//! handles on the same file (another process, or a second [`Database`] in
//! tests) contend on SQLite's write lock, bounded by the busy timeout.

use std::path::Path;
use std::time::Duration;

use hatch_core::{HatchError, Stage};
use tracing::{debug, info};

use crate::migrations::{self, AppliedMigration};

/// Busy timeout used when none is configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    applied: Vec<AppliedMigration>,
}

impl Database {
    /// Open (creating if needed) and migrate the database at `path`.
    pub async fn open(path: &str) -> Result<Self, HatchError> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT).await
    }

    /// Open with an explicit lock wait. `":memory:"` opens a private in-memory database.
    pub async fn open_with_busy_timeout(
        path: &str,
        busy_timeout: Duration,
    ) -> Result<Self, HatchError> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| HatchError::storage(Stage::Connection, e))?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| HatchError::storage(Stage::Connection, e))?;

        let applied = conn
            .call(move |conn| -> Result<Vec<AppliedMigration>, HatchError> {
                configure(conn, busy_timeout)
                    .map_err(|e| HatchError::storage(Stage::Connection, e))?;
                migrations::run_migrations(conn)
            })
            .await
            .map_err(flatten_tr_err)?;

        for migration in &applied {
            info!(%migration, "applied migration");
        }
        debug!(path, busy_timeout_ms = busy_timeout.as_millis() as u64, "database opened");

        Ok(Self { conn, applied })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Migrations this handle applied when it was opened. Empty when the
    /// schema was already current.
    pub fn applied_migrations(&self) -> &[AppliedMigration] {
        &self.applied
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), HatchError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(|e| map_tr_err(Stage::Connection, e))?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn configure(conn: &rusqlite::Connection, busy_timeout: Duration) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// Convert a tokio-rusqlite error into a storage error for `stage`.
pub(crate) fn map_tr_err(stage: Stage, e: tokio_rusqlite::Error<rusqlite::Error>) -> HatchError {
    HatchError::storage(stage, e)
}

/// Unwrap a closure's own [`HatchError`]; connection-level failures become
/// connection-stage storage errors.
pub(crate) fn flatten_tr_err(e: tokio_rusqlite::Error<HatchError>) -> HatchError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => HatchError::Storage {
            stage: Stage::Connection,
            source: other.to_string().into(),
        },
    }
}
