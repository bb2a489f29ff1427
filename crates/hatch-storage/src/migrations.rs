// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every database open. Refinery tracks them in `refinery_schema_history`.

use std::fmt;

use hatch_core::{HatchError, Stage};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// A migration applied by [`run_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i32,
    pub name: String,
}

impl fmt::Display for AppliedMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}__{}", self.version, self.name)
    }
}

/// Run all pending migrations, returning the ones applied by this call.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<Vec<AppliedMigration>, HatchError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| HatchError::storage(Stage::Connection, e))?;
    Ok(report
        .applied_migrations()
        .iter()
        .map(|m| AppliedMigration {
            version: m.version() as i32,
            name: m.name().to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_applies_initial_schema_once() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        let applied = run_migrations(&mut conn).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].to_string(), "V1__initial_schema");

        let again = run_migrations(&mut conn).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn schema_has_expected_tables() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        for table in [
            "communications",
            "conversations",
            "conversation_memberships",
            "messages",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }
}
