// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Participant Directory: contact identifier to stable participant id.

use std::str::FromStr;

use hatch_core::{CommunicationType, HatchError, Participant, ParticipantId, Stage};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{flatten_tr_err, map_tr_err, Database};
use crate::writer::with_write_tx;

/// Upsert `identifier` and return its id.
///
/// The insert is a no-op when the identifier already exists; the read-back
/// is authoritative either way, so a concurrent first insert by another
/// writer is harmless. An existing row keeps its original type.
pub(crate) fn upsert(
    conn: &Connection,
    identifier: &str,
    kind: CommunicationType,
) -> Result<ParticipantId, HatchError> {
    conn.execute(
        "INSERT INTO communications (identifier, type) VALUES (?1, ?2)
         ON CONFLICT(identifier) DO NOTHING",
        params![identifier, kind.to_string()],
    )
    .and_then(|_| {
        conn.query_row(
            "SELECT id FROM communications WHERE identifier = ?1",
            params![identifier],
            |row| row.get(0),
        )
    })
    .map(ParticipantId)
    .map_err(|e| HatchError::storage(Stage::Directory, e))
}

pub(crate) fn find(conn: &Connection, identifier: &str) -> Result<Option<Participant>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, identifier, type FROM communications WHERE identifier = ?1",
        params![identifier],
        row_to_participant,
    )
    .optional()
}

pub(crate) fn row_to_participant(row: &rusqlite::Row<'_>) -> Result<Participant, rusqlite::Error> {
    let kind: String = row.get(2)?;
    Ok(Participant {
        id: ParticipantId(row.get(0)?),
        identifier: row.get(1)?,
        kind: CommunicationType::from_str(&kind).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

/// Resolve `identifier` to a participant id, creating the participant if absent.
pub async fn resolve(
    db: &Database,
    identifier: &str,
    kind: CommunicationType,
) -> Result<ParticipantId, HatchError> {
    let identifier = identifier.to_string();
    db.connection()
        .call(move |conn| with_write_tx(conn, None, |tx| upsert(tx, &identifier, kind)))
        .await
        .map_err(flatten_tr_err)
}

/// Look up a participant without creating it.
pub async fn get(db: &Database, identifier: &str) -> Result<Option<Participant>, HatchError> {
    let identifier = identifier.to_string();
    db.connection()
        .call(move |conn| find(conn, &identifier))
        .await
        .map_err(|e| map_tr_err(Stage::Directory, e))
}
