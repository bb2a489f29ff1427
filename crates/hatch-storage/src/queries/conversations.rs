// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation Resolver: finds or creates the unique conversation for a pair.

use chrono::{DateTime, Utc};
use hatch_core::types::{format_timestamp, parse_timestamp};
use hatch_core::{Conversation, ConversationId, HatchError, ParticipantId, Stage};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::database::{flatten_tr_err, map_tr_err, Database};
use crate::queries::participants::row_to_participant;
use crate::writer::with_write_tx;

/// The conversation whose member set is exactly `{a, b}`, if any.
pub(crate) fn find_pair(
    conn: &Connection,
    a: ParticipantId,
    b: ParticipantId,
) -> Result<Option<ConversationId>, rusqlite::Error> {
    conn.query_row(
        "SELECT conversation_id FROM conversation_memberships
         WHERE conversation_id IN (
             SELECT conversation_id FROM conversation_memberships WHERE communication_id = ?1
         )
         GROUP BY conversation_id
         HAVING COUNT(*) = 2 AND SUM(communication_id IN (?1, ?2)) = 2
         ORDER BY conversation_id
         LIMIT 1",
        params![a.0, b.0],
        |row| row.get(0),
    )
    .optional()
    .map(|id| id.map(ConversationId))
}

/// Return the conversation for `{a, b}`, creating it with two memberships if absent.
///
/// Must run inside a write transaction so a concurrent writer cannot create
/// the same pair between the lookup and the insert.
pub(crate) fn resolve_or_create(
    conn: &Connection,
    a: ParticipantId,
    b: ParticipantId,
    now: &DateTime<Utc>,
) -> Result<ConversationId, HatchError> {
    if a == b {
        return Err(HatchError::Storage {
            stage: Stage::Resolver,
            source: format!("participant {a} cannot hold a conversation with itself").into(),
        });
    }

    let resolver_err = |e: rusqlite::Error| HatchError::storage(Stage::Resolver, e);

    if let Some(existing) = find_pair(conn, a, b).map_err(resolver_err)? {
        return Ok(existing);
    }

    conn.execute(
        "INSERT INTO conversations (created_at) VALUES (?1)",
        params![format_timestamp(now)],
    )
    .map_err(resolver_err)?;
    let id = ConversationId(conn.last_insert_rowid());

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO conversation_memberships (conversation_id, communication_id)
             VALUES (?1, ?2)",
        )
        .map_err(resolver_err)?;
    for participant in [a, b] {
        stmt.execute(params![id.0, participant.0])
            .map_err(resolver_err)?;
    }

    debug!(conversation_id = %id, participant_a = %a, participant_b = %b, "conversation created");
    Ok(id)
}

fn load_participants(
    conn: &Connection,
    conversation: &mut Conversation,
) -> Result<(), rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT c.id, c.identifier, c.type
         FROM conversation_memberships m
         JOIN communications c ON c.id = m.communication_id
         WHERE m.conversation_id = ?1
         ORDER BY c.id",
    )?;
    conversation.participants = stmt
        .query_map(params![conversation.id.0], row_to_participant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(())
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, rusqlite::Error> {
    let created_at: String = row.get(1)?;
    Ok(Conversation {
        id: ConversationId(row.get(0)?),
        created_at: parse_timestamp(&created_at).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        participants: Vec::new(),
        messages: None,
    })
}

/// All conversations, newest first, each with its participants.
pub(crate) fn list(conn: &Connection) -> Result<Vec<Conversation>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, created_at FROM conversations ORDER BY created_at DESC, id DESC",
    )?;
    let mut conversations = stmt
        .query_map([], row_to_conversation)?
        .collect::<Result<Vec<_>, _>>()?;
    for conversation in &mut conversations {
        load_participants(conn, conversation)?;
    }
    Ok(conversations)
}

/// One conversation with participants and no messages.
pub(crate) fn load(
    conn: &Connection,
    id: ConversationId,
) -> Result<Option<Conversation>, rusqlite::Error> {
    let conversation = conn
        .query_row(
            "SELECT id, created_at FROM conversations WHERE id = ?1",
            params![id.0],
            row_to_conversation,
        )
        .optional()?;
    match conversation {
        Some(mut conversation) => {
            load_participants(conn, &mut conversation)?;
            Ok(Some(conversation))
        }
        None => Ok(None),
    }
}

/// Find or create the conversation between two participants in its own transaction.
pub async fn resolve_or_create_conversation(
    db: &Database,
    a: ParticipantId,
    b: ParticipantId,
) -> Result<ConversationId, HatchError> {
    let now = Utc::now();
    db.connection()
        .call(move |conn| with_write_tx(conn, None, |tx| resolve_or_create(tx, a, b, &now)))
        .await
        .map_err(flatten_tr_err)
}

/// List all conversations, most recently created first.
pub async fn list_conversations(db: &Database) -> Result<Vec<Conversation>, HatchError> {
    db.connection()
        .call(|conn| list(conn))
        .await
        .map_err(|e| map_tr_err(Stage::Store, e))
}
