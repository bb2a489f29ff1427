// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message Store: append-only message rows and ordered conversation reads.

use std::str::FromStr;

use hatch_core::types::{format_timestamp, parse_timestamp};
use hatch_core::{
    ChannelType, Conversation, ConversationId, DeliveryStatus, HatchError, Message,
    MessageDescriptor, MessageId, Stage,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::database::{flatten_tr_err, map_tr_err, Database};
use crate::queries::conversations;
use crate::writer::with_write_tx;

/// Insert one message row. The caller's timestamp is stored verbatim.
pub(crate) fn insert(
    conn: &Connection,
    conversation_id: ConversationId,
    descriptor: &MessageDescriptor,
    status: DeliveryStatus,
) -> Result<MessageId, HatchError> {
    let attachments = serde_json::to_string(&descriptor.attachments)
        .map_err(|e| HatchError::storage(Stage::Store, e))?;

    conn.execute(
        "INSERT INTO messages (conversation_id, from_identifier, to_identifier, channel_type,
                               body, attachments, provider_id, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            conversation_id.0,
            descriptor.from,
            descriptor.to,
            descriptor.channel.to_string(),
            descriptor.body,
            attachments,
            descriptor.provider_id,
            status.to_string(),
            format_timestamp(&descriptor.created_at),
        ],
    )
    .map_err(|e| HatchError::storage(Stage::Store, e))?;

    Ok(MessageId(conn.last_insert_rowid()))
}

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    let channel: String = row.get(4)?;
    let attachments: String = row.get(6)?;
    let status: String = row.get(8)?;
    let created_at: String = row.get(9)?;

    Ok(Message {
        id: MessageId(row.get(0)?),
        conversation_id: ConversationId(row.get(1)?),
        from: row.get(2)?,
        to: row.get(3)?,
        channel: ChannelType::from_str(&channel).map_err(|e| conversion_err(4, e))?,
        body: row.get(5)?,
        attachments: serde_json::from_str(&attachments).map_err(|e| conversion_err(6, e))?,
        provider_id: row.get(7)?,
        status: DeliveryStatus::from_str(&status).map_err(|e| conversion_err(8, e))?,
        created_at: parse_timestamp(&created_at).map_err(|e| conversion_err(9, e))?,
    })
}

/// Successfully delivered messages of a conversation, oldest first.
pub(crate) fn delivered_for_conversation(
    conn: &Connection,
    conversation_id: ConversationId,
) -> Result<Vec<Message>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, conversation_id, from_identifier, to_identifier, channel_type, body,
                attachments, provider_id, status, created_at
         FROM messages
         WHERE conversation_id = ?1 AND status = 'success'
         ORDER BY created_at ASC, id ASC",
    )?;
    stmt.query_map(params![conversation_id.0], row_to_message)?
        .collect()
}

/// Append a message to an existing conversation in its own transaction.
pub async fn append(
    db: &Database,
    conversation_id: ConversationId,
    descriptor: &MessageDescriptor,
    status: DeliveryStatus,
) -> Result<MessageId, HatchError> {
    let descriptor = descriptor.clone();
    db.connection()
        .call(move |conn| {
            with_write_tx(conn, None, |tx| insert(tx, conversation_id, &descriptor, status))
        })
        .await
        .map_err(flatten_tr_err)
}

/// Load a conversation with its participants and delivered messages.
///
/// Fails with [`HatchError::NotFound`] when no conversation has `id`.
pub async fn get_conversation_with_messages(
    db: &Database,
    id: ConversationId,
) -> Result<Conversation, HatchError> {
    let found = db
        .connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> {
            let Some(mut conversation) = conversations::load(conn, id)? else {
                return Ok(None);
            };
            conversation.messages = Some(delivered_for_conversation(conn, id)?);
            Ok(Some(conversation))
        })
        .await
        .map_err(|e| map_tr_err(Stage::Store, e))?;

    found.ok_or_else(|| HatchError::conversation_not_found(id))
}

/// Count stored messages in a conversation, optionally including failed ones.
pub async fn count_messages(
    db: &Database,
    conversation_id: ConversationId,
    include_failed: bool,
) -> Result<u64, HatchError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE conversation_id = ?1 AND (?2 OR status = 'success')",
                params![conversation_id.0, include_failed],
                |row| row.get(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(|e| map_tr_err(Stage::Store, e))
}
