// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, plus the combined intake write.

pub mod conversations;
pub mod messages;
pub mod participants;

use chrono::Utc;
use hatch_core::{DeliveryStatus, HatchError, MessageDescriptor, MessageId};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::database::{flatten_tr_err, Database};
use crate::writer::with_write_tx;

/// Thread one message into its conversation atomically.
///
/// Both participant upserts, the conversation lookup-or-create, and the
/// message insert share one IMMEDIATE transaction. Either all of them
/// commit or none do.
pub async fn record_message(
    db: &Database,
    descriptor: &MessageDescriptor,
    status: DeliveryStatus,
    cancel: &CancellationToken,
) -> Result<MessageId, HatchError> {
    if cancel.is_cancelled() {
        return Err(HatchError::Cancelled);
    }

    let descriptor = descriptor.clone();
    let cancel = cancel.clone();
    let now = Utc::now();

    let (conversation_id, message_id) = db
        .connection()
        .call(move |conn| {
            with_write_tx(conn, Some(&cancel), |tx| {
                let kind = descriptor.channel.communication_type();
                let from = participants::upsert(tx, &descriptor.from, kind)?;
                let to = participants::upsert(tx, &descriptor.to, kind)?;
                let conversation_id = conversations::resolve_or_create(tx, from, to, &now)?;
                let message_id = messages::insert(tx, conversation_id, &descriptor, status)?;
                Ok((conversation_id, message_id))
            })
        })
        .await
        .map_err(flatten_tr_err)?;

    debug!(%conversation_id, %message_id, %status, "message recorded");
    Ok(message_id)
}
