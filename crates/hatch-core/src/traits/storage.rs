// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait consumed by the intake orchestrator.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CommunicationType, Conversation, ConversationId, DeliveryStatus, MessageDescriptor,
    MessageId, ParticipantId,
};

/// Transactional store for participants, conversations, and messages.
///
/// [`record_message`](ConversationStore::record_message) is the single
/// atomic unit of intake: both participant upserts, the conversation
/// lookup-or-create, and the message append commit together or not at all.
#[async_trait]
pub trait ConversationStore: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), HatchError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), HatchError>;

    /// Resolves a contact identifier to its participant id, creating it if absent.
    async fn resolve_participant(
        &self,
        identifier: &str,
        kind: CommunicationType,
    ) -> Result<ParticipantId, HatchError>;

    /// Threads and appends one message in a single transaction.
    ///
    /// If `cancel` fires before the transaction commits, it is rolled back
    /// and [`HatchError::Cancelled`] is returned.
    async fn record_message(
        &self,
        descriptor: &MessageDescriptor,
        status: DeliveryStatus,
        cancel: &CancellationToken,
    ) -> Result<MessageId, HatchError>;

    /// Lists every conversation, most recently created first, with participants.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, HatchError>;

    /// Loads one conversation with its successfully delivered messages in order.
    async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, HatchError>;
}
