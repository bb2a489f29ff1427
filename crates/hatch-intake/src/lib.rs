// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message Intake Orchestrator.
//!
//! [`IntakeService`] takes one validated message end to end: outbound
//! messages go through the Delivery Client first, then every message is
//! threaded and persisted in a single storage transaction. A failed delivery
//! persists nothing.

use std::sync::Arc;

use hatch_core::{
    Conversation, ConversationId, ConversationStore, DeliveryStatus, Direction, HatchError,
    HealthStatus, MessageDescriptor, MessageId, OutboundMessage, Stage,
};
use hatch_delivery::DeliveryClients;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrates delivery and persistence for incoming messages.
pub struct IntakeService {
    store: Arc<dyn ConversationStore>,
    clients: DeliveryClients,
}

impl IntakeService {
    pub fn new(store: Arc<dyn ConversationStore>, clients: DeliveryClients) -> Self {
        Self { store, clients }
    }

    /// Process one message. Returns the stored message id.
    pub async fn intake(
        &self,
        direction: Direction,
        descriptor: &MessageDescriptor,
    ) -> Result<MessageId, HatchError> {
        self.intake_with_cancel(direction, descriptor, &CancellationToken::new())
            .await
    }

    /// Process one message, aborting delivery retries and rolling back the
    /// write if `cancel` fires before commit.
    pub async fn intake_with_cancel(
        &self,
        direction: Direction,
        descriptor: &MessageDescriptor,
        cancel: &CancellationToken,
    ) -> Result<MessageId, HatchError> {
        // The resolver would reject this after the provider already sent it.
        if descriptor.from == descriptor.to {
            return Err(HatchError::Storage {
                stage: Stage::Resolver,
                source: format!("{} cannot message itself", descriptor.from).into(),
            });
        }

        let delivered;
        let record = match direction {
            Direction::Outbound => {
                let client = self.clients.for_channel(descriptor.channel);
                let delivery = client
                    .send_with_cancel(&OutboundMessage::from(descriptor), cancel)
                    .await
                    .inspect_err(|e| {
                        warn!(
                            channel = %descriptor.channel,
                            attempts = e.delivery_attempts(),
                            error = %e,
                            "outbound delivery failed; nothing persisted"
                        );
                    })?;
                debug!(attempts = delivery.attempts, provider_id = %delivery.provider_id, "delivered");
                delivered = MessageDescriptor {
                    provider_id: Some(delivery.provider_id),
                    ..descriptor.clone()
                };
                &delivered
            }
            Direction::Inbound => descriptor,
        };

        let message_id = self
            .store
            .record_message(record, DeliveryStatus::Success, cancel)
            .await
            .inspect_err(|e| {
                warn!(stage = ?e.stage(), error = %e, "message persistence failed");
            })?;

        info!(
            %message_id,
            %direction,
            channel = %record.channel,
            "message ingested"
        );
        Ok(message_id)
    }

    /// All conversations, most recently created first.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, HatchError> {
        self.store.list_conversations().await
    }

    /// One conversation with its delivered messages in timestamp order.
    pub async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, HatchError> {
        self.store.get_conversation(id).await
    }

    /// Health of the store and of each delivery client, by component name.
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        let store = match self.store.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        vec![
            (self.store.name().to_string(), store),
            (self.clients.text.name().to_string(), self.clients.text.health().await),
            (self.clients.email.name().to_string(), self.clients.email.health().await),
        ]
    }
}
