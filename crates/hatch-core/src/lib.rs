// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hatch messaging relay.
//!
//! Holds the domain types, the closed [`HatchError`] taxonomy, and the
//! adapter traits the storage and delivery crates implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{HatchError, Stage};
pub use types::{
    AdapterType, ChannelType, CommunicationType, Conversation, ConversationId, Delivery,
    DeliveryStatus, Direction, HealthStatus, Message, MessageDescriptor, MessageId,
    OutboundMessage, Participant, ParticipantId,
};

pub use traits::{
    ConversationStore, DeliveryTransport, PluginAdapter, TransportRequest, TransportResponse,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Transport] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("no api key".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        // Compile-time check that the trait surface stays reachable from the root.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_store<T: ConversationStore>() {}
        fn _assert_transport<T: DeliveryTransport>() {}
    }

    #[test]
    fn outbound_message_copies_descriptor_fields() {
        let descriptor = MessageDescriptor {
            from: "a@example.com".into(),
            to: "b@example.com".into(),
            channel: ChannelType::Email,
            body: "hello".into(),
            attachments: vec!["https://example.com/a.png".into()],
            provider_id: None,
            created_at: types::parse_timestamp("2024-01-01T00:00:00Z").unwrap(),
        };
        let outbound = OutboundMessage::from(&descriptor);
        assert_eq!(outbound.from, "a@example.com");
        assert_eq!(outbound.attachments.len(), 1);
    }
}
