// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Hatch workspace.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HatchError;

/// Surrogate key of a participant (a row in `communications`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

/// Surrogate key of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

/// Surrogate key of a stored message. Monotonic per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but misconfigured or slow.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Transport,
}

/// The kind of contact identifier a participant is keyed by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommunicationType {
    /// E.164 phone number.
    Phone,
    /// Email address.
    Email,
}

/// The channel a message travels over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Sms,
    Mms,
    Email,
}

impl ChannelType {
    /// Parses a wire message type, failing with [`HatchError::UnknownType`].
    pub fn parse(value: &str) -> Result<Self, HatchError> {
        value
            .parse()
            .map_err(|_| HatchError::UnknownType(value.to_string()))
    }

    /// The participant identifier kind used by this channel.
    pub fn communication_type(self) -> CommunicationType {
        match self {
            Self::Sms | Self::Mms => CommunicationType::Phone,
            Self::Email => CommunicationType::Email,
        }
    }

    /// Whether this channel is relayed by the text (SMS/MMS) provider.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Sms | Self::Mms)
    }
}

/// Delivery outcome recorded on a stored message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

/// Whether a message is product-initiated or arrived via provider webhook.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the product; goes through the Delivery Client first.
    Outbound,
    /// Already delivered by the provider.
    Inbound,
}

/// A normalized contact identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: CommunicationType,
}

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub channel: ChannelType,
    pub body: String,
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub status: DeliveryStatus,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A conversation thread between a fixed set of participants.
///
/// `messages` is `None` in list views and populated by single-conversation reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

/// A validated message ready for intake.
///
/// Built by the surrounding request layer; the core trusts its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub from: String,
    pub to: String,
    pub channel: ChannelType,
    pub body: String,
    pub attachments: Vec<String>,
    pub provider_id: Option<String>,
    /// Caller-supplied send time, normalized to UTC and stored at
    /// microsecond resolution. The caller's offset is not kept.
    pub created_at: DateTime<Utc>,
}

/// The part of a message a delivery provider needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub body: String,
    pub attachments: Vec<String>,
}

impl From<&MessageDescriptor> for OutboundMessage {
    fn from(descriptor: &MessageDescriptor) -> Self {
        Self {
            from: descriptor.from.clone(),
            to: descriptor.to.clone(),
            body: descriptor.body.clone(),
            attachments: descriptor.attachments.clone(),
        }
    }
}

/// A successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Identifier assigned by the provider.
    pub provider_id: String,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
}

/// Renders a timestamp in the fixed-width form used for persistence.
///
/// Microsecond precision with a `Z` suffix keeps lexical and chronological
/// order identical.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses an RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc))
}
