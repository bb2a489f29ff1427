// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire payload for message routes and its conversion to a descriptor.

use std::sync::LazyLock;

use hatch_core::types::parse_timestamp;
use hatch_core::{ChannelType, MessageDescriptor};
use regex::Regex;
use serde::Deserialize;

use crate::error::{ApiError, FieldError};

// Leading `+` and up to 15 digits. The first digit is not checked.
static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{2,15}$").expect("E.164 pattern compiles"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

/// Which family of message a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// SMS and MMS between phone numbers.
    Text,
    /// Email between addresses.
    Email,
}

impl RouteKind {
    fn accepts(self, channel: ChannelType) -> bool {
        match self {
            Self::Text => channel.is_text(),
            Self::Email => channel == ChannelType::Email,
        }
    }

    fn allowed_types(self) -> &'static str {
        match self {
            Self::Text => "sms or mms",
            Self::Email => "email",
        }
    }

    fn check_address(self, value: &str) -> Option<&'static str> {
        match self {
            Self::Text if !E164.is_match(value) => Some("must be an E.164 phone number"),
            Self::Email if !EMAIL.is_match(value) => Some("must be an email address"),
            _ => None,
        }
    }
}

/// Request body for every message route.
///
/// Missing string fields deserialize as empty so validation can report all
/// of them at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl MessagePayload {
    /// Validate against `route` and build the descriptor.
    ///
    /// Returns [`hatch_core::HatchError::UnknownType`] for an unrecognized `type`, and a
    /// validation error listing every failing field otherwise.
    pub fn into_descriptor(self, route: RouteKind) -> Result<MessageDescriptor, ApiError> {
        let mut errors = Vec::new();

        let channel = if self.kind.is_empty() {
            errors.push(FieldError::new("type", "is required"));
            None
        } else {
            let channel = ChannelType::parse(&self.kind)?;
            if !route.accepts(channel) {
                errors.push(FieldError::new(
                    "type",
                    format!("must be {} on this route", route.allowed_types()),
                ));
            }
            Some(channel)
        };

        for (field, value) in [("from", &self.from), ("to", &self.to)] {
            if value.is_empty() {
                errors.push(FieldError::new(field, "is required"));
            } else if let Some(problem) = route.check_address(value) {
                errors.push(FieldError::new(field, problem));
            }
        }
        if !self.from.is_empty() && self.from == self.to {
            errors.push(FieldError::new("to", "must differ from sender"));
        }

        if self.body.is_empty() {
            errors.push(FieldError::new("body", "must not be empty"));
        }

        let attachments = self.attachments.unwrap_or_default();
        if attachments.iter().any(|a| a.trim().is_empty()) {
            errors.push(FieldError::new("attachments", "must not contain empty entries"));
        }

        let created_at = if self.timestamp.is_empty() {
            errors.push(FieldError::new("timestamp", "is required"));
            None
        } else {
            match parse_timestamp(&self.timestamp) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    errors.push(FieldError::new(
                        "timestamp",
                        format!("must be an RFC 3339 timestamp ({e})"),
                    ));
                    None
                }
            }
        };

        match (channel, created_at) {
            (Some(channel), Some(created_at)) if errors.is_empty() => Ok(MessageDescriptor {
                from: self.from,
                to: self.to,
                channel,
                body: self.body,
                attachments,
                provider_id: self.provider_id.filter(|id| !id.is_empty()),
                created_at,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}
