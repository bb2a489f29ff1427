// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hatch messaging relay.

use strum::{Display, EnumString};
use thiserror::Error;

/// The pipeline stage an error originated from.
///
/// Carried by storage failures and reported by [`HatchError::stage`] so logs
/// and responses can name the failing step without exposing SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// Opening, migrating, or talking to the database connection itself.
    Connection,
    /// Participant Directory upsert or lookup.
    Directory,
    /// Conversation Resolver lookup-or-create.
    Resolver,
    /// Message Store append or read.
    Store,
    /// Delivery Client call to the external provider.
    Delivery,
    /// Payload-to-descriptor conversion.
    Conversion,
}

/// The error type shared by every Hatch component.
///
/// The set is closed: callers match on variants rather than inspecting
/// error sources at runtime.
#[derive(Debug, Error)]
pub enum HatchError {
    /// Configuration errors (invalid values, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Datastore connectivity, constraint, or query failure.
    ///
    /// The display text names the stage only; the underlying cause is kept
    /// as the error source for logging.
    #[error("storage failure in {stage} stage")]
    Storage {
        stage: Stage,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The requested resource does not exist.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// The provider explicitly rejected the send. Never retried.
    #[error("provider rejected message with status {status}: {reason}")]
    DeliveryTerminal {
        status: u16,
        reason: String,
        attempts: u32,
    },

    /// All permitted delivery attempts were consumed without success.
    #[error("delivery failed after {attempts} attempts: {last_failure}")]
    DeliveryExhausted { attempts: u32, last_failure: String },

    /// The message descriptor names a channel type that is not recognized.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// A single transport attempt failed before a status code was received.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HatchError {
    /// Wraps a datastore error with the stage it occurred in.
    pub fn storage<E>(stage: Stage, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            stage,
            source: Box::new(source),
        }
    }

    /// Builds the "conversation not found" error.
    pub fn conversation_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "conversation",
            id: id.to_string(),
        }
    }

    /// Returns the pipeline stage this error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Storage { stage, .. } => Some(*stage),
            Self::NotFound { .. } => Some(Stage::Store),
            Self::DeliveryTerminal { .. }
            | Self::DeliveryExhausted { .. }
            | Self::Transport { .. } => Some(Stage::Delivery),
            Self::UnknownType(_) => Some(Stage::Conversion),
            Self::Config(_) | Self::Cancelled | Self::Internal(_) => None,
        }
    }

    /// Number of delivery attempts made before this error, for delivery failures.
    pub fn delivery_attempts(&self) -> Option<u32> {
        match self {
            Self::DeliveryTerminal { attempts, .. } | Self::DeliveryExhausted { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }
}
