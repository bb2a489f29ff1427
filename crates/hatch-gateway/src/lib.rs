// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Hatch messaging relay.
//!
//! Validates wire payloads into message descriptors, hands them to the
//! intake service, and serves conversation history as JSON.

pub mod error;
pub mod handlers;
pub mod payload;
pub mod server;

pub use error::{ApiError, FieldError};
pub use payload::{MessagePayload, RouteKind};
pub use server::{router, start_server, GatewayState};
