// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery for the Hatch messaging relay.
//!
//! [`DeliveryClient`] posts a message envelope to a provider, classifies the
//! response, and retries transient failures under a [`RetryPolicy`]. The
//! network hop is behind [`hatch_core::DeliveryTransport`]; [`HttpTransport`]
//! is the reqwest implementation.

pub mod client;
pub mod policy;
pub mod transport;

pub use client::{extract_provider_id, DeliveryClient, DeliveryClients};
pub use policy::{classify, Classification, RetryPolicy};
pub use transport::HttpTransport;
