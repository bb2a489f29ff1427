// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound HTTP transport trait used by the Delivery Client.

use async_trait::async_trait;

use crate::error::HatchError;
use crate::traits::adapter::PluginAdapter;

/// A single POST to a delivery provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

/// What came back from the provider: status code and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Issues provider requests on behalf of the Delivery Client.
///
/// A returned `Err` means no status code was received (network failure,
/// timeout). Any status code, including 4xx/5xx, is an `Ok` response for the
/// client to classify.
#[async_trait]
pub trait DeliveryTransport: PluginAdapter {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, HatchError>;
}
