// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed [`DeliveryTransport`].

use std::time::Duration;

use async_trait::async_trait;
use hatch_core::{
    AdapterType, DeliveryTransport, HatchError, HealthStatus, PluginAdapter, TransportRequest,
    TransportResponse,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// Posts JSON envelopes to provider endpoints over HTTPS.
///
/// One instance is shared by every Delivery Client; the connection pool is
/// reused across providers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HatchError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, HatchError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HatchError::Config(format!("invalid header name `{name}`: {e}")))?;
        // Values may be credentials; keep them out of the error text.
        let value = HeaderValue::from_str(value)
            .map_err(|_| HatchError::Config(format!("invalid value for header `{name}`")))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl PluginAdapter for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, HatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HatchError> {
        Ok(())
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, HatchError> {
        let response = self
            .client
            .post(&request.url)
            .headers(header_map(&request.headers)?)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| HatchError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| HatchError::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(url = %request.url, status, "provider responded");

        Ok(TransportResponse { status, body })
    }
}
