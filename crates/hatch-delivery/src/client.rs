// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery Client: sends one outbound message to a provider with bounded retry.
//!
//! Each call walks `Attempting -> {Succeeded | Retrying -> Attempting |
//! FailedTerminal | FailedExhausted}`. Only 429, 500, and transport failures
//! are retried; every attempt, retried or not, counts against the budget.

use std::sync::Arc;

use hatch_config::model::{DeliveryConfig, ProviderConfig};
use hatch_core::{
    ChannelType, Delivery, DeliveryTransport, HatchError, HealthStatus, OutboundMessage,
    TransportRequest,
};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::policy::{classify, Classification, RetryPolicy};

/// Response fields that may carry the provider's message id, in lookup order.
const PROVIDER_ID_FIELDS: &[&str] = &["id", "sid", "message_id"];

/// Sends messages to one provider endpoint.
pub struct DeliveryClient {
    name: String,
    endpoint: String,
    api_key: Option<SecretString>,
    account_id: Option<String>,
    policy: RetryPolicy,
    transport: Arc<dyn DeliveryTransport>,
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("account_id", &self.account_id)
            .field("policy", &self.policy)
            .finish()
    }
}

impl DeliveryClient {
    /// Create a client for `provider`, labelled `name` in logs.
    pub fn new(
        name: impl Into<String>,
        provider: &ProviderConfig,
        policy: RetryPolicy,
        transport: Arc<dyn DeliveryTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: provider.endpoint.clone(),
            api_key: provider.api_key.clone().map(SecretString::from),
            account_id: provider.account_id.clone(),
            policy,
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Degraded without an API key; otherwise whatever the transport reports.
    pub async fn health(&self) -> HealthStatus {
        if self.api_key.is_none() {
            return HealthStatus::Degraded(format!("{} provider has no API key", self.name));
        }
        match self.transport.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    fn build_request(&self, message: &OutboundMessage) -> Result<TransportRequest, HatchError> {
        let body = serde_json::to_value(message)
            .map_err(|e| HatchError::Internal(format!("failed to encode message: {e}")))?;
        let mut headers = Vec::with_capacity(2);
        if let Some(key) = &self.api_key {
            headers.push(("X-API-Key".to_string(), key.expose_secret().to_string()));
        }
        if let Some(account) = &self.account_id {
            headers.push(("X-Account-ID".to_string(), account.clone()));
        }
        Ok(TransportRequest {
            url: self.endpoint.clone(),
            headers,
            body,
        })
    }

    /// Send `message`, retrying transient failures.
    pub async fn send(&self, message: &OutboundMessage) -> Result<Delivery, HatchError> {
        self.send_with_cancel(message, &CancellationToken::new())
            .await
    }

    /// Send `message`, giving up with [`HatchError::Cancelled`] as soon as
    /// `cancel` fires, whether mid-request or mid-backoff.
    pub async fn send_with_cancel(
        &self,
        message: &OutboundMessage,
        cancel: &CancellationToken,
    ) -> Result<Delivery, HatchError> {
        let request = self.build_request(message)?;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.backoff(attempt - 1);
                warn!(
                    provider = %self.name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = %last_failure,
                    "retrying delivery after transient failure"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(HatchError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HatchError::Cancelled),
                result = self.transport.post(&request) => result,
            };

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(provider = %self.name, attempt, error = %e, "delivery attempt failed");
                    last_failure = e.to_string();
                    continue;
                }
            };

            debug!(provider = %self.name, attempt, status = response.status, "delivery response");
            match classify(response.status) {
                Classification::Delivered => {
                    let provider_id = extract_provider_id(&response.body);
                    info!(provider = %self.name, attempt, %provider_id, "message delivered");
                    return Ok(Delivery {
                        provider_id,
                        attempts: attempt,
                    });
                }
                Classification::Retryable(reason) => {
                    last_failure = format!("status {}: {reason}", response.status);
                }
                Classification::Terminal(reason) => {
                    warn!(
                        provider = %self.name,
                        attempt,
                        status = response.status,
                        %reason,
                        "provider rejected message"
                    );
                    return Err(HatchError::DeliveryTerminal {
                        status: response.status,
                        reason,
                        attempts: attempt,
                    });
                }
            }
        }

        warn!(provider = %self.name, attempts = max_attempts, reason = %last_failure, "delivery attempts exhausted");
        Err(HatchError::DeliveryExhausted {
            attempts: max_attempts,
            last_failure,
        })
    }
}

/// Read the provider message id from a JSON response body.
///
/// Falls back to a generated id when the provider returns none, so the
/// stored message is still traceable.
pub fn extract_provider_id(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            PROVIDER_ID_FIELDS.iter().find_map(|field| match value.get(*field)? {
                serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        })
        .unwrap_or_else(|| format!("hatch-{}", uuid::Uuid::new_v4()))
}

/// The text and email clients, selected by channel.
#[derive(Debug)]
pub struct DeliveryClients {
    pub text: DeliveryClient,
    pub email: DeliveryClient,
}

impl DeliveryClients {
    /// Build both clients from configuration over a shared transport.
    pub fn from_config(config: &DeliveryConfig, transport: Arc<dyn DeliveryTransport>) -> Self {
        let policy = RetryPolicy::from_config(config);
        Self {
            text: DeliveryClient::new("sms", &config.sms, policy, transport.clone()),
            email: DeliveryClient::new("email", &config.email, policy, transport),
        }
    }

    /// The client that relays `channel`.
    pub fn for_channel(&self, channel: ChannelType) -> &DeliveryClient {
        if channel.is_text() {
            &self.text
        } else {
            &self.email
        }
    }
}
