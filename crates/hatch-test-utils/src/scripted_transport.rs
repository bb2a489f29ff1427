// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted delivery transport for deterministic tests.
//!
//! `ScriptedTransport` implements `DeliveryTransport` by replaying a queue of
//! canned outcomes and recording every request it receives, so tests can
//! assert on both the result and the number of attempts made.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use hatch_core::{
    AdapterType, DeliveryTransport, HatchError, HealthStatus, PluginAdapter, TransportRequest,
    TransportResponse,
};

/// One canned transport outcome.
#[derive(Debug, Clone)]
pub enum Step {
    /// Respond with this status and body.
    Respond { status: u16, body: String },
    /// Fail before any status is received.
    Fail(String),
}

/// A transport that answers from a script.
///
/// When the script runs out, every further request gets a 200 with a fresh
/// `{"id": "scripted-N"}` body.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<TransportRequest>>,
    counter: AtomicU64,
}

impl ScriptedTransport {
    /// An empty script: every request succeeds.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Respond with each status in order, with an empty JSON body.
    pub fn with_statuses(statuses: &[u16]) -> Self {
        statuses
            .iter()
            .fold(Self::new(), |transport, &status| transport.then_status(status))
    }

    pub fn then_status(self, status: u16) -> Self {
        self.then(Step::Respond {
            status,
            body: "{}".to_string(),
        })
    }

    pub fn then_json(self, status: u16, body: serde_json::Value) -> Self {
        self.then(Step::Respond {
            status,
            body: body.to_string(),
        })
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.then(Step::Fail(message.into()))
    }

    fn then(mut self, step: Step) -> Self {
        self.script.get_mut().push_back(step);
        self
    }

    /// Append a step to a transport that is already shared.
    pub async fn push(&self, step: Step) {
        self.script.lock().await.push_back(step);
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().await.clone()
    }

    /// How many requests (attempts) were made.
    pub async fn attempts(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
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
impl DeliveryTransport for ScriptedTransport {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, HatchError> {
        self.requests.lock().await.push(request.clone());
        match self.script.lock().await.pop_front() {
            Some(Step::Respond { status, body }) => Ok(TransportResponse { status, body }),
            Some(Step::Fail(message)) => Err(HatchError::Transport {
                message,
                source: None,
            }),
            None => {
                let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
                Ok(TransportResponse {
                    status: 200,
                    body: serde_json::json!({ "id": format!("scripted-{n}") }).to_string(),
                })
            }
        }
    }
}
