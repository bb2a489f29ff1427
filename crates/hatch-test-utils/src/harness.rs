// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end intake tests.
//!
//! `TestHarness` assembles a complete intake stack: a temp SQLite database,
//! scripted text and email transports, and an [`IntakeService`] over them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hatch_config::model::{HatchConfig, StorageConfig};
use hatch_core::{ChannelType, ConversationStore, HatchError, MessageDescriptor, Stage};
use hatch_delivery::{DeliveryClient, DeliveryClients, RetryPolicy};
use hatch_intake::IntakeService;
use hatch_storage::SqliteStorage;

use crate::scripted_transport::ScriptedTransport;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    text: ScriptedTransport,
    email: ScriptedTransport,
    policy: RetryPolicy,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            text: ScriptedTransport::new(),
            email: ScriptedTransport::new(),
            // Real attempt count, negligible delays.
            policy: RetryPolicy {
                max_attempts: 3,
                base_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(4),
            },
        }
    }

    /// Script the SMS/MMS provider.
    pub fn with_text_transport(mut self, transport: ScriptedTransport) -> Self {
        self.text = transport;
        self
    }

    /// Script the email provider.
    pub fn with_email_transport(mut self, transport: ScriptedTransport) -> Self {
        self.email = transport;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Open the temp database and wire the service.
    pub async fn build(self) -> Result<TestHarness, HatchError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| HatchError::storage(Stage::Connection, e))?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = HatchConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        config.delivery.max_attempts = self.policy.max_attempts;

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let text_transport = Arc::new(self.text);
        let email_transport = Arc::new(self.email);
        let clients = DeliveryClients {
            text: DeliveryClient::new(
                "sms",
                &config.delivery.sms,
                self.policy,
                text_transport.clone(),
            ),
            email: DeliveryClient::new(
                "email",
                &config.delivery.email,
                self.policy,
                email_transport.clone(),
            ),
        };

        let store: Arc<dyn ConversationStore> = storage.clone();
        let intake = Arc::new(IntakeService::new(store, clients));

        Ok(TestHarness {
            intake,
            storage,
            text_transport,
            email_transport,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete intake environment with scripted providers and temp storage.
pub struct TestHarness {
    pub intake: Arc<IntakeService>,
    /// The same store the service writes to, for direct assertions.
    pub storage: Arc<SqliteStorage>,
    pub text_transport: Arc<ScriptedTransport>,
    pub email_transport: Arc<ScriptedTransport>,
    pub config: HatchConfig,
    /// Kept alive so the database outlives the harness.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness whose providers accept everything.
    pub async fn new() -> Result<Self, HatchError> {
        Self::builder().build().await
    }
}

fn timestamp(rfc3339: &str) -> DateTime<Utc> {
    hatch_core::types::parse_timestamp(rfc3339).unwrap_or_else(|_| Utc::now())
}

/// An SMS descriptor. Unparseable timestamps fall back to now.
pub fn sms(from: &str, to: &str, body: &str, at: &str) -> MessageDescriptor {
    MessageDescriptor {
        from: from.to_string(),
        to: to.to_string(),
        channel: ChannelType::Sms,
        body: body.to_string(),
        attachments: Vec::new(),
        provider_id: None,
        created_at: timestamp(at),
    }
}

/// An email descriptor. Unparseable timestamps fall back to now.
pub fn email(from: &str, to: &str, body: &str, at: &str) -> MessageDescriptor {
    MessageDescriptor {
        channel: ChannelType::Email,
        ..sms(from, to, body, at)
    }
}
