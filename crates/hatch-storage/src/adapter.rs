// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ConversationStore trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hatch_config::model::StorageConfig;
use hatch_core::{
    AdapterType, CommunicationType, Conversation, ConversationId, ConversationStore,
    DeliveryStatus, HatchError, HealthStatus, MessageDescriptor, MessageId, Participant,
    ParticipantId, PluginAdapter, Stage,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed conversation store.
///
/// The database is opened lazily by [`ConversationStore::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a store for the given configuration without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, HatchError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, HatchError> {
        self.db.get().ok_or_else(|| HatchError::Storage {
            stage: Stage::Connection,
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Look up a participant by identifier without creating it.
    pub async fn get_participant(&self, identifier: &str) -> Result<Option<Participant>, HatchError> {
        queries::participants::get(self.database()?, identifier).await
    }

    /// Count stored messages, including `failed` rows when `include_failed` is set.
    pub async fn count_messages(
        &self,
        conversation_id: ConversationId,
        include_failed: bool,
    ) -> Result<u64, HatchError> {
        queries::messages::count_messages(self.database()?, conversation_id, include_failed).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, HatchError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await
            .map_err(|e| map_tr_err(Stage::Connection, e))?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HatchError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), HatchError> {
        let busy_timeout = Duration::from_millis(self.config.busy_timeout_ms);
        let db = Database::open_with_busy_timeout(&self.config.database_path, busy_timeout).await?;
        self.db.set(db).map_err(|_| HatchError::Storage {
            stage: Stage::Connection,
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HatchError> {
        self.database()?.checkpoint().await
    }

    async fn resolve_participant(
        &self,
        identifier: &str,
        kind: CommunicationType,
    ) -> Result<ParticipantId, HatchError> {
        queries::participants::resolve(self.database()?, identifier, kind).await
    }

    async fn record_message(
        &self,
        descriptor: &MessageDescriptor,
        status: DeliveryStatus,
        cancel: &CancellationToken,
    ) -> Result<MessageId, HatchError> {
        queries::record_message(self.database()?, descriptor, status, cancel).await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, HatchError> {
        queries::conversations::list_conversations(self.database()?).await
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, HatchError> {
        queries::messages::get_conversation_with_messages(self.database()?, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatch_core::types::parse_timestamp;
    use hatch_core::ChannelType;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_str().unwrap().to_string(),
            busy_timeout_ms: 5000,
        }
    }

    fn sms(from: &str, to: &str, body: &str) -> MessageDescriptor {
        MessageDescriptor {
            from: from.into(),
            to: to.into(),
            channel: ChannelType::Sms,
            body: body.into(),
            attachments: vec![],
            provider_id: None,
            created_at: parse_timestamp("2023-10-01T12:00:00Z").unwrap(),
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("test.db")));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("double.db")));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("health.db")));
        let err = storage.health_check().await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Connection));

        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn record_message_threads_and_persists() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(make_config(&dir.path().join("intake.db")))
            .await
            .unwrap();
        let cancel = CancellationToken::new();

        let first = storage
            .record_message(&sms("+1234567890", "+0987654321", "hi"), DeliveryStatus::Success, &cancel)
            .await
            .unwrap();
        let second = storage
            .record_message(&sms("+0987654321", "+1234567890", "hey"), DeliveryStatus::Success, &cancel)
            .await
            .unwrap();
        assert!(second > first);

        let all = storage.list_conversations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].participants.len(), 2);

        let conversation = storage.get_conversation(all[0].id).await.unwrap();
        assert_eq!(conversation.messages.unwrap().len(), 2);
        assert!(storage.get_participant("+1234567890").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cancelled_token_writes_nothing() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(make_config(&dir.path().join("cancel.db")))
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = storage
            .record_message(&sms("+1", "+2", "hi"), DeliveryStatus::Success, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, HatchError::Cancelled));
        assert!(storage.list_conversations().await.unwrap().is_empty());
        assert!(storage.get_participant("+1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_step_rolls_back_participants() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(make_config(&dir.path().join("rollback.db")))
            .await
            .unwrap();
        let cancel = CancellationToken::new();

        // A self-addressed message fails in the resolver after both upserts ran.
        let err = storage
            .record_message(&sms("+1555", "+1555", "me"), DeliveryStatus::Success, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Resolver));
        assert!(storage.get_participant("+1555").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_first_contact_across_handles_creates_one_conversation() {
        let dir = tempdir().unwrap();
        let config = make_config(&dir.path().join("race.db"));
        let left = Arc::new(SqliteStorage::open(config.clone()).await.unwrap());
        let right = Arc::new(SqliteStorage::open(config).await.unwrap());

        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = if i % 2 == 0 { left.clone() } else { right.clone() };
            tasks.push(tokio::spawn(async move {
                let (from, to) = if i % 3 == 0 {
                    ("+1234567890", "+0987654321")
                } else {
                    ("+0987654321", "+1234567890")
                };
                store
                    .record_message(&sms(from, to, "race"), DeliveryStatus::Success, &CancellationToken::new())
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let all = left.list_conversations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(left.count_messages(all[0].id, true).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(make_config(&dir.path().join("shutdown.db")))
            .await
            .unwrap();
        storage
            .record_message(&sms("+1", "+2", "bye"), DeliveryStatus::Success, &CancellationToken::new())
            .await
            .unwrap();
        storage.shutdown().await.unwrap();
        storage.close().await.unwrap();
    }
}
