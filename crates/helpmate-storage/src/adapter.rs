// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the session and message store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use helpmate_config::model::StorageConfig;
use helpmate_core::{
    AdapterType, Attachment, ChatMessage, HealthStatus, HelpSession, HelpmateError, MessageId,
    MessageStore, NotificationId, PluginAdapter, SessionId, SessionStatus, SessionStore,
    StorageAdapter, UserId,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed session and message store.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The underlying database, once initialized.
    pub fn database(&self) -> Result<&Database, HelpmateError> {
        self.db.get().ok_or_else(|| HelpmateError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// A handle onto the single writer connection, for collaborators that
    /// keep their tables in the same file.
    pub fn shared_connection(&self) -> Result<tokio_rusqlite::Connection, HelpmateError> {
        Ok(self.database()?.connection().clone())
    }

    /// Inserts a help session. Used by the surrounding offer/request workflow.
    pub async fn create_session(&self, session: &HelpSession) -> Result<(), HelpmateError> {
        queries::sessions::create_session(self.database()?, session).await?;
        debug!(session_id = %session.id, status = %session.status, "help session created");
        Ok(())
    }

    /// Monotonic status change; terminal states are frozen.
    pub async fn transition_session_status(
        &self,
        id: &SessionId,
        next: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<HelpSession, HelpmateError> {
        let session =
            queries::sessions::transition_session_status(self.database()?, id, next, now).await?;
        info!(session_id = %id, status = %next, "help session status changed");
        Ok(session)
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

    async fn health_check(&self) -> Result<HealthStatus, HelpmateError> {
        let Ok(db) = self.database() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".into()));
        };
        db.connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpmateError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), HelpmateError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HelpmateError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HelpmateError> {
        self.database()?.checkpoint().await
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn get_session(&self, id: &SessionId) -> Result<Option<HelpSession>, HelpmateError> {
        queries::sessions::get_session(self.database()?, id).await
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn insert_message(&self, message: &ChatMessage) -> Result<bool, HelpmateError> {
        queries::messages::insert_message(self.database()?, message).await
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<ChatMessage>, HelpmateError> {
        queries::messages::get_message(self.database()?, id).await
    }

    async fn find_by_client_key(
        &self,
        session_id: &SessionId,
        sender_id: &UserId,
        client_key: &str,
    ) -> Result<Option<ChatMessage>, HelpmateError> {
        queries::messages::find_by_client_key(self.database()?, session_id, sender_id, client_key)
            .await
    }

    async fn list_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, HelpmateError> {
        queries::messages::list_messages(self.database()?, session_id).await
    }

    async fn mark_read_for_receiver(
        &self,
        session_id: &SessionId,
        receiver_id: &UserId,
    ) -> Result<u64, HelpmateError> {
        queries::messages::mark_read_for_receiver(self.database()?, session_id, receiver_id).await
    }

    async fn update_message_body(
        &self,
        id: &MessageId,
        content: &str,
        attachments: &[Attachment],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, HelpmateError> {
        queries::messages::update_message_body(
            self.database()?,
            id,
            content,
            attachments,
            updated_at,
        )
        .await
    }

    async fn drop_attachments(
        &self,
        id: &MessageId,
        handles: &[String],
    ) -> Result<(), HelpmateError> {
        queries::messages::drop_attachments(self.database()?, id, handles).await
    }

    async fn link_notification(
        &self,
        id: &MessageId,
        notif_id: &NotificationId,
    ) -> Result<(), HelpmateError> {
        queries::messages::link_notification(self.database()?, id, notif_id).await
    }

    async fn list_unlinked(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, HelpmateError> {
        queries::messages::list_unlinked(self.database()?, cutoff, limit).await
    }
}
