// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ready-made collaborator bundles for chat service and gateway tests.
//!
//! [`MockBackend`] is fully in-memory with failure injection.
//! [`SqliteHarness`] runs the real SQLite storage and ledger on a temp file.

use std::sync::Arc;

use helpmate_config::model::{HelpmateConfig, StorageConfig};
use helpmate_core::{HelpSession, HelpmateError, StorageAdapter};
use helpmate_notify::SqliteNotificationLedger;
use helpmate_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::fixtures::t0;
use crate::mock_attachments::MockAttachments;
use crate::mock_ledger::MockLedger;
use crate::mock_store::MockStore;

/// In-memory collaborators sharing one manual clock set to [`t0`].
pub struct MockBackend {
    pub store: Arc<MockStore>,
    pub ledger: Arc<MockLedger>,
    pub attachments: Arc<MockAttachments>,
    pub clock: Arc<ManualClock>,
}

impl MockBackend {
    pub async fn with_sessions(sessions: impl IntoIterator<Item = HelpSession>) -> Self {
        Self {
            store: Arc::new(MockStore::with_sessions(sessions).await),
            ledger: Arc::new(MockLedger::new()),
            attachments: Arc::new(MockAttachments::new()),
            clock: Arc::new(ManualClock::at(t0())),
        }
    }
}

/// Builder for [`SqliteHarness`].
pub struct SqliteHarnessBuilder {
    config: HelpmateConfig,
    sessions: Vec<HelpSession>,
}

impl SqliteHarnessBuilder {
    fn new() -> Self {
        Self {
            config: HelpmateConfig::default(),
            sessions: Vec::new(),
        }
    }

    /// Start from this configuration. The storage path is always replaced
    /// by a temp file.
    pub fn with_config(mut self, config: HelpmateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_session(mut self, session: HelpSession) -> Self {
        self.sessions.push(session);
        self
    }

    pub async fn build(self) -> Result<SqliteHarness, HelpmateError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| HelpmateError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("helpmate-test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let ledger = SqliteNotificationLedger::new(storage.shared_connection()?);
        for session in &self.sessions {
            storage.create_session(session).await?;
        }

        Ok(SqliteHarness {
            storage: Arc::new(storage),
            ledger: Arc::new(ledger),
            attachments: Arc::new(MockAttachments::new()),
            clock: Arc::new(ManualClock::at(t0())),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// Real SQLite storage and ledger on a throwaway database file.
pub struct SqliteHarness {
    pub storage: Arc<SqliteStorage>,
    pub ledger: Arc<SqliteNotificationLedger>,
    pub attachments: Arc<MockAttachments>,
    pub clock: Arc<ManualClock>,
    pub config: HelpmateConfig,
    _temp_dir: tempfile::TempDir,
}

impl SqliteHarness {
    pub fn builder() -> SqliteHarnessBuilder {
        SqliteHarnessBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::active_session;
    use helpmate_core::{NotificationLedger, SessionId, SessionStore};

    #[tokio::test]
    async fn sqlite_harness_seeds_sessions() {
        let harness = SqliteHarness::builder()
            .with_session(active_session("s-1"))
            .build()
            .await
            .unwrap();
        let session = harness
            .storage
            .get_session(&SessionId::from("s-1"))
            .await
            .unwrap();
        assert!(session.is_some());
        assert_eq!(
            harness
                .ledger
                .unread_count(&crate::fixtures::bob())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn mock_backend_starts_at_epoch() {
        use helpmate_core::Clock;
        let backend = MockBackend::with_sessions([active_session("s-1")]).await;
        assert_eq!(backend.clock.now(), t0());
        assert!(
            backend
                .store
                .get_session(&SessionId::from("s-1"))
                .await
                .unwrap()
                .is_some()
        );
    }
}
