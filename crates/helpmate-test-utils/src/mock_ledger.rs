// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory notification ledger.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use helpmate_core::{
    AdapterType, HealthStatus, HelpmateError, NotificationEntry, NotificationId,
    NotificationKind, NotificationLedger, NotificationStatus, PluginAdapter, ResourceModel,
    UserId,
};

#[derive(Default)]
pub struct MockLedger {
    entries: Mutex<Vec<NotificationEntry>>,
    fail_record: AtomicBool,
    fail_preview: AtomicBool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded entry, oldest first.
    pub async fn entries(&self) -> Vec<NotificationEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Make `record` fail until turned off.
    pub fn fail_record(&self, fail: bool) {
        self.fail_record.store(fail, Ordering::SeqCst);
    }

    pub fn fail_preview(&self, fail: bool) {
        self.fail_preview.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for MockLedger {
    fn name(&self) -> &str {
        "mock-ledger"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ledger
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpmateError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpmateError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationLedger for MockLedger {
    async fn record(&self, entry: &NotificationEntry) -> Result<NotificationEntry, HelpmateError> {
        if self.fail_record.load(Ordering::SeqCst) {
            return Err(HelpmateError::Storage {
                source: "injected record failure".into(),
            });
        }
        let mut entries = self.entries.lock().await;
        if let Some(source) = &entry.source_message_id {
            if let Some(existing) = entries
                .iter()
                .find(|e| e.source_message_id.as_ref() == Some(source))
            {
                return Ok(existing.clone());
            }
        }
        entries.push(entry.clone());
        Ok(entry.clone())
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<NotificationEntry>, HelpmateError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .find(|e| &e.id == id)
            .cloned())
    }

    async fn expire_for_reader(
        &self,
        user_id: &UserId,
        resource_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, HelpmateError> {
        let mut entries = self.entries.lock().await;
        let mut changed = 0;
        for e in entries.iter_mut().filter(|e| {
            &e.user_id == user_id
                && e.resource_model == ResourceModel::HelpSession
                && e.resource_id == resource_id
                && e.kind == NotificationKind::Chat
                && !e.is_read
        }) {
            e.is_read = true;
            e.status = NotificationStatus::Expired;
            e.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn update_preview(
        &self,
        id: &NotificationId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), HelpmateError> {
        if self.fail_preview.load(Ordering::SeqCst) {
            return Err(HelpmateError::Storage {
                source: "injected preview failure".into(),
            });
        }
        if let Some(e) = self.entries.lock().await.iter_mut().find(|e| &e.id == id) {
            e.message = message.to_string();
            e.updated_at = now;
        }
        Ok(())
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, HelpmateError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| &e.user_id == user_id && !e.is_read)
            .count() as u64)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<NotificationEntry>, HelpmateError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect())
    }
}
