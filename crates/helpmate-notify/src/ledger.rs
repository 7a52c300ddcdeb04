// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed notification ledger.
//!
//! Entries live in the `notifications` table created by the storage
//! migrations. The `source_message_id` column is unique, which is what makes
//! [`NotificationLedger::record`] safe to repeat from the send saga and from
//! the reconciler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info};

use helpmate_core::{
    AdapterType, HealthStatus, HelpmateError, NotificationEntry, NotificationId,
    NotificationKind, NotificationLedger, NotificationStatus, PluginAdapter, ResourceModel,
    UserId,
};
use helpmate_storage::models::{enum_column, format_ts, ts_column};

const COLUMNS: &str = "id, user_id, resource_model, resource_id, title, message, kind, \
     status, is_read, source_message_id, created_at, updated_at";

/// Convert a tokio-rusqlite error into HelpmateError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HelpmateError {
    HelpmateError::Storage {
        source: Box::new(e),
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationEntry> {
    Ok(NotificationEntry {
        id: row.get::<_, String>(0)?.into(),
        user_id: row.get::<_, String>(1)?.into(),
        resource_model: enum_column(row, 2)?,
        resource_id: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        kind: enum_column(row, 6)?,
        status: enum_column(row, 7)?,
        is_read: row.get(8)?,
        source_message_id: row.get::<_, Option<String>>(9)?.map(Into::into),
        created_at: ts_column(row, 10)?,
        updated_at: ts_column(row, 11)?,
    })
}

/// Persistent notification ledger.
pub struct SqliteNotificationLedger {
    conn: tokio_rusqlite::Connection,
}

impl SqliteNotificationLedger {
    /// Wrap an existing connection, normally the storage writer's.
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Open a ledger on a database file whose schema is already migrated.
    pub async fn open(path: &str) -> Result<Self, HelpmateError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| HelpmateError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl PluginAdapter for SqliteNotificationLedger {
    fn name(&self) -> &str {
        "sqlite-ledger"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ledger
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpmateError> {
        self.conn
            .call(|conn| conn.execute_batch("SELECT 1 FROM notifications LIMIT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpmateError> {
        debug!("notification ledger shut down");
        Ok(())
    }
}

#[async_trait]
impl NotificationLedger for SqliteNotificationLedger {
    async fn record(&self, entry: &NotificationEntry) -> Result<NotificationEntry, HelpmateError> {
        let e = entry.clone();
        let (stored, inserted) = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let inserted = tx.execute(
                    "INSERT INTO notifications (id, user_id, resource_model, resource_id, title,
                         message, kind, status, is_read, source_message_id, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(source_message_id) DO NOTHING",
                    params![
                        e.id.as_str(),
                        e.user_id.as_str(),
                        e.resource_model.to_string(),
                        e.resource_id,
                        e.title,
                        e.message,
                        e.kind.to_string(),
                        e.status.to_string(),
                        e.is_read,
                        e.source_message_id.as_ref().map(|m| m.as_str().to_string()),
                        format_ts(e.created_at),
                        format_ts(e.updated_at),
                    ],
                )? == 1;
                let stored = match &e.source_message_id {
                    Some(source) => tx.query_row(
                        &format!("SELECT {COLUMNS} FROM notifications WHERE source_message_id = ?1"),
                        params![source.as_str()],
                        entry_from_row,
                    )?,
                    None => tx.query_row(
                        &format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1"),
                        params![e.id.as_str()],
                        entry_from_row,
                    )?,
                };
                tx.commit()?;
                Ok((stored, inserted))
            })
            .await
            .map_err(map_tr_err)?;

        if inserted {
            info!(
                notif_id = %stored.id,
                user_id = %stored.user_id,
                resource_id = %stored.resource_id,
                "notification recorded"
            );
        } else {
            debug!(notif_id = %stored.id, "notification already recorded for message");
        }
        Ok(stored)
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<NotificationEntry>, HelpmateError> {
        let id = id.as_str().to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1"),
                    params![id],
                    entry_from_row,
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn expire_for_reader(
        &self,
        user_id: &UserId,
        resource_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, HelpmateError> {
        let user_id = user_id.as_str().to_string();
        let resource_id = resource_id.to_string();
        let model = ResourceModel::HelpSession.to_string();
        let chat = NotificationKind::Chat.to_string();
        let expired = NotificationStatus::Expired.to_string();
        self.conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE notifications SET is_read = 1, status = ?1, updated_at = ?2
                     WHERE user_id = ?3 AND resource_model = ?4 AND resource_id = ?5
                       AND kind = ?6 AND is_read = 0",
                    params![expired, format_ts(now), user_id, model, resource_id, chat],
                )?;
                Ok(changed as u64)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn update_preview(
        &self,
        id: &NotificationId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), HelpmateError> {
        let id = id.as_str().to_string();
        let message = message.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE notifications SET message = ?1, updated_at = ?2 WHERE id = ?3",
                    params![message, format_ts(now), id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, HelpmateError> {
        let user_id = user_id.as_str().to_string();
        self.conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                    params![user_id],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<NotificationEntry>, HelpmateError> {
        let user_id = user_id.as_str().to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM notifications WHERE user_id = ?1
                     ORDER BY created_at DESC, rowid DESC"
                ))?;
                let rows = stmt.query_map(params![user_id], entry_from_row)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(map_tr_err)
    }
}
