// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification ledger trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HelpmateError;
use crate::types::{NotificationEntry, NotificationId, UserId};

/// Append-only ledger of user-facing notification records.
#[async_trait]
pub trait NotificationLedger: Send + Sync {
    /// Records `entry`, keyed on `entry.source_message_id`.
    ///
    /// If an entry for the same source message already exists, nothing is
    /// written and the existing entry is returned, which makes the send saga
    /// safe to repeat.
    async fn record(&self, entry: &NotificationEntry) -> Result<NotificationEntry, HelpmateError>;

    async fn get(&self, id: &NotificationId) -> Result<Option<NotificationEntry>, HelpmateError>;

    /// Marks every unread entry addressed to `user_id` about `resource_id`
    /// as read and expired. Returns the number of entries that changed.
    async fn expire_for_reader(
        &self,
        user_id: &UserId,
        resource_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, HelpmateError>;

    /// Rewrites the preview text of an entry.
    async fn update_preview(
        &self,
        id: &NotificationId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), HelpmateError>;

    /// Number of unread entries addressed to `user_id`.
    async fn unread_count(&self, user_id: &UserId) -> Result<u64, HelpmateError>;

    /// All entries addressed to `user_id`, newest first.
    async fn list_for_user(&self, user_id: &UserId)
    -> Result<Vec<NotificationEntry>, HelpmateError>;
}
