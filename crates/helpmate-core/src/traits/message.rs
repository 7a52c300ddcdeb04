// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message persistence trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HelpmateError;
use crate::types::{Attachment, ChatMessage, MessageId, NotificationId, SessionId, UserId};

/// Persistence for chat messages.
///
/// Every mutating method is written as a conditional single-statement update
/// so that concurrent callers cannot undo each other: read flags only ever go
/// from false to true, and an edit only lands on a message that is still
/// unread.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts a new message.
    ///
    /// Returns `false` without writing when a message with the same
    /// `(session_id, sender_id, client_key)` already exists.
    async fn insert_message(&self, message: &ChatMessage) -> Result<bool, HelpmateError>;

    async fn get_message(&self, id: &MessageId) -> Result<Option<ChatMessage>, HelpmateError>;

    /// Looks up a previous send by its client idempotency key.
    async fn find_by_client_key(
        &self,
        session_id: &SessionId,
        sender_id: &UserId,
        client_key: &str,
    ) -> Result<Option<ChatMessage>, HelpmateError>;

    /// All messages of a session, by `created_at` then insertion order.
    async fn list_messages(&self, session_id: &SessionId)
    -> Result<Vec<ChatMessage>, HelpmateError>;

    /// Marks every unread message of the session addressed to `receiver_id` as
    /// read. Returns the number of messages that changed.
    async fn mark_read_for_receiver(
        &self,
        session_id: &SessionId,
        receiver_id: &UserId,
    ) -> Result<u64, HelpmateError>;

    /// Replaces content and attachments, sets `edited` and bumps `updated_at`,
    /// but only while the message is unread. Returns `false` if the message
    /// was read (or vanished) in the meantime.
    async fn update_message_body(
        &self,
        id: &MessageId,
        content: &str,
        attachments: &[Attachment],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, HelpmateError>;

    /// Removes the attachments with the given handles, keeping the order of
    /// the rest. Applies whatever the read state; `edited` and `updated_at`
    /// are left alone.
    async fn drop_attachments(&self, id: &MessageId, handles: &[String])
    -> Result<(), HelpmateError>;

    /// Sets `notif_id` if it is still unset.
    async fn link_notification(
        &self,
        id: &MessageId,
        notif_id: &NotificationId,
    ) -> Result<(), HelpmateError>;

    /// Messages whose notification was never linked, created before `cutoff`,
    /// oldest first.
    async fn list_unlinked(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, HelpmateError>;
}
