// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message persistence.
//!
//! Mutations are single conditional statements: the read flag only moves
//! from 0 to 1, edits only land while `is_read = 0`, and a notification is
//! linked at most once.

use chrono::{DateTime, Utc};
use helpmate_core::{
    Attachment, ChatMessage, HelpmateError, MessageId, NotificationId, SessionId, UserId,
};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, attachments_to_json, format_ts, message_from_row};

/// Insert a message. Returns `false` if its client key was already used by
/// the same sender in the same session.
pub async fn insert_message(db: &Database, message: &ChatMessage) -> Result<bool, HelpmateError> {
    let msg = message.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO chat_messages (id, session_id, sender_id, receiver_id, content,
                     attachments, notif_id, is_read, edited, client_key, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT DO NOTHING",
                params![
                    msg.id.as_str(),
                    msg.session_id.as_str(),
                    msg.sender_id.as_str(),
                    msg.receiver_id.as_str(),
                    msg.content,
                    attachments_to_json(&msg.attachments)?,
                    msg.notif_id.as_ref().map(|n| n.as_str().to_string()),
                    msg.is_read,
                    msg.edited,
                    msg.client_key,
                    format_ts(msg.created_at),
                    format_ts(msg.updated_at),
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_message(
    db: &Database,
    id: &MessageId,
) -> Result<Option<ChatMessage>, HelpmateError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_by_client_key(
    db: &Database,
    session_id: &SessionId,
    sender_id: &UserId,
    client_key: &str,
) -> Result<Option<ChatMessage>, HelpmateError> {
    let session_id = session_id.as_str().to_string();
    let sender_id = sender_id.as_str().to_string();
    let client_key = client_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM chat_messages
                     WHERE session_id = ?1 AND sender_id = ?2 AND client_key = ?3"
                ),
                params![session_id, sender_id, client_key],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The thread of a session, oldest first; equal timestamps keep insertion order.
pub async fn list_messages(
    db: &Database,
    session_id: &SessionId,
) -> Result<Vec<ChatMessage>, HelpmateError> {
    let session_id = session_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM chat_messages
                 WHERE session_id = ?1 ORDER BY created_at ASC, seq ASC"
            ))?;
            let rows = stmt.query_map(params![session_id], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn mark_read_for_receiver(
    db: &Database,
    session_id: &SessionId,
    receiver_id: &UserId,
) -> Result<u64, HelpmateError> {
    let session_id = session_id.as_str().to_string();
    let receiver_id = receiver_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_messages SET is_read = 1
                 WHERE session_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                params![session_id, receiver_id],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns `false` if the message was read before the edit landed.
pub async fn update_message_body(
    db: &Database,
    id: &MessageId,
    content: &str,
    attachments: &[Attachment],
    updated_at: DateTime<Utc>,
) -> Result<bool, HelpmateError> {
    let id = id.as_str().to_string();
    let content = content.to_string();
    let attachments = attachments.to_vec();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_messages
                 SET content = ?1, attachments = ?2, edited = 1, updated_at = ?3
                 WHERE id = ?4 AND is_read = 0",
                params![
                    content,
                    attachments_to_json(&attachments)?,
                    format_ts(updated_at),
                    id
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Strip revoked handles from a message's attachment list.
pub async fn drop_attachments(
    db: &Database,
    id: &MessageId,
    handles: &[String],
) -> Result<(), HelpmateError> {
    let id = id.as_str().to_string();
    let handles = handles.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let current = tx
                .query_row(
                    &format!("SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE id = ?1"),
                    params![id],
                    message_from_row,
                )
                .optional()?;
            if let Some(message) = current {
                let kept: Vec<Attachment> = message
                    .attachments
                    .into_iter()
                    .filter(|a| !handles.contains(&a.handle))
                    .collect();
                tx.execute(
                    "UPDATE chat_messages SET attachments = ?1 WHERE id = ?2",
                    params![attachments_to_json(&kept)?, id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn link_notification(
    db: &Database,
    id: &MessageId,
    notif_id: &NotificationId,
) -> Result<(), HelpmateError> {
    let id = id.as_str().to_string();
    let notif_id = notif_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE chat_messages SET notif_id = ?1 WHERE id = ?2 AND notif_id IS NULL",
                params![notif_id, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Unlinked messages created at or before `cutoff`, oldest first.
pub async fn list_unlinked(
    db: &Database,
    cutoff: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<ChatMessage>, HelpmateError> {
    let cutoff = format_ts(cutoff);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM chat_messages
                 WHERE notif_id IS NULL AND created_at <= ?1
                 ORDER BY created_at ASC, seq ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![cutoff, limit], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
