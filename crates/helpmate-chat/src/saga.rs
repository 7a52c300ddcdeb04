// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The notify-and-link half of the send saga.
//!
//! Shared by the send path and the backfill job. Both steps are keyed on the
//! message id: the ledger returns the existing entry for a message it has
//! already seen, and linking only fills an empty `notif_id`. Running it any
//! number of times leaves exactly one entry linked to the message.
//!
//! The entry's read state comes from the stored message, not the caller's
//! copy, so a backfill after the receiver read the thread records an entry
//! that is already read.

use chrono::{DateTime, Utc};
use helpmate_core::{
    ChatMessage, HelpmateError, MessageStore, NotificationEntry, NotificationId,
    NotificationLedger,
};

pub async fn ensure_notified(
    messages: &dyn MessageStore,
    ledger: &dyn NotificationLedger,
    message: &ChatMessage,
    now: DateTime<Utc>,
) -> Result<NotificationId, HelpmateError> {
    let current = messages.get_message(&message.id).await?;
    let source = current.as_ref().unwrap_or(message);
    let entry = ledger
        .record(&NotificationEntry::for_chat_message(source, now))
        .await?;
    messages.link_notification(&message.id, &entry.id).await?;
    Ok(entry.id)
}
