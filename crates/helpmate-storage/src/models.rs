// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row codecs between SQLite columns and the core entity types.
//!
//! Timestamps are stored as fixed-width UTC text (`2026-01-01T00:00:00.000Z`)
//! so that lexical order equals chronological order.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use helpmate_core::{Attachment, ChatMessage, HelpSession, SessionOrigin, SessionStatus};

pub(crate) const MESSAGE_COLUMNS: &str = "id, session_id, sender_id, receiver_id, content, \
     attachments, notif_id, is_read, edited, client_key, created_at, updated_at";

pub(crate) const SESSION_COLUMNS: &str = "id, requester_id, helper_id, origin_kind, origin_id, \
     status, started_at, ended_at, result, finalized_by, rating_pending";

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => ts_column(row, idx).map(Some),
        None => Ok(None),
    }
}

/// Parse a strum-backed enum stored as text.
pub fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = strum::ParseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn attachments_to_json(attachments: &[Attachment]) -> rusqlite::Result<String> {
    serde_json::to_string(attachments).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Maps a row selected with [`MESSAGE_COLUMNS`].
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let attachments: String = row.get(5)?;
    Ok(ChatMessage {
        id: row.get::<_, String>(0)?.into(),
        session_id: row.get::<_, String>(1)?.into(),
        sender_id: row.get::<_, String>(2)?.into(),
        receiver_id: row.get::<_, String>(3)?.into(),
        content: row.get(4)?,
        attachments: serde_json::from_str(&attachments).map_err(|e| conversion_err(5, e))?,
        notif_id: row.get::<_, Option<String>>(6)?.map(Into::into),
        is_read: row.get(7)?,
        edited: row.get(8)?,
        client_key: row.get(9)?,
        created_at: ts_column(row, 10)?,
        updated_at: ts_column(row, 11)?,
    })
}

/// Maps a row selected with [`SESSION_COLUMNS`].
pub(crate) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<HelpSession> {
    let origin_kind: Option<String> = row.get(3)?;
    let origin_id: Option<String> = row.get(4)?;
    let origin = match (origin_kind.as_deref(), origin_id) {
        (Some("offer"), Some(id)) => Some(SessionOrigin::Offer(id)),
        (Some("request"), Some(id)) => Some(SessionOrigin::Request(id)),
        _ => None,
    };
    Ok(HelpSession {
        id: row.get::<_, String>(0)?.into(),
        requester_id: row.get::<_, String>(1)?.into(),
        helper_id: row.get::<_, String>(2)?.into(),
        origin,
        status: enum_column::<SessionStatus>(row, 5)?,
        started_at: ts_column(row, 6)?,
        ended_at: opt_ts_column(row, 7)?,
        result: row.get(8)?,
        finalized_by: row.get::<_, Option<String>>(9)?.map(Into::into),
        rating_pending: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(5);
        assert_eq!(format_ts(a), "2026-01-01T09:00:00.000Z");
        assert!(format_ts(a) < format_ts(b));
        assert_eq!(format_ts(a).len(), format_ts(b).len());
    }
}
