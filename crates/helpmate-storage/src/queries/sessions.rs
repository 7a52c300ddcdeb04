// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Help session persistence.

use chrono::{DateTime, Utc};
use helpmate_core::{HelpSession, HelpmateError, SessionId, SessionOrigin, SessionStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{SESSION_COLUMNS, format_ts, session_from_row};

pub async fn create_session(db: &Database, session: &HelpSession) -> Result<(), HelpmateError> {
    let session = session.clone();
    let (origin_kind, origin_id) = match &session.origin {
        Some(SessionOrigin::Offer(id)) => (Some("offer"), Some(id.clone())),
        Some(SessionOrigin::Request(id)) => (Some("request"), Some(id.clone())),
        None => (None, None),
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO help_sessions (id, requester_id, helper_id, origin_kind, origin_id,
                     status, started_at, ended_at, result, finalized_by, rating_pending)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.id.as_str(),
                    session.requester_id.as_str(),
                    session.helper_id.as_str(),
                    origin_kind,
                    origin_id,
                    session.status.to_string(),
                    format_ts(session.started_at),
                    session.ended_at.map(format_ts),
                    session.result,
                    session.finalized_by.as_ref().map(|u| u.as_str().to_string()),
                    session.rating_pending,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_session(
    db: &Database,
    id: &SessionId,
) -> Result<Option<HelpSession>, HelpmateError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM help_sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Moves a session along its lifecycle, stamping `ended_at` on terminal states.
///
/// The read and the write share one transaction on the writer thread, so two
/// racing transitions cannot both succeed from the same starting status.
pub async fn transition_session_status(
    db: &Database,
    id: &SessionId,
    next: SessionStatus,
    now: DateTime<Utc>,
) -> Result<HelpSession, HelpmateError> {
    let session_id = id.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let current = tx
                .query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM help_sessions WHERE id = ?1"),
                    params![session_id.as_str()],
                    session_from_row,
                )
                .optional()?;
            let Some(mut session) = current else {
                return Ok(Err(HelpmateError::SessionNotFound(session_id)));
            };
            if !session.status.can_transition_to(next) {
                return Ok(Err(HelpmateError::InvalidTransition {
                    from: session.status,
                    to: next,
                }));
            }

            session.status = next;
            if next.is_terminal() {
                session.ended_at = Some(now);
            }
            tx.execute(
                "UPDATE help_sessions SET status = ?1, ended_at = ?2 WHERE id = ?3",
                params![
                    next.to_string(),
                    session.ended_at.map(format_ts),
                    session.id.as_str()
                ],
            )?;
            tx.commit()?;
            Ok(Ok(session))
        })
        .await
        .map_err(map_tr_err)?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use helpmate_core::UserId;
    use tempfile::tempdir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn pending_session(id: &str) -> HelpSession {
        HelpSession::new(
            SessionId::from(id),
            UserId::from("alice"),
            UserId::from("bob"),
            Some(SessionOrigin::Request("req-7".into())),
            t0(),
        )
        .unwrap()
    }

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("sessions.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_get_round_trips_fields() {
        let (db, _dir) = setup().await;
        let session = pending_session("s-1");
        create_session(&db, &session).await.unwrap();

        let loaded = get_session(&db, &session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn get_missing_session_is_none() {
        let (db, _dir) = setup().await;
        let missing = get_session(&db, &SessionId::from("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn lifecycle_sets_ended_at_on_terminal() {
        let (db, _dir) = setup().await;
        let session = pending_session("s-2");
        create_session(&db, &session).await.unwrap();

        let active = transition_session_status(&db, &session.id, SessionStatus::Active, t0())
            .await
            .unwrap();
        assert_eq!(active.status, SessionStatus::Active);
        assert!(active.ended_at.is_none());

        let later = t0() + chrono::Duration::minutes(30);
        let done = transition_session_status(&db, &session.id, SessionStatus::Completed, later)
            .await
            .unwrap();
        assert_eq!(done.ended_at, Some(later));

        let stored = get_session(&db, &session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(stored.ended_at, Some(later));
    }

    #[tokio::test]
    async fn terminal_sessions_cannot_be_revived() {
        let (db, _dir) = setup().await;
        let session = pending_session("s-3");
        create_session(&db, &session).await.unwrap();
        transition_session_status(&db, &session.id, SessionStatus::Cancelled, t0())
            .await
            .unwrap();

        let err = transition_session_status(&db, &session.id, SessionStatus::Active, t0())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HelpmateError::InvalidTransition {
                from: SessionStatus::Cancelled,
                to: SessionStatus::Active
            }
        ));
    }

    #[tokio::test]
    async fn transition_of_missing_session_is_not_found() {
        let (db, _dir) = setup().await;
        let err = transition_session_status(&db, &SessionId::from("ghost"), SessionStatus::Active, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::SessionNotFound(_)));
    }
}
