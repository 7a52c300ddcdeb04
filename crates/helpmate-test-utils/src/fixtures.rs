// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: a fixed epoch, three users, and session builders.

use chrono::{DateTime, TimeZone, Utc};
use helpmate_core::{Attachment, HelpSession, SessionId, SessionOrigin, SessionStatus, UserId};

/// 2026-03-01T12:00:00Z.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The requester in every fixture session.
pub fn alice() -> UserId {
    UserId::from("alice")
}

/// The helper in every fixture session.
pub fn bob() -> UserId {
    UserId::from("bob")
}

/// Never a participant.
pub fn carol() -> UserId {
    UserId::from("carol")
}

/// A session between alice and bob with the given status, started at [`t0`].
pub fn session_with_status(id: &str, status: SessionStatus) -> HelpSession {
    HelpSession {
        id: SessionId::from(id),
        requester_id: alice(),
        helper_id: bob(),
        origin: Some(SessionOrigin::Offer(format!("offer-{id}"))),
        status,
        started_at: t0(),
        ended_at: None,
        result: None,
        finalized_by: None,
        rating_pending: false,
    }
}

pub fn active_session(id: &str) -> HelpSession {
    session_with_status(id, SessionStatus::Active)
}

pub fn attachment(name: &str) -> Attachment {
    Attachment {
        url: format!("https://files.example/{name}"),
        handle: name.to_string(),
    }
}
