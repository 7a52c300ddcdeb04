// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity types shared by the store traits, the chat service, and the gateway.
//!
//! Constructors validate the structural invariants (two distinct participants,
//! non-empty content) so that an invalid record can never be built and handed
//! to a store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HelpmateError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generates a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an end user (requester, helper, or notification addressee).
    UserId
);
string_id!(
    /// Unique identifier for a help session.
    SessionId
);
string_id!(
    /// Unique identifier for a chat message.
    MessageId
);
string_id!(
    /// Unique identifier for a notification ledger entry.
    NotificationId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of backing adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Ledger,
    Attachments,
}

// --- Help sessions ---

/// Lifecycle status of a help session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Completed and cancelled sessions are frozen.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` respects the monotonic lifecycle
    /// `pending -> active -> completed | cancelled` (or `pending -> cancelled`).
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Pending, SessionStatus::Active)
                | (SessionStatus::Pending, SessionStatus::Cancelled)
                | (SessionStatus::Active, SessionStatus::Completed)
                | (SessionStatus::Active, SessionStatus::Cancelled)
        )
    }
}

/// The offer or request a session was created from. At most one is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SessionOrigin {
    Offer(String),
    Request(String),
}

/// A two-party help session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpSession {
    pub id: SessionId,
    pub requester_id: UserId,
    pub helper_id: UserId,
    pub origin: Option<SessionOrigin>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub finalized_by: Option<UserId>,
    pub rating_pending: bool,
}

impl HelpSession {
    /// Creates a pending session between a requester and a helper.
    pub fn new(
        id: SessionId,
        requester_id: UserId,
        helper_id: UserId,
        origin: Option<SessionOrigin>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, HelpmateError> {
        if requester_id.as_str().trim().is_empty() || helper_id.as_str().trim().is_empty() {
            return Err(HelpmateError::Validation(
                "help session participants must not be empty".to_string(),
            ));
        }
        if requester_id == helper_id {
            return Err(HelpmateError::Validation(
                "help session requires two distinct participants".to_string(),
            ));
        }
        Ok(Self {
            id,
            requester_id,
            helper_id,
            origin,
            status: SessionStatus::Pending,
            started_at,
            ended_at: None,
            result: None,
            finalized_by: None,
            rating_pending: false,
        })
    }

    /// Returns the session with the given status, for fixtures and seeding.
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn participants(&self) -> [&UserId; 2] {
        [&self.requester_id, &self.helper_id]
    }
}

// --- Chat messages ---

/// A stored attachment reference: the public URL and the handle used to revoke it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub handle: String,
}

/// One message in a help session thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    /// Display order is the vector order.
    pub attachments: Vec<Attachment>,
    /// Ledger entry created for this message; `None` until the send saga links it.
    pub notif_id: Option<NotificationId>,
    pub is_read: bool,
    pub edited: bool,
    /// Client-supplied idempotency key for send retries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Builds a new unread, unedited message.
    pub fn new(
        session_id: SessionId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        attachments: Vec<Attachment>,
        client_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, HelpmateError> {
        if sender_id == receiver_id {
            return Err(HelpmateError::Validation(
                "sender and receiver must differ".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(HelpmateError::Validation(
                "message content must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: MessageId::generate(),
            session_id,
            sender_id,
            receiver_id,
            content,
            attachments,
            notif_id: None,
            is_read: false,
            edited: false,
            client_key,
            created_at: now,
            updated_at: now,
        })
    }
}

// --- Notification ledger ---

/// What a notification entry refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ResourceModel {
    HelpSession,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Chat,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Active,
    Expired,
}

/// A denormalized, addressee-specific notification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: NotificationId,
    pub user_id: UserId,
    pub resource_model: ResourceModel,
    pub resource_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub is_read: bool,
    /// The chat message this entry was created for; the idempotency key of the send saga.
    pub source_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationEntry {
    /// Title used for chat notifications.
    pub const CHAT_TITLE: &'static str = "New chat message";

    /// Builds the chat notification for a message, addressed to its receiver
    /// and referencing its session. A message the receiver has already read
    /// gets an entry that is born read and expired.
    pub fn for_chat_message(message: &ChatMessage, now: DateTime<Utc>) -> Self {
        let status = if message.is_read {
            NotificationStatus::Expired
        } else {
            NotificationStatus::Active
        };
        Self {
            id: NotificationId::generate(),
            user_id: message.receiver_id.clone(),
            resource_model: ResourceModel::HelpSession,
            resource_id: message.session_id.0.clone(),
            title: Self::CHAT_TITLE.to_string(),
            message: message.content.clone(),
            kind: NotificationKind::Chat,
            status,
            is_read: message.is_read,
            source_message_id: Some(message.id.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}
