// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Helpmate chat core.

use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::types::{MessageId, SessionId, SessionStatus};

/// Coarse classification of a [`HelpmateError`].
///
/// The kind is the stable, client-facing part of an error; the HTTP layer maps
/// it to a status code and never exposes anything finer for storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Forbidden,
    InvalidState,
    Validation,
    DependencyFailure,
    Internal,
}

/// The primary error type used across all Helpmate crates.
#[derive(Debug, Error)]
pub enum HelpmateError {
    /// Configuration errors (invalid TOML, failed validation).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No authenticated caller identity was supplied.
    #[error("caller identity is missing or invalid")]
    Unauthorized,

    #[error("help session {0} not found")]
    SessionNotFound(SessionId),

    #[error("message {0} not found")]
    MessageNotFound(MessageId),

    #[error("caller is not a participant of this help session")]
    NotAParticipant,

    #[error("only the sender of a message may edit it")]
    NotSender,

    #[error("only the receiver of a message may mark it as read")]
    NotReceiver,

    /// Messages may only be sent (and, by policy, edited) in an active session.
    #[error("help session is {status}; only active sessions accept messages")]
    SessionNotActive { status: SessionStatus },

    #[error("messages can only be edited within {} seconds of sending", window.as_secs())]
    EditWindowExpired { window: Duration },

    #[error("message has already been read and can no longer be edited")]
    AlreadyRead,

    /// A session status change that would revive or skip a lifecycle state.
    #[error("cannot move help session from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Input rejected before any mutation (empty content, oversized payload, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// An external collaborator (attachment storage, notification ledger) failed.
    #[error("dependency failure: {message}")]
    Dependency {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HelpmateError {
    /// Returns the coarse error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HelpmateError::SessionNotFound(_) | HelpmateError::MessageNotFound(_) => {
                ErrorKind::NotFound
            }
            HelpmateError::Unauthorized => ErrorKind::Unauthorized,
            HelpmateError::NotAParticipant
            | HelpmateError::NotSender
            | HelpmateError::NotReceiver => ErrorKind::Forbidden,
            HelpmateError::SessionNotActive { .. }
            | HelpmateError::EditWindowExpired { .. }
            | HelpmateError::AlreadyRead
            | HelpmateError::InvalidTransition { .. } => ErrorKind::InvalidState,
            HelpmateError::Validation(_) => ErrorKind::Validation,
            HelpmateError::Dependency { .. } => ErrorKind::DependencyFailure,
            HelpmateError::Config(_) | HelpmateError::Storage { .. } | HelpmateError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns a stable snake_case code naming the exact failure.
    pub fn code(&self) -> &'static str {
        match self {
            HelpmateError::Config(_) => "config",
            HelpmateError::Storage { .. } => "storage",
            HelpmateError::Unauthorized => "unauthorized",
            HelpmateError::SessionNotFound(_) => "session_not_found",
            HelpmateError::MessageNotFound(_) => "message_not_found",
            HelpmateError::NotAParticipant => "not_a_participant",
            HelpmateError::NotSender => "not_sender",
            HelpmateError::NotReceiver => "not_receiver",
            HelpmateError::SessionNotActive { .. } => "session_not_active",
            HelpmateError::EditWindowExpired { .. } => "edit_window_expired",
            HelpmateError::AlreadyRead => "already_read",
            HelpmateError::InvalidTransition { .. } => "invalid_transition",
            HelpmateError::Validation(_) => "validation",
            HelpmateError::Dependency { .. } => "dependency_failure",
            HelpmateError::Internal(_) => "internal",
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Storage, configuration and internal errors collapse to a generic text so
    /// that no backend detail leaks through the API.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal server error".to_string(),
            ErrorKind::DependencyFailure => match self {
                HelpmateError::Dependency { message, .. } => message.clone(),
                _ => "a dependent service failed".to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Shorthand for wrapping an arbitrary error as a dependency failure.
    pub fn dependency(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        HelpmateError::Dependency {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
