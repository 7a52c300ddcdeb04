// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization predicates for help-session chat.
//!
//! Stateless and side-effect free. The service evaluates these before it
//! touches any store, so a refusal never leaves a partial write behind.

use helpmate_core::{ChatMessage, HelpSession, HelpmateError, UserId};

pub fn is_participant(session: &HelpSession, user: &UserId) -> bool {
    &session.requester_id == user || &session.helper_id == user
}

/// The other participant of `session`, as seen from `user`.
pub fn resolve_counterpart(session: &HelpSession, user: &UserId) -> Result<UserId, HelpmateError> {
    if &session.requester_id == user {
        Ok(session.helper_id.clone())
    } else if &session.helper_id == user {
        Ok(session.requester_id.clone())
    } else {
        Err(HelpmateError::NotAParticipant)
    }
}

pub fn is_sender(message: &ChatMessage, user: &UserId) -> bool {
    &message.sender_id == user
}

pub fn is_receiver(message: &ChatMessage, user: &UserId) -> bool {
    &message.receiver_id == user
}

pub fn require_participant(session: &HelpSession, user: &UserId) -> Result<(), HelpmateError> {
    if is_participant(session, user) {
        Ok(())
    } else {
        Err(HelpmateError::NotAParticipant)
    }
}

pub fn require_sender(message: &ChatMessage, user: &UserId) -> Result<(), HelpmateError> {
    if is_sender(message, user) {
        Ok(())
    } else {
        Err(HelpmateError::NotSender)
    }
}

pub fn require_receiver(message: &ChatMessage, user: &UserId) -> Result<(), HelpmateError> {
    if is_receiver(message, user) {
        Ok(())
    } else {
        Err(HelpmateError::NotReceiver)
    }
}
