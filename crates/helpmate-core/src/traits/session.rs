// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only view of the session store consumed by the chat core.

use async_trait::async_trait;

use crate::error::HelpmateError;
use crate::types::{HelpSession, SessionId};

/// Session lookup. Status changes belong to the surrounding offer/request
/// workflow, so the chat core only ever reads sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session, or `None` if it does not exist.
    async fn get_session(&self, id: &SessionId) -> Result<Option<HelpSession>, HelpmateError>;
}
