// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session and message store.
//!
//! Messages are kept in insertion order, so a stable sort on `created_at`
//! reproduces the SQLite tie-break.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use helpmate_core::{
    Attachment, ChatMessage, HelpSession, HelpmateError, MessageId, MessageStore, NotificationId,
    SessionId, SessionStatus, SessionStore, UserId,
};

#[derive(Default)]
struct State {
    sessions: HashMap<SessionId, HelpSession>,
    messages: Vec<ChatMessage>,
}

/// A store whose individual calls can be made to fail.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<State>,
    fail_link: AtomicBool,
    fail_insert: AtomicBool,
    conflict_insert: AtomicBool,
    read_before_edit: AtomicBool,
    /// Number of successful `update_message_body` calls.
    body_updates: AtomicUsize,
}

fn injected(what: &str) -> HelpmateError {
    HelpmateError::Storage {
        source: format!("injected {what} failure").into(),
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_sessions(sessions: impl IntoIterator<Item = HelpSession>) -> Self {
        let store = Self::new();
        for session in sessions {
            store.put_session(session).await;
        }
        store
    }

    pub async fn put_session(&self, session: HelpSession) {
        self.state
            .lock()
            .await
            .sessions
            .insert(session.id.clone(), session);
    }

    /// Overwrites a session's status without lifecycle checks.
    pub async fn force_status(&self, id: &SessionId, status: SessionStatus) {
        if let Some(session) = self.state.lock().await.sessions.get_mut(id) {
            session.status = status;
        }
    }

    /// Every stored message in insertion order.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.messages.clone()
    }

    pub async fn message_count(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    /// Make `link_notification` fail until turned off.
    pub fn fail_link(&self, fail: bool) {
        self.fail_link.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Make `insert_message` report a conflict without writing.
    pub fn conflict_insert(&self, conflict: bool) {
        self.conflict_insert.store(conflict, Ordering::SeqCst);
    }

    /// Have the receiver read the message right before the next body update
    /// lands, so the update loses the race.
    pub fn read_before_edit(&self, read: bool) {
        self.read_before_edit.store(read, Ordering::SeqCst);
    }

    pub fn body_updates(&self) -> usize {
        self.body_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MockStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<HelpSession>, HelpmateError> {
        Ok(self.state.lock().await.sessions.get(id).cloned())
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn insert_message(&self, message: &ChatMessage) -> Result<bool, HelpmateError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(injected("insert"));
        }
        if self.conflict_insert.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut state = self.state.lock().await;
        if state.messages.iter().any(|m| m.id == message.id) {
            return Ok(false);
        }
        if let Some(key) = &message.client_key {
            let duplicate = state.messages.iter().any(|m| {
                m.session_id == message.session_id
                    && m.sender_id == message.sender_id
                    && m.client_key.as_ref() == Some(key)
            });
            if duplicate {
                return Ok(false);
            }
        }
        state.messages.push(message.clone());
        Ok(true)
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<ChatMessage>, HelpmateError> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().find(|m| &m.id == id).cloned())
    }

    async fn find_by_client_key(
        &self,
        session_id: &SessionId,
        sender_id: &UserId,
        client_key: &str,
    ) -> Result<Option<ChatMessage>, HelpmateError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .find(|m| {
                &m.session_id == session_id
                    && &m.sender_id == sender_id
                    && m.client_key.as_deref() == Some(client_key)
            })
            .cloned())
    }

    async fn list_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, HelpmateError> {
        let state = self.state.lock().await;
        let mut thread: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect();
        thread.sort_by_key(|m| m.created_at);
        Ok(thread)
    }

    async fn mark_read_for_receiver(
        &self,
        session_id: &SessionId,
        receiver_id: &UserId,
    ) -> Result<u64, HelpmateError> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for m in state.messages.iter_mut().filter(|m| {
            &m.session_id == session_id && &m.receiver_id == receiver_id && !m.is_read
        }) {
            m.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn update_message_body(
        &self,
        id: &MessageId,
        content: &str,
        attachments: &[Attachment],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, HelpmateError> {
        let mut state = self.state.lock().await;
        if self.read_before_edit.swap(false, Ordering::SeqCst) {
            if let Some(m) = state.messages.iter_mut().find(|m| &m.id == id) {
                m.is_read = true;
            }
        }
        let Some(m) = state.messages.iter_mut().find(|m| &m.id == id && !m.is_read) else {
            return Ok(false);
        };
        m.content = content.to_string();
        m.attachments = attachments.to_vec();
        m.edited = true;
        m.updated_at = updated_at;
        self.body_updates.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn drop_attachments(
        &self,
        id: &MessageId,
        handles: &[String],
    ) -> Result<(), HelpmateError> {
        let mut state = self.state.lock().await;
        if let Some(m) = state.messages.iter_mut().find(|m| &m.id == id) {
            m.attachments.retain(|a| !handles.contains(&a.handle));
        }
        Ok(())
    }

    async fn link_notification(
        &self,
        id: &MessageId,
        notif_id: &NotificationId,
    ) -> Result<(), HelpmateError> {
        if self.fail_link.load(Ordering::SeqCst) {
            return Err(injected("link"));
        }
        let mut state = self.state.lock().await;
        if let Some(m) = state
            .messages
            .iter_mut()
            .find(|m| &m.id == id && m.notif_id.is_none())
        {
            m.notif_id = Some(notif_id.clone());
        }
        Ok(())
    }

    async fn list_unlinked(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, HelpmateError> {
        let state = self.state.lock().await;
        let mut unlinked: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| m.notif_id.is_none() && m.created_at <= cutoff)
            .cloned()
            .collect();
        unlinked.sort_by_key(|m| m.created_at);
        unlinked.truncate(limit);
        Ok(unlinked)
    }
}
