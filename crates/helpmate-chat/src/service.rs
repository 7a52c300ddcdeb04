// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message thread service.
//!
//! Every operation loads what it needs, runs the guard and policy checks,
//! and only then writes. Send is a saga: the message row is the commit
//! point and notification plus link-back are repaired by the
//! [`Reconciler`](crate::Reconciler) when they fail.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use helpmate_core::{
    Attachment, AttachmentStorage, ChatMessage, Clock, HelpSession, HelpmateError, MessageId,
    MessageStore, NotificationLedger, SessionId, SessionStatus, SessionStore, UserId,
};

use crate::guard;
use crate::policy::ChatPolicy;
use crate::saga::ensure_notified;

/// Payload of a send.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub content: String,
    pub attachments: Vec<Attachment>,
    /// Idempotency key chosen by the client.
    pub client_key: Option<String>,
}

/// Payload of an edit. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EditMessage {
    pub content: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

/// Result of a send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message: ChatMessage,
    /// True when the idempotency key matched an earlier send.
    pub replayed: bool,
}

/// Result of marking a session's messages read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadReceipt {
    pub session_id: SessionId,
    /// Messages that changed from unread to read.
    pub marked: u64,
    pub notifications_expired: u64,
}

pub struct ChatService {
    sessions: Arc<dyn SessionStore>,
    messages: Arc<dyn MessageStore>,
    ledger: Arc<dyn NotificationLedger>,
    attachments: Arc<dyn AttachmentStorage>,
    clock: Arc<dyn Clock>,
    policy: ChatPolicy,
}

impl ChatService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        messages: Arc<dyn MessageStore>,
        ledger: Arc<dyn NotificationLedger>,
        attachments: Arc<dyn AttachmentStorage>,
        clock: Arc<dyn Clock>,
        policy: ChatPolicy,
    ) -> Self {
        Self {
            sessions,
            messages,
            ledger,
            attachments,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    async fn load_session(&self, id: &SessionId) -> Result<HelpSession, HelpmateError> {
        self.sessions
            .get_session(id)
            .await?
            .ok_or_else(|| HelpmateError::SessionNotFound(id.clone()))
    }

    async fn load_message(&self, id: &MessageId) -> Result<ChatMessage, HelpmateError> {
        self.messages
            .get_message(id)
            .await?
            .ok_or_else(|| HelpmateError::MessageNotFound(id.clone()))
    }

    /// Sends a message from `caller` to the other participant of an active
    /// session.
    ///
    /// With a client key, a repeated send returns the stored message with
    /// `replayed = true` and finishes its notification if that is still
    /// missing.
    pub async fn send_message(
        &self,
        session_id: &SessionId,
        caller: &UserId,
        new: NewMessage,
    ) -> Result<SendOutcome, HelpmateError> {
        let session = self.load_session(session_id).await?;
        if session.status != SessionStatus::Active {
            return Err(HelpmateError::SessionNotActive {
                status: session.status,
            });
        }
        let receiver = guard::resolve_counterpart(&session, caller)?;

        if let Some(key) = new.client_key.as_deref() {
            if let Some(existing) = self
                .messages
                .find_by_client_key(session_id, caller, key)
                .await?
            {
                return Ok(self.replay(existing).await);
            }
        }

        self.policy.check_content(&new.content)?;
        self.policy.check_attachments(&new.attachments)?;

        let now = self.clock.now();
        let mut message = ChatMessage::new(
            session.id.clone(),
            caller.clone(),
            receiver,
            new.content,
            new.attachments,
            new.client_key,
            now,
        )?;

        if !self.messages.insert_message(&message).await? {
            // Lost a race with a concurrent send carrying the same key.
            let Some(key) = message.client_key.as_deref() else {
                return Err(HelpmateError::Internal(
                    "message id collided with a stored message".to_string(),
                ));
            };
            let existing = self
                .messages
                .find_by_client_key(session_id, caller, key)
                .await?
                .ok_or_else(|| {
                    HelpmateError::Internal("duplicate send left no stored message".to_string())
                })?;
            return Ok(self.replay(existing).await);
        }

        match ensure_notified(self.messages.as_ref(), self.ledger.as_ref(), &message, now).await
        {
            Ok(notif_id) => message.notif_id = Some(notif_id),
            Err(e) => {
                warn!(
                    message_id = %message.id,
                    error = %e,
                    "notification deferred to reconciliation"
                );
            }
        }

        info!(
            session_id = %message.session_id,
            message_id = %message.id,
            sender_id = %message.sender_id,
            attachments = message.attachments.len(),
            "message sent"
        );
        Ok(SendOutcome {
            message,
            replayed: false,
        })
    }

    async fn replay(&self, mut message: ChatMessage) -> SendOutcome {
        debug!(message_id = %message.id, "replaying send");
        if message.notif_id.is_none() {
            let now = self.clock.now();
            match ensure_notified(self.messages.as_ref(), self.ledger.as_ref(), &message, now)
                .await
            {
                Ok(notif_id) => message.notif_id = Some(notif_id),
                Err(e) => {
                    warn!(
                        message_id = %message.id,
                        error = %e,
                        "notification deferred to reconciliation"
                    );
                }
            }
        }
        SendOutcome {
            message,
            replayed: true,
        }
    }

    /// The thread of a session, oldest first. Works in any session status.
    pub async fn list_messages(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<Vec<ChatMessage>, HelpmateError> {
        let session = self.load_session(session_id).await?;
        guard::require_participant(&session, caller)?;
        self.messages.list_messages(session_id).await
    }

    /// Marks a message read along with every other unread message addressed
    /// to `caller` in the same session, and expires the matching
    /// notifications.
    pub async fn mark_message_read(
        &self,
        message_id: &MessageId,
        caller: &UserId,
    ) -> Result<ChatMessage, HelpmateError> {
        let message = self.load_message(message_id).await?;
        guard::require_receiver(&message, caller)?;

        self.mark_thread_read(&message.session_id, caller).await?;

        let mut read = self
            .messages
            .get_message(message_id)
            .await?
            .unwrap_or(message);
        read.is_read = true;
        Ok(read)
    }

    /// Marks every unread message addressed to `caller` in the session read.
    pub async fn mark_all_messages_read(
        &self,
        session_id: &SessionId,
        caller: &UserId,
    ) -> Result<ReadReceipt, HelpmateError> {
        let session = self.load_session(session_id).await?;
        guard::require_participant(&session, caller)?;
        self.mark_thread_read(session_id, caller).await
    }

    async fn mark_thread_read(
        &self,
        session_id: &SessionId,
        reader: &UserId,
    ) -> Result<ReadReceipt, HelpmateError> {
        let marked = self
            .messages
            .mark_read_for_receiver(session_id, reader)
            .await?;
        let notifications_expired = self
            .ledger
            .expire_for_reader(reader, session_id.as_str(), self.clock.now())
            .await
            .map_err(|e| HelpmateError::dependency("failed to expire chat notifications", e))?;

        info!(
            session_id = %session_id,
            reader_id = %reader,
            marked,
            notifications_expired,
            "messages marked read"
        );
        Ok(ReadReceipt {
            session_id: session_id.clone(),
            marked,
            notifications_expired,
        })
    }

    /// Edits an unread message within the edit window.
    ///
    /// Replaced attachments are revoked before the new list is stored; a
    /// failed revocation aborts the edit. An edit that does not land never
    /// leaves the stored message pointing at a revoked handle.
    pub async fn edit_message(
        &self,
        message_id: &MessageId,
        caller: &UserId,
        edit: EditMessage,
    ) -> Result<ChatMessage, HelpmateError> {
        let message = self.load_message(message_id).await?;
        guard::require_sender(&message, caller)?;

        let now = self.clock.now();
        if !self.policy.within_edit_window(message.created_at, now) {
            return Err(self.policy.window_expired());
        }
        if message.is_read {
            return Err(HelpmateError::AlreadyRead);
        }
        if !self.policy.allow_edit_on_inactive_session {
            let session = self.load_session(&message.session_id).await?;
            if session.status != SessionStatus::Active {
                return Err(HelpmateError::SessionNotActive {
                    status: session.status,
                });
            }
        }

        if edit.content.is_none() && edit.attachments.is_none() {
            return Err(HelpmateError::Validation(
                "an edit must change the content or the attachments".to_string(),
            ));
        }
        let content = edit.content.unwrap_or_else(|| message.content.clone());
        self.policy.check_content(&content)?;
        let attachments = match edit.attachments {
            Some(replacement) => {
                self.policy.check_attachments(&replacement)?;
                replacement
            }
            None => message.attachments.clone(),
        };
        let dropped: Vec<&Attachment> = message
            .attachments
            .iter()
            .filter(|a| !attachments.iter().any(|r| r.handle == a.handle))
            .collect();

        let revoked = if dropped.is_empty() {
            Vec::new()
        } else {
            // Last read check before anything irreversible happens.
            if self.load_message(message_id).await?.is_read {
                return Err(HelpmateError::AlreadyRead);
            }
            self.revoke_dropped(message_id, &dropped).await?
        };

        let updated = match self
            .messages
            .update_message_body(message_id, &content, &attachments, now)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.forget_revoked(message_id, &revoked).await;
                return Err(e);
            }
        };
        if !updated {
            // Read between the check above and the write.
            self.forget_revoked(message_id, &revoked).await;
            return Err(HelpmateError::AlreadyRead);
        }

        if let Some(notif_id) = &message.notif_id {
            if let Err(e) = self.ledger.update_preview(notif_id, &content, now).await {
                warn!(
                    message_id = %message_id,
                    notif_id = %notif_id,
                    error = %e,
                    "notification preview not updated"
                );
            }
        }

        info!(
            session_id = %message.session_id,
            message_id = %message_id,
            attachments = attachments.len(),
            "message edited"
        );
        Ok(ChatMessage {
            content,
            attachments,
            edited: true,
            updated_at: now,
            ..message
        })
    }

    /// Revokes each dropped attachment in order. When one fails, the handles
    /// already revoked are removed from the stored message before the error
    /// is returned.
    async fn revoke_dropped(
        &self,
        message_id: &MessageId,
        dropped: &[&Attachment],
    ) -> Result<Vec<String>, HelpmateError> {
        let mut revoked = Vec::with_capacity(dropped.len());
        for attachment in dropped {
            if let Err(e) = self.attachments.revoke(attachment).await {
                self.forget_revoked(message_id, &revoked).await;
                return Err(match e {
                    HelpmateError::Dependency { .. } => e,
                    other => HelpmateError::dependency(
                        format!("failed to revoke attachment {}", attachment.handle),
                        other,
                    ),
                });
            }
            revoked.push(attachment.handle.clone());
        }
        Ok(revoked)
    }

    async fn forget_revoked(&self, message_id: &MessageId, revoked: &[String]) {
        if revoked.is_empty() {
            return;
        }
        if let Err(e) = self.messages.drop_attachments(message_id, revoked).await {
            error!(
                message_id = %message_id,
                revoked = ?revoked,
                error = %e,
                "message still references revoked attachments"
            );
        }
    }

    /// Unread chat notifications addressed to `user`.
    pub async fn unread_count(&self, user: &UserId) -> Result<u64, HelpmateError> {
        self.ledger.unread_count(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use helpmate_core::NotificationStatus;
    use helpmate_test_utils::fixtures::{
        active_session, alice, attachment, bob, carol, session_with_status,
    };
    use helpmate_test_utils::MockBackend;

    async fn backend() -> MockBackend {
        MockBackend::with_sessions([
            active_session("s-1"),
            session_with_status("s-done", SessionStatus::Completed),
        ])
        .await
    }

    fn service(b: &MockBackend) -> ChatService {
        ChatService::new(
            b.store.clone(),
            b.store.clone(),
            b.ledger.clone(),
            b.attachments.clone(),
            b.clock.clone(),
            ChatPolicy::default(),
        )
    }

    fn text(content: &str) -> NewMessage {
        NewMessage {
            content: content.to_string(),
            ..NewMessage::default()
        }
    }

    fn s1() -> SessionId {
        SessionId::from("s-1")
    }

    #[tokio::test]
    async fn send_creates_linked_notification_for_receiver() {
        let b = backend().await;
        let svc = service(&b);

        let out = svc.send_message(&s1(), &alice(), text("hello")).await.unwrap();
        assert!(!out.replayed);
        assert_eq!(out.message.receiver_id, bob());
        assert!(!out.message.is_read);
        assert!(!out.message.edited);

        let entries = b.ledger.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, bob());
        assert_eq!(entries[0].resource_id, "s-1");
        assert_eq!(entries[0].message, "hello");
        assert_eq!(out.message.notif_id.as_ref(), Some(&entries[0].id));

        let stored = b.store.messages().await;
        assert_eq!(stored[0].notif_id.as_ref(), Some(&entries[0].id));
    }

    #[tokio::test]
    async fn send_checks_run_before_any_write() {
        let b = backend().await;
        let svc = service(&b);

        let err = svc
            .send_message(&SessionId::from("missing"), &alice(), text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::SessionNotFound(_)));

        let err = svc
            .send_message(&SessionId::from("s-done"), &alice(), text("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HelpmateError::SessionNotActive {
                status: SessionStatus::Completed
            }
        ));

        let err = svc.send_message(&s1(), &carol(), text("x")).await.unwrap_err();
        assert!(matches!(err, HelpmateError::NotAParticipant));

        let err = svc.send_message(&s1(), &alice(), text("   ")).await.unwrap_err();
        assert!(matches!(err, HelpmateError::Validation(_)));

        let long = "x".repeat(1001);
        let err = svc.send_message(&s1(), &alice(), text(&long)).await.unwrap_err();
        assert!(matches!(err, HelpmateError::Validation(_)));

        assert_eq!(b.store.message_count().await, 0);
        assert_eq!(b.ledger.entry_count().await, 0);
    }

    #[tokio::test]
    async fn send_survives_ledger_failure_unlinked() {
        let b = backend().await;
        let svc = service(&b);
        b.ledger.fail_record(true);

        let out = svc.send_message(&s1(), &alice(), text("hi")).await.unwrap();
        assert!(out.message.notif_id.is_none());
        assert_eq!(b.store.message_count().await, 1);
        assert_eq!(b.ledger.entry_count().await, 0);
    }

    #[tokio::test]
    async fn send_insert_failure_is_reported() {
        let b = backend().await;
        let svc = service(&b);
        b.store.fail_insert(true);

        let err = svc.send_message(&s1(), &alice(), text("hi")).await.unwrap_err();
        assert!(matches!(err, HelpmateError::Storage { .. }));
        assert_eq!(b.ledger.entry_count().await, 0);
    }

    #[tokio::test]
    async fn keyed_retry_replays_and_finishes_saga() {
        let b = backend().await;
        let svc = service(&b);
        let keyed = NewMessage {
            content: "hello".into(),
            attachments: Vec::new(),
            client_key: Some("k-1".into()),
        };

        b.store.fail_link(true);
        let first = svc.send_message(&s1(), &alice(), keyed.clone()).await.unwrap();
        assert!(first.message.notif_id.is_none());

        b.store.fail_link(false);
        let second = svc.send_message(&s1(), &alice(), keyed).await.unwrap();
        assert!(second.replayed);
        assert_eq!(second.message.id, first.message.id);
        assert!(second.message.notif_id.is_some());
        assert_eq!(b.store.message_count().await, 1);
        assert_eq!(b.ledger.entry_count().await, 1);
    }

    #[tokio::test]
    async fn same_key_from_other_sender_is_a_new_message() {
        let b = backend().await;
        let svc = service(&b);
        let keyed = NewMessage {
            content: "hello".into(),
            attachments: Vec::new(),
            client_key: Some("k-1".into()),
        };
        svc.send_message(&s1(), &alice(), keyed.clone()).await.unwrap();
        let out = svc.send_message(&s1(), &bob(), keyed).await.unwrap();
        assert!(!out.replayed);
        assert_eq!(b.store.message_count().await, 2);
    }

    #[tokio::test]
    async fn list_is_chronological_and_participant_only() {
        let b = backend().await;
        let svc = service(&b);
        svc.send_message(&s1(), &alice(), text("one")).await.unwrap();
        b.clock.advance(Duration::seconds(1));
        svc.send_message(&s1(), &bob(), text("two")).await.unwrap();
        svc.send_message(&s1(), &alice(), text("three")).await.unwrap();

        let thread = svc.list_messages(&s1(), &bob()).await.unwrap();
        let bodies: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(bodies, ["one", "two", "three"]);

        let err = svc.list_messages(&s1(), &carol()).await.unwrap_err();
        assert!(matches!(err, HelpmateError::NotAParticipant));
    }

    #[tokio::test]
    async fn list_works_on_cancelled_session() {
        let b = backend().await;
        let svc = service(&b);
        svc.send_message(&s1(), &alice(), text("before")).await.unwrap();
        b.store.force_status(&s1(), SessionStatus::Cancelled).await;

        let err = svc.send_message(&s1(), &alice(), text("after")).await.unwrap_err();
        assert!(matches!(err, HelpmateError::SessionNotActive { .. }));
        assert_eq!(svc.list_messages(&s1(), &alice()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reading_one_message_cascades_to_thread() {
        let b = backend().await;
        let svc = service(&b);
        let m1 = svc.send_message(&s1(), &alice(), text("a")).await.unwrap().message;
        svc.send_message(&s1(), &alice(), text("b")).await.unwrap();
        let from_bob = svc.send_message(&s1(), &bob(), text("c")).await.unwrap().message;

        let read = svc.mark_message_read(&m1.id, &bob()).await.unwrap();
        assert!(read.is_read);

        let thread = b.store.messages().await;
        assert!(
            thread
                .iter()
                .filter(|m| m.receiver_id == bob())
                .all(|m| m.is_read)
        );
        let bobs = thread.iter().find(|m| m.id == from_bob.id).unwrap();
        assert!(!bobs.is_read, "messages to the other participant stay unread");

        for entry in b.ledger.entries().await {
            if entry.user_id == bob() {
                assert!(entry.is_read);
                assert_eq!(entry.status, NotificationStatus::Expired);
            } else {
                assert!(!entry.is_read);
            }
        }
        assert_eq!(svc.unread_count(&bob()).await.unwrap(), 0);
        assert_eq!(svc.unread_count(&alice()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn only_receiver_marks_read() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("a")).await.unwrap().message;

        for who in [alice(), carol()] {
            let err = svc.mark_message_read(&m.id, &who).await.unwrap_err();
            assert!(matches!(err, HelpmateError::NotReceiver));
        }
        let err = svc
            .mark_message_read(&MessageId::from("nope"), &bob())
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::MessageNotFound(_)));
        assert!(!b.store.messages().await[0].is_read);
    }

    #[tokio::test]
    async fn mark_all_is_idempotent() {
        let b = backend().await;
        let svc = service(&b);
        svc.send_message(&s1(), &alice(), text("a")).await.unwrap();
        svc.send_message(&s1(), &alice(), text("b")).await.unwrap();

        let first = svc.mark_all_messages_read(&s1(), &bob()).await.unwrap();
        assert_eq!(first.marked, 2);
        assert_eq!(first.notifications_expired, 2);

        let second = svc.mark_all_messages_read(&s1(), &bob()).await.unwrap();
        assert_eq!(second.marked, 0);
        assert_eq!(second.notifications_expired, 0);

        let err = svc.mark_all_messages_read(&s1(), &carol()).await.unwrap_err();
        assert!(matches!(err, HelpmateError::NotAParticipant));
    }

    #[tokio::test]
    async fn edit_window_boundary() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("v1")).await.unwrap().message;

        b.clock.advance(Duration::seconds(4 * 60 + 59));
        let edited = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("v2".into()),
                    attachments: None,
                },
            )
            .await
            .unwrap();
        assert!(edited.edited);
        assert_eq!(edited.content, "v2");
        assert_eq!(b.ledger.entries().await[0].message, "v2");

        b.clock.advance(Duration::seconds(2));
        let err = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("v3".into()),
                    attachments: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::EditWindowExpired { .. }));
        assert_eq!(b.store.messages().await[0].content, "v2");
    }

    #[tokio::test]
    async fn edit_after_read_is_refused() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("v1")).await.unwrap().message;
        svc.mark_message_read(&m.id, &bob()).await.unwrap();

        let err = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("v2".into()),
                    attachments: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::AlreadyRead));
        assert_eq!(b.store.messages().await[0].content, "v1");
        assert_eq!(b.store.body_updates(), 0);
    }

    #[tokio::test]
    async fn edit_by_non_sender_is_refused() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("v1")).await.unwrap().message;
        for who in [bob(), carol()] {
            let err = svc
                .edit_message(
                    &m.id,
                    &who,
                    EditMessage {
                        content: Some("x".into()),
                        attachments: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, HelpmateError::NotSender));
        }
    }

    #[tokio::test]
    async fn edit_on_finished_session_is_refused_by_default() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("v1")).await.unwrap().message;
        b.store.force_status(&s1(), SessionStatus::Completed).await;

        let err = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("v2".into()),
                    attachments: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::SessionNotActive { .. }));

        let lenient = ChatService::new(
            b.store.clone(),
            b.store.clone(),
            b.ledger.clone(),
            b.attachments.clone(),
            b.clock.clone(),
            ChatPolicy {
                allow_edit_on_inactive_session: true,
                ..ChatPolicy::default()
            },
        );
        let edited = lenient
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("v2".into()),
                    attachments: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.content, "v2");
    }

    #[tokio::test]
    async fn replacing_attachments_revokes_dropped_handles() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc
            .send_message(
                &s1(),
                &alice(),
                NewMessage {
                    content: "files".into(),
                    attachments: vec![attachment("a"), attachment("b")],
                    client_key: None,
                },
            )
            .await
            .unwrap()
            .message;

        let edited = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: None,
                    attachments: Some(vec![attachment("b"), attachment("c")]),
                },
            )
            .await
            .unwrap();
        assert_eq!(b.attachments.revoked().await, vec!["a".to_string()]);
        let handles: Vec<_> = edited.attachments.iter().map(|a| a.handle.as_str()).collect();
        assert_eq!(handles, ["b", "c"]);
        assert_eq!(edited.content, "files");
    }

    #[tokio::test]
    async fn failed_revocation_aborts_edit() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc
            .send_message(
                &s1(),
                &alice(),
                NewMessage {
                    content: "files".into(),
                    attachments: vec![attachment("a")],
                    client_key: None,
                },
            )
            .await
            .unwrap()
            .message;
        b.attachments.fail_on("a").await;

        let err = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("new".into()),
                    attachments: Some(Vec::new()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::Dependency { .. }));
        let stored = &b.store.messages().await[0];
        assert_eq!(stored.content, "files");
        assert_eq!(stored.attachments.len(), 1);
        assert!(!stored.edited);
    }

    async fn send_with_files(svc: &ChatService, handles: &[&str]) -> ChatMessage {
        svc.send_message(
            &s1(),
            &alice(),
            NewMessage {
                content: "files".into(),
                attachments: handles.iter().map(|h| attachment(h)).collect(),
                client_key: None,
            },
        )
        .await
        .unwrap()
        .message
    }

    fn stored_handles(m: &ChatMessage) -> Vec<&str> {
        m.attachments.iter().map(|a| a.handle.as_str()).collect()
    }

    #[tokio::test]
    async fn partial_revocation_unlinks_revoked_handles() {
        let b = backend().await;
        let svc = service(&b);
        let m = send_with_files(&svc, &["a", "b"]).await;
        b.attachments.fail_on("b").await;

        let err = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: None,
                    attachments: Some(Vec::new()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::Dependency { .. }));
        assert_eq!(b.attachments.revoked().await, vec!["a".to_string()]);

        let stored = &b.store.messages().await[0];
        assert_eq!(stored_handles(stored), ["b"]);
        assert_eq!(stored.content, "files");
        assert!(!stored.edited);
        assert_eq!(b.store.body_updates(), 0);
    }

    #[tokio::test]
    async fn edit_losing_read_race_unlinks_revoked_handles() {
        let b = backend().await;
        let svc = service(&b);
        let m = send_with_files(&svc, &["a", "b"]).await;
        b.store.read_before_edit(true);

        let err = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("new".into()),
                    attachments: Some(vec![attachment("b")]),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::AlreadyRead));
        assert_eq!(b.attachments.revoked().await, vec!["a".to_string()]);

        let stored = &b.store.messages().await[0];
        assert!(stored.is_read);
        assert_eq!(stored.content, "files");
        assert_eq!(stored_handles(stored), ["b"]);
    }

    #[tokio::test]
    async fn keyless_insert_conflict_is_internal() {
        let b = backend().await;
        let svc = service(&b);
        b.store.conflict_insert(true);

        let err = svc.send_message(&s1(), &alice(), text("hi")).await.unwrap_err();
        assert!(matches!(err, HelpmateError::Internal(_)));
        assert_eq!(b.store.message_count().await, 0);
        assert_eq!(b.ledger.entry_count().await, 0);
    }

    #[tokio::test]
    async fn preview_failure_does_not_fail_edit() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("v1")).await.unwrap().message;
        b.ledger.fail_preview(true);

        let edited = svc
            .edit_message(
                &m.id,
                &alice(),
                EditMessage {
                    content: Some("v2".into()),
                    attachments: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.content, "v2");
        assert_eq!(b.ledger.entries().await[0].message, "v1");
    }

    #[tokio::test]
    async fn empty_edit_is_rejected() {
        let b = backend().await;
        let svc = service(&b);
        let m = svc.send_message(&s1(), &alice(), text("v1")).await.unwrap().message;
        let err = svc
            .edit_message(&m.id, &alice(), EditMessage::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HelpmateError::Validation(_)));
    }
}
