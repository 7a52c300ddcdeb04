// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Helpmate help-session chat service.
//!
//! This crate provides the entity types (help sessions, chat messages,
//! notification ledger entries), the error taxonomy shared by every layer,
//! and the store traits the message thread service is wired against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, HelpmateError};
pub use types::{
    AdapterType, Attachment, ChatMessage, HealthStatus, HelpSession, MessageId, NotificationEntry,
    NotificationId, NotificationKind, NotificationStatus, ResourceModel, SessionId,
    SessionOrigin, SessionStatus, UserId,
};

// Re-export all store traits at crate root.
pub use traits::{
    AttachmentStorage, Clock, MessageStore, NotificationLedger, PluginAdapter, SessionStore,
    StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_session_store<T: SessionStore>() {}
        fn _assert_message_store<T: MessageStore>() {}
        fn _assert_notification_ledger<T: NotificationLedger>() {}
        fn _assert_attachment_storage<T: AttachmentStorage>() {}
        fn _assert_clock<T: Clock>() {}
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Storage,
            AdapterType::Ledger,
            AdapterType::Attachments,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }
}
