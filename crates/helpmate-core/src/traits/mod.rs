// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams the chat service is wired against.
//!
//! Every collaborator of the message thread service (session store, message
//! store, notification ledger, attachment storage, clock) is an `async_trait`
//! object injected at construction time.

pub mod adapter;
pub mod attachment;
pub mod clock;
pub mod message;
pub mod notification;
pub mod session;
pub mod storage;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use attachment::AttachmentStorage;
pub use clock::Clock;
pub use message::MessageStore;
pub use notification::NotificationLedger;
pub use session::SessionStore;
pub use storage::StorageAdapter;
