// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Help-session chat: the message thread service, its authorization guard,
//! edit policy, and the notification backfill job.

pub mod attachments;
pub mod clock;
pub mod guard;
pub mod policy;
pub mod reconcile;
pub mod saga;
pub mod service;

pub use attachments::LocalAttachmentStorage;
pub use clock::SystemClock;
pub use policy::ChatPolicy;
pub use reconcile::{ReconcileReport, Reconciler};
pub use service::{ChatService, EditMessage, NewMessage, ReadReceipt, SendOutcome};
