// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification ledger for Helpmate.
//!
//! Records one addressee-specific entry per sent chat message, keyed on the
//! message id, and expires them in bulk when the addressee reads the thread.
//! Delivery (push, email) happens elsewhere; this crate only keeps records.

pub mod ledger;

pub use ledger::SqliteNotificationLedger;
