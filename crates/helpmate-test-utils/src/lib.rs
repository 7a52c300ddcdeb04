// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Helpmate.
//!
//! - [`MockStore`]: in-memory session and message store
//! - [`MockLedger`]: in-memory notification ledger
//! - [`MockAttachments`]: attachment storage that records revocations
//! - [`ManualClock`]: a clock that only moves when told to
//!
//! Each fake can be told to fail a specific call so the partial-failure
//! paths of the chat service can be exercised deterministically.
//! [`SqliteHarness`] wires the real SQLite adapters on a throwaway file.

pub mod clock;
pub mod fixtures;
pub mod harness;
pub mod mock_attachments;
pub mod mock_ledger;
pub mod mock_store;

pub use clock::ManualClock;
pub use harness::{MockBackend, SqliteHarness};
pub use mock_attachments::MockAttachments;
pub use mock_ledger::MockLedger;
pub use mock_store::MockStore;
