// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for help sessions and their chat threads.
//!
//! A WAL-mode database with embedded migrations, accessed through
//! tokio-rusqlite's single writer thread. [`SqliteStorage`] implements the
//! session and message store traits consumed by the chat service.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::{Database, map_tr_err};
