// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for help-session chat.
//!
//! Callers are identified by a signed cookie (see [`auth`]); every domain
//! error is rendered through [`error::ApiError`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{sign_caller_cookie, verify_caller_cookie, AuthConfig, Caller};
pub use error::ApiError;
pub use server::{build_router, start_server, AppState};
