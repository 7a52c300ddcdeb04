// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key
//! is reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Helpmate configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelpmateConfig {
    /// HTTP listener and caller authentication.
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat message policy.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Background backfill of notifications for unlinked messages.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default)]
    pub attachments: AttachmentsConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Name of the cookie carrying the signed caller identity.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Shared HMAC secret with the auth service. `None` rejects every
    /// authenticated request (fail-closed).
    #[serde(default)]
    pub auth_secret: Option<String>,

    /// Per-request timeout applied by the HTTP layer.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cookie_name", &self.cookie_name)
            .field("auth_secret", &self.auth_secret.as_ref().map(|_| "[redacted]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cookie_name: default_cookie_name(),
            auth_secret: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cookie_name() -> String {
    "helpmate_session".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "helpmate.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Chat message policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// How long after sending a message its sender may still edit it.
    #[serde(default = "default_edit_window_secs")]
    pub edit_window_secs: u64,

    /// Maximum message length in characters.
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,

    /// Maximum number of attachments per message.
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,

    /// Whether edits are still accepted once the session has left `active`.
    #[serde(default)]
    pub allow_edit_on_inactive_session: bool,
}

impl ChatConfig {
    pub fn edit_window(&self) -> Duration {
        Duration::from_secs(self.edit_window_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            edit_window_secs: default_edit_window_secs(),
            max_content_len: default_max_content_len(),
            max_attachments: default_max_attachments(),
            allow_edit_on_inactive_session: false,
        }
    }
}

fn default_edit_window_secs() -> u64 {
    300
}

fn default_max_content_len() -> usize {
    1000
}

fn default_max_attachments() -> usize {
    10
}

/// Notification backfill job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Run the periodic job inside `helpmate serve`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Messages younger than this are left to the in-flight send.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,

    /// Maximum messages repaired per pass.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            grace_secs: default_grace_secs(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    60
}

fn default_grace_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    100
}

/// Local directory shared with the upload service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentsConfig {
    /// Revoking an attachment deletes `root_dir/<handle>`.
    #[serde(default = "default_attachments_root")]
    pub root_dir: String,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_attachments_root(),
        }
    }
}

fn default_attachments_root() -> String {
    "uploads".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Level for helpmate crates (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
