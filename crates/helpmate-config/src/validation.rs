// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde cannot express.
//!
//! All problems are collected before returning so one run reports everything.

use crate::diagnostic::ConfigError;
use crate::model::HelpmateConfig;

/// HMAC secrets shorter than this are rejected.
pub const MIN_AUTH_SECRET_LEN: usize = 32;

/// Upper bound for `chat.max_content_len`.
pub const MAX_CONTENT_LEN_CEILING: usize = 100_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &HelpmateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |key: &str, message: String| {
        errors.push(ConfigError::Validation {
            key: key.to_string(),
            message,
        });
    };

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host", "must not be empty".into());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        fail(
            "server.host",
            format!("`{host}` is not an IP address or hostname"),
        );
    }

    if config.server.cookie_name.trim().is_empty() {
        fail("server.cookie_name", "must not be empty".into());
    }

    if let Some(secret) = &config.server.auth_secret {
        if secret.len() < MIN_AUTH_SECRET_LEN {
            fail(
                "server.auth_secret",
                format!("must be at least {MIN_AUTH_SECRET_LEN} bytes"),
            );
        }
    }

    if config.server.request_timeout_secs == 0 {
        fail("server.request_timeout_secs", "must be greater than 0".into());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path", "must not be empty".into());
    }

    if config.chat.edit_window_secs == 0 {
        fail("chat.edit_window_secs", "must be greater than 0".into());
    }
    if !(1..=MAX_CONTENT_LEN_CEILING).contains(&config.chat.max_content_len) {
        fail(
            "chat.max_content_len",
            format!("must be between 1 and {MAX_CONTENT_LEN_CEILING}"),
        );
    }

    if config.reconcile.enabled && config.reconcile.interval_secs == 0 {
        fail(
            "reconcile.interval_secs",
            "must be greater than 0 when reconcile is enabled".into(),
        );
    }
    if config.reconcile.batch_size == 0 {
        fail("reconcile.batch_size", "must be greater than 0".into());
    }

    if config.attachments.root_dir.trim().is_empty() {
        fail("attachments.root_dir", "must not be empty".into());
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(
            "log.level",
            format!(
                "`{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
