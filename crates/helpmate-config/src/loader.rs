// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/helpmate/helpmate.toml`
//! 3. `~/.config/helpmate/helpmate.toml`
//! 4. `./helpmate.toml`
//! 5. `HELPMATE_*` environment variables
//!
//! A file passed with `--config` replaces steps 2 to 4.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HelpmateConfig;

/// Top-level sections addressable from the environment.
const ENV_SECTIONS: &[&str] = &[
    "server",
    "storage",
    "chat",
    "reconcile",
    "attachments",
    "log",
];

pub const SYSTEM_CONFIG_PATH: &str = "/etc/helpmate/helpmate.toml";
pub const LOCAL_CONFIG_PATH: &str = "helpmate.toml";

/// `~/.config/helpmate/helpmate.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("helpmate").join("helpmate.toml"))
}

/// Load from the standard file hierarchy with env overrides.
pub fn load_config() -> Result<HelpmateConfig, figment::Error> {
    build_figment(None).extract()
}

/// Load from an inline TOML document only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<HelpmateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelpmateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load from an explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<HelpmateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelpmateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full provider stack before extraction.
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    let figment = Figment::new().merge(Serialized::defaults(HelpmateConfig::default()));
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading configuration from explicit file");
        return figment.merge(Toml::file(path)).merge(env_provider());
    }

    let mut figment = figment.merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// `HELPMATE_CHAT_EDIT_WINDOW_SECS` becomes `chat.edit_window_secs`.
///
/// Only the first segment names a section; the rest is the field name and
/// keeps its underscores.
fn env_provider() -> Env {
    Env::prefixed("HELPMATE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(field) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("chat_edit_window_secs"), "chat.edit_window_secs");
        assert_eq!(map_env_key("server_auth_secret"), "server.auth_secret");
        assert_eq!(map_env_key("attachments_root_dir"), "attachments.root_dir");
        assert_eq!(map_env_key("reconcile_grace_secs"), "reconcile.grace_secs");
    }

    #[test]
    fn unknown_env_sections_pass_through() {
        assert_eq!(map_env_key("whatever"), "whatever");
        assert_eq!(map_env_key("chatty"), "chatty");
    }
}
