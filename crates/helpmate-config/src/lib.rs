// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Helpmate chat service.
//!
//! TOML files and `HELPMATE_*` environment variables are layered with Figment,
//! unknown keys are rejected, and every problem is reported as a miette
//! diagnostic with a typo suggestion where one is close enough.
//!
//! ```no_run
//! use helpmate_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, into_helpmate_error, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HelpmateConfig;

/// Load from the file hierarchy (or `explicit`, if given) and validate.
pub fn load_and_validate(explicit: Option<&Path>) -> Result<HelpmateConfig, Vec<ConfigError>> {
    match loader::build_figment(explicit).extract::<HelpmateConfig>() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(explicit),
        )),
    }
}

/// Load an inline TOML document and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<HelpmateConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every config file that could have contributed, for span lookup.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => [
            std::env::current_dir()
                .map(|d| d.join(loader::LOCAL_CONFIG_PATH))
                .ok(),
            loader::user_config_path(),
            Some(loader::SYSTEM_CONFIG_PATH.into()),
        ]
        .into_iter()
        .flatten()
        .collect(),
    };

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
