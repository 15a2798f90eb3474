// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! extmgr configuration.
//!
//! Strict TOML (`deny_unknown_fields`) layered from system, user and local
//! files with `EXTMGR_*` overrides. Failures come back as miette diagnostics
//! that point into the offending file.
//!
//! ```no_run
//! match extmgr_config::load_and_validate() {
//!     Ok(config) => println!("profile: {}", config.registry.profile_path),
//!     Err(errors) => extmgr_config::render_errors(&errors),
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ExtmgrConfig;

/// Load from the standard locations and validate.
pub fn load_and_validate() -> Result<ExtmgrConfig, Vec<ConfigError>> {
    checked(loader::load_config(), existing_sources)
}

/// Load `path` plus the environment and validate.
pub fn load_and_validate_path(path: &Path) -> Result<ExtmgrConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Validate a TOML document on its own.
pub fn load_and_validate_str(toml_content: &str) -> Result<ExtmgrConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Sources are only read back when extraction failed.
fn checked(
    loaded: Result<ExtmgrConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ExtmgrConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn existing_sources() -> Vec<(String, String)> {
    loader::candidate_files()
        .iter()
        .filter_map(|file| read_source(file))
        .collect()
}

/// Figment reports relative files by their absolute path.
fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Some((shown.display().to_string(), content))
}
