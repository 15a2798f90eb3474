// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Lowest to highest precedence: compiled defaults, `/etc/extmgr/extmgr.toml`,
//! the user config directory, `./extmgr.toml`, then `EXTMGR_*` variables.

#![allow(clippy::result_large_err)] // figment::Error is not ours to box

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use tracing::debug;

use crate::model::ExtmgrConfig;

/// File name looked up in every config location.
pub const FILE_NAME: &str = "extmgr.toml";

/// Top-level tables, used to split `EXTMGR_<SECTION>_<KEY>` variables.
const SECTIONS: [&str; 4] = ["general", "registry", "sync", "popup"];

/// Config files in merge order. Missing files are skipped by figment.
pub fn candidate_files() -> Vec<PathBuf> {
    let mut files = vec![Path::new("/etc/extmgr").join(FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("extmgr").join(FILE_NAME));
    }
    files.push(PathBuf::from(FILE_NAME));
    files
}

/// Load from every candidate file plus the environment.
pub fn load_config() -> Result<ExtmgrConfig, figment::Error> {
    build_figment().extract()
}

/// Load one TOML document over the defaults. The environment is ignored.
pub fn load_config_from_str(toml_content: &str) -> Result<ExtmgrConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load one file over the defaults, then apply the environment.
pub fn load_config_from_path(path: &Path) -> Result<ExtmgrConfig, figment::Error> {
    debug!(file = %path.display(), "loading explicit config file");
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered figment, before extraction.
pub fn build_figment() -> Figment {
    candidate_files()
        .into_iter()
        .fold(defaults(), |figment, file| {
            debug!(file = %file.display(), present = file.exists(), "config layer");
            figment.merge(Toml::file(file))
        })
        .merge(env_provider())
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(ExtmgrConfig::default()))
}

/// `EXTMGR_SYNC_RESYNC_DELAY_MS` becomes `sync.resync_delay_ms`.
///
/// Only the first underscore after a known section is a separator, since
/// key names contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("EXTMGR_").map(|key| {
        let key = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or_else(|| key.to_string())
            .into()
    })
}
