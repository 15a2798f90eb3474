// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Range and format checks that serde cannot express: the details URL
//! template, the resync delay bounds, menu geometry and keyword lists.

use crate::diagnostic::ConfigError;
use crate::model::ExtmgrConfig;

/// Upper bound for `sync.resync_delay_ms`.
const MAX_RESYNC_DELAY_MS: u64 = 60_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check every rule and report all violations at once.
pub fn validate_config(config: &ExtmgrConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.general.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "general.log_level `{}` must be one of: {}",
                config.general.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.registry.profile_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "registry.profile_path must not be empty".to_string(),
        });
    }

    if !config.registry.details_url.contains("{id}") {
        errors.push(ConfigError::Validation {
            message: format!(
                "registry.details_url `{}` must contain the `{{id}}` placeholder",
                config.registry.details_url
            ),
        });
    }

    if let Some(self_id) = &config.registry.self_id
        && self_id.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "registry.self_id must not be blank when set".to_string(),
        });
    }

    if config.sync.resync_delay_ms == 0 || config.sync.resync_delay_ms > MAX_RESYNC_DELAY_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "sync.resync_delay_ms must be between 1 and {MAX_RESYNC_DELAY_MS}, got {}",
                config.sync.resync_delay_ms
            ),
        });
    }

    if config.sync.cancellation_keywords.is_empty() {
        errors.push(ConfigError::Validation {
            message: "sync.cancellation_keywords must list at least one keyword".to_string(),
        });
    }

    for (i, keyword) in config.sync.cancellation_keywords.iter().enumerate() {
        if keyword.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("sync.cancellation_keywords[{i}] must not be blank"),
            });
        }
    }

    if config.popup.menu_width.is_nan() || config.popup.menu_width <= 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "popup.menu_width must be positive, got {}",
                config.popup.menu_width
            ),
        });
    }

    if config.popup.menu_height.is_nan() || config.popup.menu_height <= 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "popup.menu_height must be positive, got {}",
                config.popup.menu_height
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
