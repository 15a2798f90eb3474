// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for extmgr.
//!
//! Every table denies unknown fields, so a misspelled key fails loading
//! instead of silently falling back to its default.

use serde::{Deserialize, Serialize};

/// Top-level extmgr configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtmgrConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Where the registry lives and how to reach its details view.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Synchronization controller tuning.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Popup surface geometry.
    #[serde(default)]
    pub popup: PopupConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Default level for the `extmgr` tracing target.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Registry location settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Path to the JSON profile holding the installed extension records.
    #[serde(default = "default_profile_path")]
    pub profile_path: String,

    /// Identifier of the running component, hidden from the list.
    #[serde(default)]
    pub self_id: Option<String>,

    /// Details view URL; `{id}` is replaced with the extension id.
    #[serde(default = "default_details_url")]
    pub details_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            profile_path: default_profile_path(),
            self_id: None,
            details_url: default_details_url(),
        }
    }
}

fn default_profile_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("extmgr").join("extensions.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("extensions.json"))
        .display()
        .to_string()
}

fn default_details_url() -> String {
    "chrome://extensions/?id={id}".to_string()
}

/// Synchronization controller settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Delay before the resynchronizing refresh that follows a failed toggle.
    #[serde(default = "default_resync_delay_ms")]
    pub resync_delay_ms: u64,

    /// Case-insensitive substrings that mark an uninstall failure as a
    /// user cancellation.
    #[serde(default = "default_cancellation_keywords")]
    pub cancellation_keywords: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            resync_delay_ms: default_resync_delay_ms(),
            cancellation_keywords: default_cancellation_keywords(),
        }
    }
}

fn default_resync_delay_ms() -> u64 {
    500
}

fn default_cancellation_keywords() -> Vec<String> {
    vec!["cancel".to_string(), "user".to_string()]
}

/// Popup surface settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PopupConfig {
    /// Context menu width used for viewport clamping.
    #[serde(default = "default_menu_width")]
    pub menu_width: f64,

    /// Context menu height used for viewport clamping.
    #[serde(default = "default_menu_height")]
    pub menu_height: f64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            menu_width: default_menu_width(),
            menu_height: default_menu_height(),
        }
    }
}

fn default_menu_width() -> f64 {
    140.0
}

fn default_menu_height() -> f64 {
    40.0
}
