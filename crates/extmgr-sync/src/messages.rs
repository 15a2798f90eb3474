// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing strings.
//!
//! The view never formats text itself: it asks a [`MessageCatalog`] for a
//! [`Message`], so hosts can plug in their own localization.

use extmgr_core::types::Capability;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::{CommandAction, SyncError};

/// Catalog keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum MessageKey {
    Loading,
    Retry,
    Refresh,
    NoExtensionsFound,
    FailedToLoad,
    RegistryUnavailable,
    ManagementUnavailable,
    FailedToToggle,
    FailedToUninstall,
    Enable,
    Disable,
    OpenDetails,
    Uninstall,
}

/// A key plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub key: MessageKey,
    pub args: Vec<String>,
}

impl Message {
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    pub fn with_args(key: MessageKey, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            key,
            args: args.into_iter().collect(),
        }
    }
}

/// Source of localized text.
pub trait MessageCatalog: Send + Sync {
    /// Render one message. Placeholders `$1`, `$2`, ... are replaced by
    /// `message.args`.
    fn text(&self, message: &Message) -> String;

    fn get(&self, key: MessageKey) -> String {
        self.text(&Message::new(key))
    }
}

/// Built-in English strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl EnglishCatalog {
    fn template(key: MessageKey) -> &'static str {
        match key {
            MessageKey::Loading => "Loading...",
            MessageKey::Retry => "Retry",
            MessageKey::Refresh => "Refresh",
            MessageKey::NoExtensionsFound => "No extensions found",
            MessageKey::FailedToLoad => "Failed to load extensions",
            MessageKey::RegistryUnavailable => "Extension API is not available",
            MessageKey::ManagementUnavailable => "Extension management is not available",
            MessageKey::FailedToToggle => "Failed to $1 $2",
            MessageKey::FailedToUninstall => "Failed to uninstall $1",
            MessageKey::Enable => "enable",
            MessageKey::Disable => "disable",
            MessageKey::OpenDetails => "Open details",
            MessageKey::Uninstall => "Uninstall",
        }
    }
}

impl MessageCatalog for EnglishCatalog {
    fn text(&self, message: &Message) -> String {
        substitute(Self::template(message.key), &message.args)
    }
}

/// Replace `$n` placeholders (1-based) with arguments. Placeholders with no
/// matching argument are left as-is.
pub fn substitute(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                if let Some(arg) = (digit as usize).checked_sub(1).and_then(|i| args.get(i)) {
                    chars.next();
                    out.push_str(arg);
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// The message to show for a recorded controller error.
///
/// The action verb inside a toggle failure is itself localized.
pub fn error_message(error: &SyncError, catalog: &dyn MessageCatalog) -> Message {
    match error {
        SyncError::CapabilityUnavailable {
            capability: Capability::Registry,
        } => Message::new(MessageKey::RegistryUnavailable),
        SyncError::CapabilityUnavailable { .. } => Message::new(MessageKey::ManagementUnavailable),
        SyncError::QueryFailed { .. } => Message::new(MessageKey::FailedToLoad),
        SyncError::CommandFailed {
            action: CommandAction::Uninstall,
            name,
            ..
        } => Message::with_args(MessageKey::FailedToUninstall, [name.clone()]),
        SyncError::CommandFailed { action, name, .. } => {
            let verb = match action {
                CommandAction::Enable => catalog.get(MessageKey::Enable),
                _ => catalog.get(MessageKey::Disable),
            };
            Message::with_args(MessageKey::FailedToToggle, [verb, name.clone()])
        }
    }
}

/// Rendered text for a recorded controller error.
pub fn error_text(error: &SyncError, catalog: &dyn MessageCatalog) -> String {
    catalog.text(&error_message(error, catalog))
}
