// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by registry adapters and the extmgr core.

use thiserror::Error;

use crate::types::{Capability, ExtensionId};

/// The primary error type returned by [`RegistryAdapter`](crate::RegistryAdapter)
/// implementations and other fallible core operations.
#[derive(Debug, Error)]
pub enum ExtmgrError {
    /// Configuration errors (invalid TOML, missing paths, bad templates).
    #[error("configuration error: {0}")]
    Config(String),

    /// The adapter, or one of its sub-capabilities, is missing in this host.
    #[error("capability unavailable: {capability}")]
    CapabilityUnavailable { capability: Capability },

    /// The host registry rejected or failed an operation.
    #[error("registry error: {message}")]
    Registry {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user dismissed a host confirmation dialog.
    ///
    /// Adapters that can tell a dismissal apart from a failure should return
    /// this variant instead of a free-text [`ExtmgrError::Registry`].
    #[error("cancelled by user: {message}")]
    UserCancelled { message: String },

    /// No extension with the given id is known to the registry.
    #[error("extension not found: {0}")]
    NotFound(ExtensionId),

    /// Filesystem or stream failures in a host adapter.
    #[error("i/o error while {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExtmgrError {
    /// Shorthand for a registry failure that only carries a message.
    pub fn registry(message: impl Into<String>) -> Self {
        ExtmgrError::Registry {
            message: message.into(),
            source: None,
        }
    }

    /// The free-text message the host supplied, without the variant prefix.
    ///
    /// `None` for variants whose text is produced locally (paths, ids,
    /// capability names), which must never be read as host wording.
    pub fn host_message(&self) -> Option<&str> {
        match self {
            ExtmgrError::Registry { message, .. } | ExtmgrError::UserCancelled { message } => {
                Some(message.as_str())
            }
            ExtmgrError::Config(_)
            | ExtmgrError::CapabilityUnavailable { .. }
            | ExtmgrError::NotFound(_)
            | ExtmgrError::Io { .. }
            | ExtmgrError::Internal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_message_strips_variant_prefix() {
        let err = ExtmgrError::registry("User cancelled the dialog");
        assert_eq!(err.to_string(), "registry error: User cancelled the dialog");
        assert_eq!(err.host_message(), Some("User cancelled the dialog"));
    }

    #[test]
    fn local_errors_carry_no_host_message() {
        let not_found = ExtmgrError::NotFound(ExtensionId::from("user-abc"));
        assert_eq!(not_found.host_message(), None);

        let io = ExtmgrError::Io {
            context: "reading profile /Users/alice/extensions.json".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(io.to_string().contains("/Users/alice"));
        assert_eq!(io.host_message(), None);
    }

    #[test]
    fn capability_unavailable_names_capability() {
        let err = ExtmgrError::CapabilityUnavailable {
            capability: Capability::SetEnabled,
        };
        assert_eq!(err.to_string(), "capability unavailable: management.setEnabled");
    }
}
