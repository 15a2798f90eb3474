// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy surfaced to the view.
//!
//! Every adapter error is converted into one of these at the controller
//! boundary. User cancellation is not a member: it is classified and dropped
//! before anything is recorded.

use extmgr_core::types::Capability;
use strum::Display;
use thiserror::Error;

/// The command a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CommandAction {
    Enable,
    Disable,
    Uninstall,
}

impl CommandAction {
    /// The toggle direction for a desired enabled state.
    pub fn for_toggle(enabled: bool) -> Self {
        if enabled {
            CommandAction::Enable
        } else {
            CommandAction::Disable
        }
    }
}

/// Errors recorded in the controller's state for the view to render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The registry, or a required sub-capability, is missing. Only a
    /// user-initiated retry runs the refresh again.
    #[error("{capability} is unavailable")]
    CapabilityUnavailable { capability: Capability },

    /// A full refresh's query failed.
    #[error("failed to load extensions: {reason}")]
    QueryFailed { reason: String },

    /// A mutate command failed.
    #[error("failed to {action} {name}: {reason}")]
    CommandFailed {
        action: CommandAction,
        name: String,
        reason: String,
    },
}

impl SyncError {
    /// True for errors that leave the whole list unusable rather than a
    /// single command.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SyncError::CommandFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_names_action_and_extension() {
        let err = SyncError::CommandFailed {
            action: CommandAction::Disable,
            name: "Zed".to_string(),
            reason: "policy".to_string(),
        };
        assert_eq!(err.to_string(), "failed to disable Zed: policy");
        assert!(!err.is_fatal());
    }

    #[test]
    fn toggle_direction() {
        assert_eq!(CommandAction::for_toggle(true), CommandAction::Enable);
        assert_eq!(CommandAction::for_toggle(false).to_string(), "disable");
    }

    #[test]
    fn capability_error_is_fatal() {
        let err = SyncError::CapabilityUnavailable {
            capability: Capability::QueryAll,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "management.getAll is unavailable");
    }
}
