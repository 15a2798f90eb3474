// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for extmgr.
//!
//! This crate provides the extension data model, the shared error type, and
//! the [`RegistryAdapter`] trait that every host registry integration
//! implements.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ExtmgrError;
pub use traits::{broadcast_event_stream, EventStream, RegistryAdapter};
pub use types::{
    Capability, EventKind, ExtensionDescriptor, ExtensionId, ExtensionType, IconInfo,
    InstallType, RawExtensionRecord, RegistryCapabilities, RegistryEvent, UninstallOptions,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extmgr_error_has_all_variants() {
        let _config = ExtmgrError::Config("test".into());
        let _capability = ExtmgrError::CapabilityUnavailable {
            capability: Capability::Registry,
        };
        let _registry = ExtmgrError::Registry {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _cancelled = ExtmgrError::UserCancelled {
            message: "test".into(),
        };
        let _not_found = ExtmgrError::NotFound(ExtensionId::from("test"));
        let _io = ExtmgrError::Io {
            context: "reading".into(),
            source: std::io::Error::other("test"),
        };
        let _internal = ExtmgrError::Internal("test".into());
    }

    #[test]
    fn event_kind_display_round_trips() {
        use std::str::FromStr;

        for kind in EventKind::ALL {
            let parsed = EventKind::from_str(&kind.to_string()).expect("should parse back");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn registry_adapter_is_object_safe() {
        fn _assert_dyn(_: &dyn RegistryAdapter) {}
    }
}
