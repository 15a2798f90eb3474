// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for raw registry records.

use extmgr_core::types::{
    ExtensionId, ExtensionType, IconInfo, InstallType, RawExtensionRecord,
};

/// A normally installed, manageable extension with no icons.
pub fn record(id: &str, name: &str, enabled: bool) -> RawExtensionRecord {
    RawExtensionRecord {
        id: ExtensionId::from(id),
        name: name.to_string(),
        enabled,
        kind: ExtensionType::Extension,
        install_type: InstallType::Normal,
        icons: Vec::new(),
        may_disable: None,
        version: Some("1.0.0".to_string()),
        description: None,
    }
}

/// A host built-in component.
pub fn builtin(id: &str, name: &str) -> RawExtensionRecord {
    RawExtensionRecord {
        kind: ExtensionType::Builtin,
        ..record(id, name, true)
    }
}

/// An install the registry marks as unmanageable.
pub fn unmanaged(id: &str, name: &str) -> RawExtensionRecord {
    RawExtensionRecord {
        install_type: InstallType::Other,
        ..record(id, name, true)
    }
}

/// Attach icons, given as `(size, url)` in ascending size order.
pub fn with_icons(mut record: RawExtensionRecord, icons: &[(u32, &str)]) -> RawExtensionRecord {
    record.icons = icons
        .iter()
        .map(|(size, url)| IconInfo {
            size: *size,
            url: (*url).to_string(),
        })
        .collect();
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_differ_only_where_named() {
        let base = record("a", "A", true);
        let b = builtin("a", "A");
        assert_eq!(b.kind, ExtensionType::Builtin);
        assert_eq!(b.install_type, base.install_type);
        let u = unmanaged("a", "A");
        assert_eq!(u.install_type, InstallType::Other);
        assert_eq!(u.kind, base.kind);
    }

    #[test]
    fn icons_keep_given_order() {
        let r = with_icons(record("a", "A", true), &[(16, "s.png"), (128, "l.png")]);
        assert_eq!(r.icons.last().map(|i| i.url.as_str()), Some("l.png"));
    }
}
