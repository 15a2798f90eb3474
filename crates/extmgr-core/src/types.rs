// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used by registry adapters and the synchronization layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque, stable identifier of an installed extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionId(pub String);

impl ExtensionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(value: &str) -> Self {
        ExtensionId(value.to_string())
    }
}

impl From<String> for ExtensionId {
    fn from(value: String) -> Self {
        ExtensionId(value)
    }
}

/// Kind of package the registry reports.
///
/// `Builtin` is the host's own component type (`"chrome"` on the wire) and is
/// never shown to the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExtensionType {
    Extension,
    HostedApp,
    PackagedApp,
    LegacyPackagedApp,
    Theme,
    LoginScreenExtension,
    #[serde(rename = "chrome")]
    #[strum(serialize = "chrome")]
    Builtin,
    #[serde(other)]
    Unknown,
}

/// How an extension got installed.
///
/// `Other` marks installs the registry reports but that cannot be managed
/// through this interface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstallType {
    Admin,
    Development,
    Normal,
    Sideload,
    Other,
    #[serde(other)]
    Unknown,
}

/// One icon asset offered by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconInfo {
    pub size: u32,
    pub url: String,
}

/// A record exactly as the registry reports it, before filtering.
///
/// Field names follow the host management API's camelCase JSON so profile
/// dumps can be read without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtensionRecord {
    pub id: ExtensionId,
    pub name: String,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ExtensionType,
    pub install_type: InstallType,
    /// Icons in ascending size order.
    #[serde(default)]
    pub icons: Vec<IconInfo>,
    /// `Some(false)` when policy forbids disabling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub may_disable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The filtered, normalized local view of one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    pub id: ExtensionId,
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// The four change notifications a registry can deliver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Enabled,
    Disabled,
    Installed,
    Uninstalled,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Enabled,
        EventKind::Disabled,
        EventKind::Installed,
        EventKind::Uninstalled,
    ];
}

/// A change notification from the registry.
///
/// Install and uninstall payloads are not trusted to carry full descriptor
/// data, so they only keep the id when the host sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Enabled(ExtensionId),
    Disabled(ExtensionId),
    Installed(Option<ExtensionId>),
    Uninstalled(Option<ExtensionId>),
}

impl RegistryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RegistryEvent::Enabled(_) => EventKind::Enabled,
            RegistryEvent::Disabled(_) => EventKind::Disabled,
            RegistryEvent::Installed(_) => EventKind::Installed,
            RegistryEvent::Uninstalled(_) => EventKind::Uninstalled,
        }
    }
}

/// Options for [`RegistryAdapter::uninstall`](crate::RegistryAdapter::uninstall).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UninstallOptions {
    /// Ask the host to show its own confirmation dialog first.
    pub show_confirm_dialog: bool,
}

/// Named host capabilities, used when reporting that one is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Capability {
    /// The registry adapter itself.
    #[strum(serialize = "registry")]
    Registry,
    #[strum(serialize = "management.getAll")]
    QueryAll,
    #[strum(serialize = "management.setEnabled")]
    SetEnabled,
    #[strum(serialize = "management.uninstall")]
    Uninstall,
    #[strum(serialize = "tabs.create")]
    OpenDetails,
}

/// Sub-capabilities a registry adapter exposes in the current host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCapabilities {
    pub query_all: bool,
    pub set_enabled: bool,
    pub uninstall: bool,
    pub open_details: bool,
    pub events: Vec<EventKind>,
}

impl RegistryCapabilities {
    /// Every capability present, including all four event kinds.
    pub fn full() -> Self {
        Self {
            query_all: true,
            set_enabled: true,
            uninstall: true,
            open_details: true,
            events: EventKind::ALL.to_vec(),
        }
    }

    /// No capability present.
    pub fn none() -> Self {
        Self {
            query_all: false,
            set_enabled: false,
            uninstall: false,
            open_details: false,
            events: Vec::new(),
        }
    }

    /// Whether the given capability is available.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Registry => true,
            Capability::QueryAll => self.query_all,
            Capability::SetEnabled => self.set_enabled,
            Capability::Uninstall => self.uninstall,
            Capability::OpenDetails => self.open_details,
        }
    }

    pub fn supports_event(&self, kind: EventKind) -> bool {
        self.events.contains(&kind)
    }
}

impl Default for RegistryCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_parses_host_json() {
        let json = r#"{
            "id": "abc",
            "name": "Dark Reader",
            "enabled": true,
            "type": "extension",
            "installType": "normal",
            "icons": [{"size": 16, "url": "a16.png"}, {"size": 128, "url": "a128.png"}],
            "mayDisable": true,
            "version": "4.9.1"
        }"#;
        let record: RawExtensionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "abc");
        assert_eq!(record.kind, ExtensionType::Extension);
        assert_eq!(record.install_type, InstallType::Normal);
        assert_eq!(record.icons.len(), 2);
        assert_eq!(record.may_disable, Some(true));
        assert!(record.description.is_none());
    }

    #[test]
    fn builtin_type_is_spelled_chrome_on_the_wire() {
        let kind: ExtensionType = serde_json::from_str("\"chrome\"").unwrap();
        assert_eq!(kind, ExtensionType::Builtin);
        assert_eq!(kind.to_string(), "chrome");
    }

    #[test]
    fn unrecognized_wire_values_map_to_unknown() {
        let kind: ExtensionType = serde_json::from_str("\"shiny_new_thing\"").unwrap();
        assert_eq!(kind, ExtensionType::Unknown);
        let install: InstallType = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(install, InstallType::Unknown);
        let other: InstallType = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(other, InstallType::Other);
    }

    #[test]
    fn missing_icons_default_to_empty() {
        let json = r#"{"id":"x","name":"X","enabled":false,"type":"theme","installType":"sideload"}"#;
        let record: RawExtensionRecord = serde_json::from_str(json).unwrap();
        assert!(record.icons.is_empty());
    }

    #[test]
    fn event_kind_matches_variant() {
        assert_eq!(
            RegistryEvent::Enabled(ExtensionId::from("a")).kind(),
            EventKind::Enabled
        );
        assert_eq!(RegistryEvent::Uninstalled(None).kind(), EventKind::Uninstalled);
    }

    #[test]
    fn capabilities_supports() {
        let mut caps = RegistryCapabilities::full();
        assert!(caps.supports(Capability::SetEnabled));
        caps.uninstall = false;
        assert!(!caps.supports(Capability::Uninstall));
        assert!(RegistryCapabilities::none().events.is_empty());
        assert!(!RegistryCapabilities::none().supports_event(EventKind::Enabled));
    }
}
