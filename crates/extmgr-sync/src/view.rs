// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Popup view model: what the popup body shows for a controller snapshot,
//! plus the per-view context menu state.
//!
//! The context menu is owned here, not by the controller. Registry
//! notifications never close it; only an outside pointer press or one of the
//! two menu actions does.

use std::sync::Arc;

use extmgr_config::model::PopupConfig;
use extmgr_core::types::{ExtensionDescriptor, ExtensionId};
use tracing::debug;

use crate::controller::{CommandOutcome, Phase, SyncController, SyncSnapshot};
use crate::messages::{self, MessageCatalog, MessageKey};

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visible area of the popup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Footprint of the context menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuSize {
    pub width: f64,
    pub height: f64,
}

impl MenuSize {
    pub fn from_config(config: &PopupConfig) -> Self {
        Self {
            width: config.menu_width,
            height: config.menu_height,
        }
    }
}

impl Default for MenuSize {
    fn default() -> Self {
        Self::from_config(&PopupConfig::default())
    }
}

/// Position the menu at `pointer`, flipping left or up on each axis where it
/// would overflow the viewport.
pub fn clamp_anchor(pointer: Point, menu: MenuSize, viewport: Viewport) -> Point {
    let x = if pointer.x + menu.width > viewport.width {
        pointer.x - menu.width
    } else {
        pointer.x
    };
    let y = if pointer.y + menu.height > viewport.height {
        pointer.y - menu.height
    } else {
        pointer.y
    };
    Point { x, y }
}

/// The extension a menu was opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTarget {
    pub id: ExtensionId,
    pub name: String,
}

/// At most one open menu per view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContextMenu {
    #[default]
    Closed,
    Open { target: MenuTarget, anchor: Point },
}

impl ContextMenu {
    pub fn is_open(&self) -> bool {
        matches!(self, ContextMenu::Open { .. })
    }

    pub fn target(&self) -> Option<&MenuTarget> {
        match self {
            ContextMenu::Open { target, .. } => Some(target),
            ContextMenu::Closed => None,
        }
    }

    /// Open on `target`, replacing any menu already open.
    pub fn open(&mut self, target: MenuTarget, pointer: Point, menu: MenuSize, viewport: Viewport) {
        let anchor = clamp_anchor(pointer, menu, viewport);
        *self = ContextMenu::Open { target, anchor };
    }

    pub fn close(&mut self) {
        *self = ContextMenu::Closed;
    }

    /// Close for an action and hand back what it was opened on.
    pub fn take_for_action(&mut self) -> Option<MenuTarget> {
        match std::mem::take(self) {
            ContextMenu::Open { target, .. } => Some(target),
            ContextMenu::Closed => None,
        }
    }
}

/// Where a row's icon comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    Url(String),
    /// The popup's built-in placeholder icon.
    Fallback,
}

/// One list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRow {
    pub id: ExtensionId,
    pub name: String,
    pub enabled: bool,
    pub icon: IconSource,
}

impl From<&ExtensionDescriptor> for ExtensionRow {
    fn from(d: &ExtensionDescriptor) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            enabled: d.enabled,
            icon: match &d.icon_url {
                Some(url) if !url.is_empty() => IconSource::Url(url.clone()),
                _ => IconSource::Fallback,
            },
        }
    }
}

/// What the popup body shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupBody {
    Loading { label: String },
    /// Nothing to list and an error to explain; offers a retry.
    Failed { message: String, retry_label: String },
    List {
        banner: Option<String>,
        rows: Vec<ExtensionRow>,
    },
    Empty { message: String },
}

/// Render a snapshot.
pub fn render(snapshot: &SyncSnapshot, catalog: &dyn MessageCatalog) -> PopupBody {
    if matches!(snapshot.phase, Phase::Idle | Phase::Loading) {
        return PopupBody::Loading {
            label: catalog.get(MessageKey::Loading),
        };
    }

    let error = snapshot
        .last_error
        .as_ref()
        .map(|e| messages::error_text(e, catalog));

    match (error, snapshot.extensions.is_empty()) {
        (Some(message), true) => PopupBody::Failed {
            message,
            retry_label: catalog.get(MessageKey::Retry),
        },
        (None, true) => PopupBody::Empty {
            message: catalog.get(MessageKey::NoExtensionsFound),
        },
        (banner, false) => PopupBody::List {
            banner,
            rows: snapshot.extensions.iter().map(ExtensionRow::from).collect(),
        },
    }
}

/// A popup bound to a controller: translates pointer and button input into
/// controller calls and keeps the context menu.
pub struct PopupView {
    controller: SyncController,
    catalog: Arc<dyn MessageCatalog>,
    menu_size: MenuSize,
    menu: ContextMenu,
}

impl PopupView {
    pub fn new(
        controller: SyncController,
        catalog: Arc<dyn MessageCatalog>,
        menu_size: MenuSize,
    ) -> Self {
        Self {
            controller,
            catalog,
            menu_size,
            menu: ContextMenu::Closed,
        }
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn body(&self) -> PopupBody {
        render(&self.controller.snapshot(), self.catalog.as_ref())
    }

    /// Secondary click on a row. Ignored if the id is not listed.
    pub fn on_context_menu(&mut self, id: &ExtensionId, pointer: Point, viewport: Viewport) {
        let Some(name) = self.controller.snapshot().find(id).map(|d| d.name.clone()) else {
            debug!(extension_id = %id, "context menu requested for unlisted extension");
            return;
        };
        let target = MenuTarget {
            id: id.clone(),
            name,
        };
        self.menu.open(target, pointer, self.menu_size, viewport);
    }

    /// Pointer press outside the open menu and its row.
    pub fn on_outside_pointer(&mut self) {
        self.menu.close();
    }

    /// "Open details" menu action.
    pub fn on_open_details(&mut self) {
        if let Some(target) = self.menu.take_for_action() {
            self.controller.open_details(&target.id);
        }
    }

    /// "Uninstall" menu action.
    pub async fn on_uninstall(&mut self) -> Option<CommandOutcome> {
        let target = self.menu.take_for_action()?;
        Some(self.controller.uninstall(&target.id, &target.name).await)
    }

    /// Flip a row's switch. Asks for the opposite of the listed state; the
    /// row itself only changes when the registry confirms.
    pub async fn on_toggle(&self, id: &ExtensionId) -> Option<CommandOutcome> {
        let enabled = self.controller.snapshot().find(id)?.enabled;
        Some(self.controller.toggle(id, !enabled).await)
    }

    /// Retry button or external refresh trigger.
    pub async fn on_refresh(&self) -> Phase {
        self.controller.refresh().await
    }
}
