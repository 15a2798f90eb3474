// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Every command activates a controller over the profile registry, runs one
//! popup action, waits briefly for the registry's notification to land, and
//! prints the resulting popup body. The exit code is non-zero when the final
//! snapshot carries an error.

use std::sync::Arc;
use std::time::Duration;

use extmgr_config::ExtmgrConfig;
use extmgr_core::ExtmgrError;
use extmgr_core::types::ExtensionId;
use extmgr_sync::view::MenuSize;
use extmgr_sync::{
    CommandOutcome, EnglishCatalog, MessageCatalog, Phase, PopupView, SyncController, SyncOptions,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::output::{self, OutputOptions};
use crate::profile::ProfileRegistry;
use crate::watch::ProfileWatcher;

/// How long a command waits for its notification before printing.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// One popup action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    SetEnabled { id: ExtensionId, enabled: bool },
    Toggle { id: ExtensionId },
    Uninstall { id: ExtensionId },
    Details { id: ExtensionId },
}

/// An activated popup over the profile registry.
pub struct Session {
    registry: Arc<ProfileRegistry>,
    view: PopupView,
    catalog: Arc<dyn MessageCatalog>,
    output: OutputOptions,
}

impl Session {
    /// Create the controller and view, and activate.
    pub async fn open(
        config: &ExtmgrConfig,
        registry: Arc<ProfileRegistry>,
        output: OutputOptions,
    ) -> Self {
        let controller = SyncController::with_registry(
            registry.clone(),
            SyncOptions::from_config(&config.sync),
        );
        let catalog: Arc<dyn MessageCatalog> = Arc::new(EnglishCatalog);
        let view = PopupView::new(
            controller.clone(),
            catalog.clone(),
            MenuSize::from_config(&config.popup),
        );
        let phase = controller.activate().await;
        debug!(%phase, "session opened");
        Self {
            registry,
            view,
            catalog,
            output,
        }
    }

    pub fn controller(&self) -> &SyncController {
        self.view.controller()
    }

    /// Run one action and print the result. Returns the process exit code.
    pub async fn run(&mut self, action: Action) -> i32 {
        match action {
            Action::List => {}
            Action::SetEnabled { id, enabled } => self.set_enabled(&id, enabled).await,
            Action::Toggle { id } => {
                match self.controller().snapshot().find(&id).map(|d| d.enabled) {
                    Some(enabled) => self.set_enabled(&id, !enabled).await,
                    None => return self.unknown(&id),
                }
            }
            Action::Uninstall { id } => self.uninstall(&id).await,
            Action::Details { id } => {
                // The menu is the only way the popup opens details.
                if !self.open_menu(&id) {
                    return self.unknown(&id);
                }
                self.view.on_open_details();
                return 0;
            }
        }
        self.print()
    }

    /// Print the current body; non-zero when an error is recorded.
    pub fn print(&self) -> i32 {
        let snapshot = self.controller().snapshot();
        output::print_snapshot(&snapshot, &self.view.body(), self.catalog.as_ref(), self.output);
        i32::from(snapshot.last_error.is_some())
    }

    async fn set_enabled(&self, id: &ExtensionId, enabled: bool) {
        let outcome = self.controller().toggle(id, enabled).await;
        if outcome == CommandOutcome::Requested {
            let id = id.clone();
            self.controller()
                .wait_until(SETTLE_TIMEOUT, move |s| {
                    s.find(&id).is_none_or(|d| d.enabled == enabled)
                })
                .await;
        }
    }

    async fn uninstall(&mut self, id: &ExtensionId) {
        if !self.open_menu(id) {
            // Not listed: still ask the registry, naming the id.
            let outcome = self.controller().uninstall(id, id.as_str()).await;
            debug!(?outcome, "uninstall of unlisted extension");
            return;
        }
        let outcome = self.view.on_uninstall().await;
        if outcome == Some(CommandOutcome::Requested) {
            let id = id.clone();
            self.controller()
                .wait_until(SETTLE_TIMEOUT, move |s| {
                    s.phase == Phase::Ready && s.find(&id).is_none()
                })
                .await;
        } else if outcome == Some(CommandOutcome::Cancelled) {
            info!(extension_id = %id, "uninstall cancelled");
        }
    }

    fn open_menu(&mut self, id: &ExtensionId) -> bool {
        use extmgr_sync::view::{Point, Viewport};
        let viewport = Viewport {
            width: f64::MAX,
            height: f64::MAX,
        };
        self.view.on_context_menu(id, Point::default(), viewport);
        self.view.menu().is_open()
    }

    fn unknown(&self, id: &ExtensionId) -> i32 {
        eprintln!("extmgr: {}", ExtmgrError::NotFound(id.clone()));
        1
    }

    /// Print the list on every change until `shutdown` fires.
    pub async fn watch(&self, shutdown: CancellationToken) -> Result<i32, ExtmgrError> {
        let _watcher = ProfileWatcher::spawn(self.registry.clone(), shutdown.clone())?;
        let mut rx = self.controller().watch();
        self.print();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let phase = rx.borrow_and_update().phase;
                    if phase != Phase::Loading {
                        self.print();
                    }
                }
            }
        }
        self.controller().deactivate();
        Ok(0)
    }
}
