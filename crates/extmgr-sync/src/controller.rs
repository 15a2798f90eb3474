// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronization controller: owns the extension cache, keeps it in step
//! with the registry, and runs enable/disable/uninstall commands.
//!
//! Lifecycle per activation: `Idle -> Loading -> Ready | Error`, with `Ready`
//! and `Error` re-entering `Loading` on retry or notification-triggered
//! refresh.
//!
//! The cache only changes in short synchronous updates at the completion of
//! an operation, and every refresh is a total replacement. Two refreshes that
//! overlap therefore leave the result of whichever query finished last.
//! Commands never touch the cache: a successful toggle is reflected when the
//! registry's enabled/disabled notification arrives, and a successful
//! uninstall when the uninstalled notification triggers a refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use extmgr_config::model::SyncConfig;
use extmgr_core::types::{
    Capability, EventKind, ExtensionDescriptor, ExtensionId, RegistryEvent, UninstallOptions,
};
use extmgr_core::{EventStream, RegistryAdapter};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::classify::{CancellationMatcher, UninstallFailure};
use crate::error::{CommandAction, SyncError};
use crate::policy::{self, FilterPolicy};
use crate::subscription::SubscriptionHandle;

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Created, not yet activated.
    Idle,
    /// A full refresh is running.
    Loading,
    /// The cache reflects the last completed query.
    Ready,
    /// The last refresh failed; see `last_error`.
    Error,
}

/// What the view sees: phase, ordered cache, and the last recorded error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub phase: Phase,
    pub extensions: Vec<ExtensionDescriptor>,
    pub last_error: Option<SyncError>,
}

impl SyncSnapshot {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            extensions: Vec::new(),
            last_error: None,
        }
    }

    pub fn find(&self, id: &ExtensionId) -> Option<&ExtensionDescriptor> {
        self.extensions.iter().find(|d| &d.id == id)
    }
}

/// Counters for observing controller activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub refreshes_started: u64,
    pub refreshes_completed: u64,
    pub resyncs_scheduled: u64,
    pub events_handled: u64,
}

/// Result of a user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The registry accepted the request; the notification will follow.
    Requested,
    /// The user dismissed the host's confirmation dialog.
    Cancelled,
    /// The command failed; the error is also recorded in the snapshot.
    Failed(SyncError),
}

/// Tuning for the controller.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Delay before the refresh that follows a failed toggle.
    pub resync_delay: Duration,
    /// Classifier for uninstall failures.
    pub cancellation: CancellationMatcher,
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            resync_delay: Duration::from_millis(config.resync_delay_ms),
            cancellation: CancellationMatcher::new(&config.cancellation_keywords),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

struct Inner {
    registry: Option<Arc<dyn RegistryAdapter>>,
    options: SyncOptions,
    state: watch::Sender<SyncSnapshot>,
    subscription: Mutex<Option<SubscriptionHandle>>,
    refreshes_started: AtomicU64,
    refreshes_completed: AtomicU64,
    resyncs_scheduled: AtomicU64,
    events_handled: AtomicU64,
}

/// The extension state synchronization controller.
///
/// Cheap to clone; clones share one cache. Background work (the
/// notification pump and deferred resyncs) holds only weak references, so
/// dropping the last clone stops it.
#[derive(Clone)]
pub struct SyncController {
    inner: Arc<Inner>,
}

impl SyncController {
    /// Create a controller. `None` means the host offers no registry at all.
    pub fn new(registry: Option<Arc<dyn RegistryAdapter>>, options: SyncOptions) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::idle());
        Self {
            inner: Arc::new(Inner {
                registry,
                options,
                state,
                subscription: Mutex::new(None),
                refreshes_started: AtomicU64::new(0),
                refreshes_completed: AtomicU64::new(0),
                resyncs_scheduled: AtomicU64::new(0),
                events_handled: AtomicU64::new(0),
            }),
        }
    }

    pub fn with_registry(registry: Arc<dyn RegistryAdapter>, options: SyncOptions) -> Self {
        Self::new(Some(registry), options)
    }

    /// Current state.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<SyncSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            refreshes_started: self.inner.refreshes_started.load(Ordering::SeqCst),
            refreshes_completed: self.inner.refreshes_completed.load(Ordering::SeqCst),
            resyncs_scheduled: self.inner.resyncs_scheduled.load(Ordering::SeqCst),
            events_handled: self.inner.events_handled.load(Ordering::SeqCst),
        }
    }

    /// Wait until `predicate` holds for the current state, up to `timeout`.
    /// Returns whether it held.
    pub async fn wait_until<F>(&self, timeout: Duration, predicate: F) -> bool
    where
        F: FnMut(&SyncSnapshot) -> bool,
    {
        let mut rx = self.watch();
        matches!(
            tokio::time::timeout(timeout, rx.wait_for(predicate)).await,
            Ok(Ok(_))
        )
    }

    /// Activate: run the initial full refresh, then subscribe to registry
    /// notifications for the rest of the activation.
    pub async fn activate(&self) -> Phase {
        info!(
            registry = self.inner.registry.as_ref().map(|r| r.name()).unwrap_or("<none>"),
            "activating extension sync"
        );
        let phase = self.refresh().await;
        self.ensure_subscribed();
        phase
    }

    /// Close the notification subscription. The cache is kept.
    pub fn deactivate(&self) {
        let handle = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.close();
            info!("extension sync deactivated");
        }
    }

    /// Whether a live notification subscription exists.
    pub fn is_subscribed(&self) -> bool {
        self.inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_closed())
    }

    /// Full refresh: rebuild the cache from a fresh bulk query.
    ///
    /// Callable in any phase. A missing registry or query capability moves
    /// straight to `Error` without querying; a failed query moves to `Error`
    /// and leaves the previous cache untouched.
    pub async fn refresh(&self) -> Phase {
        self.inner.refreshes_started.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_modify(|s| {
            s.phase = Phase::Loading;
            s.last_error = None;
        });

        let phase = match self.require(Capability::QueryAll) {
            Err(err) => {
                warn!(error = %err, "extension registry unavailable");
                self.fail_refresh(err)
            }
            Ok(registry) => {
                let policy = FilterPolicy::new(registry.self_id());
                match registry.query_all().await {
                    Ok(records) => {
                        let cache = policy::build_cache(records, &policy);
                        info!(count = cache.len(), "extension list refreshed");
                        self.inner.state.send_modify(|s| {
                            s.phase = Phase::Ready;
                            s.extensions = cache;
                        });
                        Phase::Ready
                    }
                    Err(e) => {
                        error!(error = %e, "failed to load extensions");
                        self.fail_refresh(SyncError::QueryFailed {
                            reason: e.to_string(),
                        })
                    }
                }
            }
        };

        self.inner.refreshes_completed.fetch_add(1, Ordering::SeqCst);
        phase
    }

    /// Apply one registry notification.
    ///
    /// Enabled/disabled patch the matching descriptor and ignore unknown ids.
    /// Installed/uninstalled payloads are not trusted, so they trigger a full
    /// refresh.
    pub async fn handle_event(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::Enabled(id) => {
                self.patch_enabled(&id, true);
            }
            RegistryEvent::Disabled(id) => {
                self.patch_enabled(&id, false);
            }
            RegistryEvent::Installed(id) | RegistryEvent::Uninstalled(id) => {
                debug!(extension_id = ?id, "registry membership changed, refreshing");
                self.refresh().await;
            }
        }
        self.inner.events_handled.fetch_add(1, Ordering::SeqCst);
    }

    /// Ask the registry to enable or disable an extension.
    ///
    /// Success changes nothing locally. Failure records a
    /// [`SyncError::CommandFailed`] and schedules one deferred full refresh to
    /// re-establish ground truth.
    pub async fn toggle(&self, id: &ExtensionId, enabled: bool) -> CommandOutcome {
        let action = CommandAction::for_toggle(enabled);
        self.clear_error();

        let registry = match self.require(Capability::SetEnabled) {
            Ok(registry) => registry,
            Err(err) => {
                warn!(extension_id = %id, %action, error = %err, "cannot toggle extension");
                self.record_error(err.clone());
                return CommandOutcome::Failed(err);
            }
        };

        match registry.set_enabled(id, enabled).await {
            Ok(()) => {
                debug!(extension_id = %id, %action, "state change requested");
                CommandOutcome::Requested
            }
            Err(e) => {
                error!(extension_id = %id, %action, error = %e, "failed to toggle extension");
                let err = SyncError::CommandFailed {
                    action,
                    name: self.display_name(id),
                    reason: e.to_string(),
                };
                self.record_error(err.clone());
                self.schedule_resync();
                CommandOutcome::Failed(err)
            }
        }
    }

    /// Ask the registry to uninstall an extension, with host confirmation.
    ///
    /// A dismissed dialog is silent. Any other failure records a
    /// [`SyncError::CommandFailed`] naming `name`; the registry is unchanged
    /// by a failed uninstall, so no refresh follows.
    pub async fn uninstall(&self, id: &ExtensionId, name: &str) -> CommandOutcome {
        self.clear_error();

        let registry = match self.require(Capability::Uninstall) {
            Ok(registry) => registry,
            Err(err) => {
                warn!(extension_id = %id, error = %err, "cannot uninstall extension");
                self.record_error(err.clone());
                return CommandOutcome::Failed(err);
            }
        };

        let options = UninstallOptions {
            show_confirm_dialog: true,
        };
        match registry.uninstall(id, options).await {
            Ok(()) => {
                debug!(extension_id = %id, "uninstall requested");
                CommandOutcome::Requested
            }
            Err(e) => match self.inner.options.cancellation.classify(&e) {
                UninstallFailure::Cancelled => {
                    debug!(extension_id = %id, "uninstall cancelled by user");
                    CommandOutcome::Cancelled
                }
                UninstallFailure::Failed => {
                    error!(extension_id = %id, error = %e, "failed to uninstall extension");
                    let err = SyncError::CommandFailed {
                        action: CommandAction::Uninstall,
                        name: name.to_string(),
                        reason: e.to_string(),
                    };
                    self.record_error(err.clone());
                    CommandOutcome::Failed(err)
                }
            },
        }
    }

    /// Open the host's details view for one extension. Best-effort: nothing
    /// happens and nothing is reported when the host cannot do it.
    pub fn open_details(&self, id: &ExtensionId) {
        match &self.inner.registry {
            Some(registry) if registry.capabilities().open_details => {
                registry.open_management_surface(id);
            }
            _ => debug!(extension_id = %id, "details view unavailable"),
        }
    }

    fn require(&self, capability: Capability) -> Result<Arc<dyn RegistryAdapter>, SyncError> {
        let registry = self
            .inner
            .registry
            .as_ref()
            .ok_or(SyncError::CapabilityUnavailable {
                capability: Capability::Registry,
            })?;
        if !registry.capabilities().supports(capability) {
            return Err(SyncError::CapabilityUnavailable { capability });
        }
        Ok(Arc::clone(registry))
    }

    fn fail_refresh(&self, err: SyncError) -> Phase {
        self.inner.state.send_modify(|s| {
            s.phase = Phase::Error;
            s.last_error = Some(err);
        });
        Phase::Error
    }

    /// A command failure never replaces the error behind `Phase::Error`.
    fn record_error(&self, err: SyncError) {
        self.inner.state.send_if_modified(|s| {
            if holds_list_failure(s) {
                debug!(error = %err, "list already failed, not replacing its error");
                return false;
            }
            s.last_error = Some(err);
            true
        });
    }

    /// Drop a command banner. The error behind `Phase::Error` stays until
    /// the next refresh.
    fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| {
            if s.last_error.is_some() && !holds_list_failure(s) {
                s.last_error = None;
                true
            } else {
                false
            }
        });
    }

    /// Display name for error messages; falls back to the id.
    fn display_name(&self, id: &ExtensionId) -> String {
        self.inner
            .state
            .borrow()
            .find(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Returns whether anything changed; duplicate or unknown-id
    /// notifications are no-ops.
    fn patch_enabled(&self, id: &ExtensionId, enabled: bool) -> bool {
        let changed = self.inner.state.send_if_modified(|s| {
            match s.extensions.iter_mut().find(|d| &d.id == id) {
                Some(d) if d.enabled != enabled => {
                    d.enabled = enabled;
                    true
                }
                _ => false,
            }
        });
        debug!(extension_id = %id, enabled, changed, "applied enabled-state notification");
        changed
    }

    fn schedule_resync(&self) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.options.resync_delay;
        self.inner.resyncs_scheduled.fetch_add(1, Ordering::SeqCst);
        debug!(delay_ms = delay.as_millis() as u64, "scheduling resynchronization");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                SyncController { inner }.refresh().await;
            }
        });
    }

    fn ensure_subscribed(&self) {
        let mut slot = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_closed()) {
            return;
        }
        let Some(registry) = self.inner.registry.as_ref() else {
            return;
        };

        let capabilities = registry.capabilities();
        let mut streams: Vec<(EventKind, EventStream)> = Vec::new();
        for kind in EventKind::ALL {
            if !capabilities.supports_event(kind) {
                debug!(%kind, "registry does not offer this notification");
                continue;
            }
            match registry.subscribe(kind) {
                Ok(stream) => streams.push((kind, stream)),
                Err(e) => warn!(%kind, error = %e, "failed to subscribe to registry notifications"),
            }
        }
        if streams.is_empty() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::spawn(streams, move |event| {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => {
                        SyncController { inner }.handle_event(event).await;
                        true
                    }
                    None => false,
                }
            }
        });
        info!(kinds = ?handle.kinds(), "subscribed to registry notifications");
        *slot = Some(handle);
    }
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("registry", &self.inner.registry.as_ref().map(|r| r.name()))
            .field("phase", &self.inner.state.borrow().phase)
            .field("stats", &self.stats())
            .finish()
    }
}

/// The snapshot is in `Error` because the list itself could not be loaded.
fn holds_list_failure(snapshot: &SyncSnapshot) -> bool {
    snapshot.phase == Phase::Error && snapshot.last_error.as_ref().is_some_and(SyncError::is_fatal)
}
