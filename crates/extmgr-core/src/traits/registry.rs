// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry adapter trait: the capability boundary over the host's
//! extension-management subsystem.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream;
use futures_core::Stream;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::ExtmgrError;
use crate::types::{
    EventKind, ExtensionId, RawExtensionRecord, RegistryCapabilities, RegistryEvent,
    UninstallOptions,
};

/// A stream of change notifications for one [`EventKind`].
pub type EventStream = Pin<Box<dyn Stream<Item = RegistryEvent> + Send>>;

/// Query, mutate, and subscribe operations against a host extension registry.
///
/// Completion of a mutating call does not mean the change is visible yet.
/// The subscribed notification is the authoritative signal.
#[async_trait]
pub trait RegistryAdapter: Send + Sync + 'static {
    /// Human-readable name of this adapter.
    fn name(&self) -> &str;

    /// Which sub-capabilities the host currently provides.
    fn capabilities(&self) -> RegistryCapabilities;

    /// Identifier of the running component, so it can hide itself.
    fn self_id(&self) -> Option<ExtensionId>;

    /// Every extension known to the host, built-ins and unmanageable
    /// installs included.
    async fn query_all(&self) -> Result<Vec<RawExtensionRecord>, ExtmgrError>;

    /// Request an enabled-state change.
    async fn set_enabled(&self, id: &ExtensionId, enabled: bool) -> Result<(), ExtmgrError>;

    /// Request removal. A dismissed confirmation dialog surfaces as an error.
    async fn uninstall(
        &self,
        id: &ExtensionId,
        options: UninstallOptions,
    ) -> Result<(), ExtmgrError>;

    /// Open a stream of notifications of one kind.
    ///
    /// Delivery is at-most-once per host event and unordered relative to
    /// in-flight command completions.
    fn subscribe(&self, kind: EventKind) -> Result<EventStream, ExtmgrError>;

    /// Best-effort navigation to the host's details view for one extension.
    fn open_management_surface(&self, id: &ExtensionId);
}

/// Adapt a broadcast receiver into an [`EventStream`] that yields only
/// events of `kind`.
///
/// Lagged receivers drop the missed events, matching the host's
/// at-most-once delivery.
pub fn broadcast_event_stream(
    rx: broadcast::Receiver<RegistryEvent>,
    kind: EventKind,
) -> EventStream {
    Box::pin(stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.kind() == kind => return Some((event, rx)),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%kind, skipped, "registry event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }))
}
