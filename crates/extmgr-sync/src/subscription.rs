// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owned subscription to registry change notifications.
//!
//! Host event listeners have no unsubscribe guarantee, so the merged event
//! streams are driven by a task tied to a [`SubscriptionHandle`]. Closing or
//! dropping the handle cancels the task.

use std::future::Future;

use extmgr_core::types::{EventKind, RegistryEvent};
use extmgr_core::EventStream;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a running notification pump.
pub struct SubscriptionHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    kinds: Vec<EventKind>,
}

impl SubscriptionHandle {
    /// Merge `streams` and feed every event to `handler` until the handle is
    /// closed, every stream ends, or `handler` returns `false`.
    ///
    /// Events are handled one at a time in arrival order.
    pub fn spawn<F, Fut>(streams: Vec<(EventKind, EventStream)>, mut handler: F) -> Self
    where
        F: FnMut(RegistryEvent) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let kinds: Vec<EventKind> = streams.iter().map(|(kind, _)| *kind).collect();
        let mut merged = futures::stream::select_all(streams.into_iter().map(|(_, s)| s));

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => {
                        debug!("registry subscription closed");
                        break;
                    }
                    next = merged.next() => match next {
                        Some(event) => {
                            if !handler(event).await {
                                debug!("subscriber dropped, stopping registry subscription");
                                break;
                            }
                        }
                        None => {
                            debug!("all registry event streams ended");
                            break;
                        }
                    }
                }
            }
        });

        Self { token, task, kinds }
    }

    /// Event kinds this subscription listens to.
    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    /// Whether the pump has stopped or been asked to stop.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.task.is_finished()
    }

    /// Stop delivering events. Best-effort: an event already being handled
    /// runs to completion.
    pub fn close(&self) {
        self.token.cancel();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("kinds", &self.kinds)
            .field("closed", &self.is_closed())
            .finish()
    }
}
