// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock registry adapter for deterministic testing.
//!
//! `MockRegistry` implements `RegistryAdapter` over an in-memory record list.
//! Tests can inject failures and query delays, inspect every call, and emit
//! change notifications by hand. By default a successful command also
//! updates the records and emits the matching notification, the way a real
//! host does.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use extmgr_core::types::{
    EventKind, ExtensionId, RawExtensionRecord, RegistryCapabilities, RegistryEvent,
    UninstallOptions,
};
use extmgr_core::{EventStream, ExtmgrError, RegistryAdapter, broadcast_event_stream};

/// One captured adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    QueryAll,
    SetEnabled { id: ExtensionId, enabled: bool },
    Uninstall { id: ExtensionId, options: UninstallOptions },
    OpenDetails(ExtensionId),
}

/// A scriptable in-memory registry.
pub struct MockRegistry {
    records: Arc<Mutex<Vec<RawExtensionRecord>>>,
    self_id: Option<ExtensionId>,
    capabilities: std::sync::Mutex<RegistryCapabilities>,
    query_failures: Mutex<VecDeque<ExtmgrError>>,
    query_delays: Mutex<VecDeque<Duration>>,
    set_enabled_failures: Mutex<VecDeque<ExtmgrError>>,
    uninstall_failures: Mutex<VecDeque<ExtmgrError>>,
    // Sync trait methods record calls too, so this one is a std mutex.
    calls: std::sync::Mutex<Vec<MockCall>>,
    events: broadcast::Sender<RegistryEvent>,
    auto_events: AtomicBool,
}

impl MockRegistry {
    /// Create an empty registry with every capability present.
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a registry holding `records`.
    pub fn with_records(records: Vec<RawExtensionRecord>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            records: Arc::new(Mutex::new(records)),
            self_id: None,
            capabilities: std::sync::Mutex::new(RegistryCapabilities::full()),
            query_failures: Mutex::new(VecDeque::new()),
            query_delays: Mutex::new(VecDeque::new()),
            set_enabled_failures: Mutex::new(VecDeque::new()),
            uninstall_failures: Mutex::new(VecDeque::new()),
            calls: std::sync::Mutex::new(Vec::new()),
            events,
            auto_events: AtomicBool::new(true),
        }
    }

    /// Set the id the registry reports for the running component.
    pub fn with_self_id(mut self, id: &str) -> Self {
        self.self_id = Some(ExtensionId::from(id));
        self
    }

    /// Replace the reported capabilities.
    pub fn with_capabilities(self, capabilities: RegistryCapabilities) -> Self {
        self.set_capabilities(capabilities);
        self
    }

    /// Whether successful commands update records and emit notifications.
    pub fn with_auto_events(self, enabled: bool) -> Self {
        self.auto_events.store(enabled, Ordering::SeqCst);
        self
    }

    pub fn set_capabilities(&self, capabilities: RegistryCapabilities) {
        *self
            .capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = capabilities;
    }

    /// Replace the records without emitting anything.
    pub async fn set_records(&self, records: Vec<RawExtensionRecord>) {
        *self.records.lock().await = records;
    }

    /// Current records.
    pub async fn records(&self) -> Vec<RawExtensionRecord> {
        self.records.lock().await.clone()
    }

    /// Add a record and emit an installed notification.
    pub async fn install(&self, record: RawExtensionRecord) {
        let id = record.id.clone();
        self.records.lock().await.push(record);
        self.emit(RegistryEvent::Installed(Some(id)));
    }

    /// Make the next `query_all` fail with `error`. Failures queue up.
    pub async fn fail_next_query(&self, error: ExtmgrError) {
        self.query_failures.lock().await.push_back(error);
    }

    /// Make the next `query_all` take `delay` after reading the records.
    /// The records it returns are those present when the call started.
    pub async fn delay_next_query(&self, delay: Duration) {
        self.query_delays.lock().await.push_back(delay);
    }

    /// Make the next `set_enabled` fail with `error`.
    pub async fn fail_next_set_enabled(&self, error: ExtmgrError) {
        self.set_enabled_failures.lock().await.push_back(error);
    }

    /// Make the next `uninstall` fail with `error`.
    pub async fn fail_next_uninstall(&self, error: ExtmgrError) {
        self.uninstall_failures.lock().await.push_back(error);
    }

    /// Deliver a notification to every subscriber. Returns how many
    /// receivers it reached.
    pub fn emit(&self, event: RegistryEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// Number of live notification streams.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `query_all` calls so far.
    pub fn query_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::QueryAll))
            .count()
    }

    /// Ids passed to `open_management_surface`.
    pub fn opened(&self) -> Vec<ExtensionId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::OpenDetails(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record_call(&self, call: MockCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn auto_events(&self) -> bool {
        self.auto_events.load(Ordering::SeqCst)
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryAdapter for MockRegistry {
    fn name(&self) -> &str {
        "mock-registry"
    }

    fn capabilities(&self) -> RegistryCapabilities {
        self.capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn self_id(&self) -> Option<ExtensionId> {
        self.self_id.clone()
    }

    async fn query_all(&self) -> Result<Vec<RawExtensionRecord>, ExtmgrError> {
        self.record_call(MockCall::QueryAll);
        let records = self.records.lock().await.clone();
        let delay = self.query_delays.lock().await.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.query_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(records)
    }

    async fn set_enabled(&self, id: &ExtensionId, enabled: bool) -> Result<(), ExtmgrError> {
        self.record_call(MockCall::SetEnabled {
            id: id.clone(),
            enabled,
        });
        if let Some(err) = self.set_enabled_failures.lock().await.pop_front() {
            return Err(err);
        }
        if self.auto_events() {
            let found = {
                let mut records = self.records.lock().await;
                match records.iter_mut().find(|r| &r.id == id) {
                    Some(record) => {
                        record.enabled = enabled;
                        true
                    }
                    None => false,
                }
            };
            if !found {
                return Err(ExtmgrError::NotFound(id.clone()));
            }
            let event = if enabled {
                RegistryEvent::Enabled(id.clone())
            } else {
                RegistryEvent::Disabled(id.clone())
            };
            self.emit(event);
        }
        Ok(())
    }

    async fn uninstall(
        &self,
        id: &ExtensionId,
        options: UninstallOptions,
    ) -> Result<(), ExtmgrError> {
        self.record_call(MockCall::Uninstall {
            id: id.clone(),
            options,
        });
        if let Some(err) = self.uninstall_failures.lock().await.pop_front() {
            return Err(err);
        }
        if self.auto_events() {
            let removed = {
                let mut records = self.records.lock().await;
                let before = records.len();
                records.retain(|r| &r.id != id);
                records.len() != before
            };
            if !removed {
                return Err(ExtmgrError::NotFound(id.clone()));
            }
            self.emit(RegistryEvent::Uninstalled(Some(id.clone())));
        }
        Ok(())
    }

    fn subscribe(&self, kind: EventKind) -> Result<EventStream, ExtmgrError> {
        if !self.capabilities().supports_event(kind) {
            return Err(ExtmgrError::registry(format!("no {kind} listener")));
        }
        debug!(%kind, "mock registry subscription opened");
        Ok(broadcast_event_stream(self.events.subscribe(), kind))
    }

    fn open_management_surface(&self, id: &ExtensionId) {
        self.record_call(MockCall::OpenDetails(id.clone()));
    }
}
