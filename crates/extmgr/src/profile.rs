// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed registry adapter.
//!
//! A profile is a JSON array of raw extension records, the same shape the
//! host management API returns. Commands rewrite the file and emit the
//! notification a host would; edits made by anything else are picked up by
//! [`ProfileRegistry::reload`] (driven by the profile watcher) and turned
//! into notifications by diffing against the last known contents.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use extmgr_config::model::RegistryConfig;
use extmgr_core::types::{
    EventKind, ExtensionId, InstallType, RawExtensionRecord, RegistryCapabilities, RegistryEvent,
    UninstallOptions,
};
use extmgr_core::{EventStream, ExtmgrError, RegistryAdapter, broadcast_event_stream};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

/// How uninstall confirmation is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Ask on the terminal.
    Prompt,
    AssumeYes,
    AssumeNo,
}

/// Registry over a JSON profile file.
pub struct ProfileRegistry {
    path: PathBuf,
    self_id: Option<ExtensionId>,
    details_url: String,
    confirm: ConfirmMode,
    known: Mutex<Vec<RawExtensionRecord>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl ProfileRegistry {
    pub fn new(path: impl Into<PathBuf>, confirm: ConfirmMode) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            path: path.into(),
            self_id: None,
            details_url: RegistryConfig::default().details_url,
            confirm,
            known: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Build from the `[registry]` config section.
    pub fn from_config(config: &RegistryConfig, confirm: ConfirmMode) -> Self {
        let mut registry = Self::new(&config.profile_path, confirm);
        registry.self_id = config.self_id.as_deref().map(ExtensionId::from);
        registry.details_url = config.details_url.clone();
        registry
    }

    pub fn with_self_id(mut self, id: impl Into<ExtensionId>) -> Self {
        self.self_id = Some(id.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The details view URL for one extension.
    pub fn details_url(&self, id: &ExtensionId) -> String {
        self.details_url.replace("{id}", id.as_str())
    }

    /// Re-read the profile and emit notifications for whatever changed since
    /// the last read or write. Returns the emitted events.
    pub async fn reload(&self) -> Result<Vec<RegistryEvent>, ExtmgrError> {
        let mut known = self.known.lock().await;
        let current = read_profile(&self.path).await?;
        let events = diff_records(&known, &current);
        *known = current;
        drop(known);

        for event in &events {
            self.emit(event.clone());
        }
        if !events.is_empty() {
            info!(path = %self.path.display(), changes = events.len(), "profile changed on disk");
        }
        Ok(events)
    }

    fn emit(&self, event: RegistryEvent) {
        let receivers = self.events.send(event.clone()).unwrap_or(0);
        debug!(?event, receivers, "registry event emitted");
    }

    async fn confirm_uninstall(&self, name: &str) -> Result<bool, ExtmgrError> {
        match self.confirm {
            ConfirmMode::AssumeYes => Ok(true),
            ConfirmMode::AssumeNo => Ok(false),
            ConfirmMode::Prompt => {
                let question = format!("Remove \"{name}\"? [y/N] ");
                tokio::task::spawn_blocking(move || prompt_yes_no(&question))
                    .await
                    .map_err(|e| ExtmgrError::Internal(format!("confirmation prompt failed: {e}")))?
                    .map_err(|source| ExtmgrError::Io {
                        context: "reading confirmation".to_string(),
                        source,
                    })
            }
        }
    }
}

#[async_trait]
impl RegistryAdapter for ProfileRegistry {
    fn name(&self) -> &str {
        "profile"
    }

    fn capabilities(&self) -> RegistryCapabilities {
        RegistryCapabilities::full()
    }

    fn self_id(&self) -> Option<ExtensionId> {
        self.self_id.clone()
    }

    async fn query_all(&self) -> Result<Vec<RawExtensionRecord>, ExtmgrError> {
        let records = read_profile(&self.path).await?;
        *self.known.lock().await = records.clone();
        Ok(records)
    }

    async fn set_enabled(&self, id: &ExtensionId, enabled: bool) -> Result<(), ExtmgrError> {
        let mut known = self.known.lock().await;
        let mut records = read_profile(&self.path).await?;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| ExtmgrError::NotFound(id.clone()))?;

        if record.may_disable == Some(false) {
            return Err(ExtmgrError::registry(format!(
                "Extension {id} is locked by policy"
            )));
        }
        if record.enabled == enabled {
            debug!(extension_id = %id, enabled, "enabled state already set");
            *known = records;
            return Ok(());
        }

        record.enabled = enabled;
        write_profile(&self.path, &records).await?;
        *known = records;
        drop(known);

        self.emit(if enabled {
            RegistryEvent::Enabled(id.clone())
        } else {
            RegistryEvent::Disabled(id.clone())
        });
        Ok(())
    }

    async fn uninstall(
        &self,
        id: &ExtensionId,
        options: UninstallOptions,
    ) -> Result<(), ExtmgrError> {
        let mut known = self.known.lock().await;
        let mut records = read_profile(&self.path).await?;
        let record = records
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| ExtmgrError::NotFound(id.clone()))?;

        if record.install_type == InstallType::Admin {
            return Err(ExtmgrError::registry(format!(
                "Extension {id} is installed by policy and cannot be removed"
            )));
        }
        if options.show_confirm_dialog && !self.confirm_uninstall(&record.name).await? {
            return Err(ExtmgrError::UserCancelled {
                message: "User cancelled uninstall".to_string(),
            });
        }

        records.retain(|r| &r.id != id);
        write_profile(&self.path, &records).await?;
        *known = records;
        drop(known);

        self.emit(RegistryEvent::Uninstalled(Some(id.clone())));
        Ok(())
    }

    fn subscribe(&self, kind: EventKind) -> Result<EventStream, ExtmgrError> {
        Ok(broadcast_event_stream(self.events.subscribe(), kind))
    }

    fn open_management_surface(&self, id: &ExtensionId) {
        let url = self.details_url(id);
        info!(extension_id = %id, %url, "opening details view");
        println!("{url}");
    }
}

/// Read and parse a profile file.
pub async fn read_profile(path: &Path) -> Result<Vec<RawExtensionRecord>, ExtmgrError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtmgrError::Io {
            context: format!("reading profile {}", path.display()),
            source,
        })?;
    serde_json::from_str(&content).map_err(|e| ExtmgrError::Io {
        context: format!("parsing profile {}", path.display()),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

/// Write a profile by replacing the file, so readers never see a partial one.
pub async fn write_profile(path: &Path, records: &[RawExtensionRecord]) -> Result<(), ExtmgrError> {
    let content = serde_json::to_string_pretty(records)
        .map_err(|e| ExtmgrError::Internal(format!("failed to serialize profile: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source: std::io::Error| ExtmgrError::Io {
        context: format!("writing profile {}", path.display()),
        source,
    };
    tokio::fs::write(&tmp, content).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

/// Notifications a host would have sent to get from `old` to `new`.
///
/// Removed ids become uninstalled, new ids installed, and an enabled flip
/// enabled/disabled. Any other change to a record is reported as installed,
/// the way hosts report updates.
pub fn diff_records(old: &[RawExtensionRecord], new: &[RawExtensionRecord]) -> Vec<RegistryEvent> {
    let before: HashMap<&ExtensionId, &RawExtensionRecord> =
        old.iter().map(|r| (&r.id, r)).collect();
    let after: HashMap<&ExtensionId, &RawExtensionRecord> =
        new.iter().map(|r| (&r.id, r)).collect();

    let mut events = Vec::new();
    for record in old {
        if !after.contains_key(&record.id) {
            events.push(RegistryEvent::Uninstalled(Some(record.id.clone())));
        }
    }
    for record in new {
        match before.get(&record.id) {
            None => events.push(RegistryEvent::Installed(Some(record.id.clone()))),
            Some(previous) => {
                let mut rest = (*previous).clone();
                rest.enabled = record.enabled;
                if &rest != record {
                    events.push(RegistryEvent::Installed(Some(record.id.clone())));
                } else if previous.enabled != record.enabled {
                    events.push(if record.enabled {
                        RegistryEvent::Enabled(record.id.clone())
                    } else {
                        RegistryEvent::Disabled(record.id.clone())
                    });
                }
            }
        }
    }
    events
}

fn prompt_yes_no(question: &str) -> std::io::Result<bool> {
    let mut stderr = std::io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer)? == 0 {
        warn!("no answer on stdin, treating as no");
        return Ok(false);
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
