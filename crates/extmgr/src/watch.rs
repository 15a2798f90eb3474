// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile file watcher.
//!
//! Watches the directory holding the profile (writes replace the file, so the
//! file itself cannot be watched) and reloads the registry whenever the
//! profile changes. Reloading diffs against the last known contents and emits
//! the matching registry notifications. Bursts of events (write then rename)
//! are collapsed by `notify-debouncer-mini`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use extmgr_core::ExtmgrError;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::profile::ProfileRegistry;

/// Bursts of file events closer together than this become one reload.
const DEBOUNCE: Duration = Duration::from_millis(50);

/// Running watcher. Dropping it stops file notifications.
pub struct ProfileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    task: JoinHandle<()>,
}

impl ProfileWatcher {
    /// Start watching `registry`'s profile until `shutdown` is cancelled.
    pub fn spawn(
        registry: Arc<ProfileRegistry>,
        shutdown: CancellationToken,
    ) -> Result<Self, ExtmgrError> {
        let profile = registry.path().to_path_buf();
        let dir = watch_dir(&profile);
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let target = profile.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
            Ok(events) => {
                if events.iter().any(|e| touches(&e.path, &target)) {
                    let _ = tx.send(());
                }
            }
            Err(e) => warn!(error = %e, "profile watch error"),
        })
        .map_err(|e| ExtmgrError::Internal(format!("failed to create file watcher: {e}")))?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| ExtmgrError::Internal(format!("failed to watch {}: {e}", dir.display())))?;
        info!(path = %profile.display(), "watching profile for changes");

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = rx.recv() => {
                        if changed.is_none() {
                            break;
                        }
                        while rx.try_recv().is_ok() {}
                        match registry.reload().await {
                            Ok(events) => debug!(count = events.len(), "profile reloaded"),
                            Err(e) => warn!(error = %e, "failed to reload profile"),
                        }
                    }
                }
            }
            debug!("profile watcher stopped");
        });

        Ok(Self {
            _debouncer: debouncer,
            task,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn watch_dir(profile: &Path) -> PathBuf {
    match profile.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether a changed path is the profile itself.
fn touches(changed: &Path, profile: &Path) -> bool {
    changed.file_name() == profile.file_name()
}
