// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering, projection, and ordering of raw registry records into the cache.

use std::collections::HashSet;

use extmgr_core::types::{
    ExtensionDescriptor, ExtensionId, ExtensionType, InstallType, RawExtensionRecord,
};
use tracing::debug;

use crate::collation::locale_cmp;

/// Decides which registry records are manageable from the popup.
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    /// The running component's own id, hidden from the list.
    pub self_id: Option<ExtensionId>,
}

impl FilterPolicy {
    pub fn new(self_id: Option<ExtensionId>) -> Self {
        Self { self_id }
    }

    /// Whether `record` belongs in the cache.
    ///
    /// Rejects the running component, host built-ins, and installs the
    /// registry marks as unmanageable (`installType == other`).
    pub fn admits(&self, record: &RawExtensionRecord) -> bool {
        if self.self_id.as_ref() == Some(&record.id) {
            return false;
        }
        if record.kind == ExtensionType::Builtin {
            return false;
        }
        record.install_type != InstallType::Other
    }
}

/// Map a raw record to a descriptor.
///
/// Icons arrive in ascending size order; the last one is used.
pub fn project(record: RawExtensionRecord) -> ExtensionDescriptor {
    let icon_url = record.icons.into_iter().last().map(|icon| icon.url);
    ExtensionDescriptor {
        id: record.id,
        name: record.name,
        enabled: record.enabled,
        icon_url,
    }
}

/// Build a full cache from one bulk query result.
///
/// The output is filtered, deduplicated by id (first occurrence wins), and
/// sorted ascending by name. The sort is stable, so records with identical
/// names keep registry order and the result is deterministic for a given
/// input.
pub fn build_cache(
    records: Vec<RawExtensionRecord>,
    policy: &FilterPolicy,
) -> Vec<ExtensionDescriptor> {
    let total = records.len();
    let mut seen = HashSet::new();
    let mut cache: Vec<ExtensionDescriptor> = records
        .into_iter()
        .filter(|record| policy.admits(record))
        .filter(|record| seen.insert(record.id.clone()))
        .map(project)
        .collect();
    cache.sort_by(|a, b| locale_cmp(&a.name, &b.name));
    debug!(total, kept = cache.len(), "built extension cache");
    cache
}
