// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of uninstall failures.
//!
//! Hosts report a dismissed confirmation dialog as an ordinary failure. All
//! of the guesswork about which failures are really cancellations lives in
//! [`CancellationMatcher::classify`], so a typed host signal can replace the
//! keyword match without touching the controller.

use extmgr_core::ExtmgrError;

/// How an uninstall failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallFailure {
    /// The user dismissed the dialog. Not an error.
    Cancelled,
    /// A genuine failure to report.
    Failed,
}

/// Keyword matcher for cancellation messages.
#[derive(Debug, Clone)]
pub struct CancellationMatcher {
    keywords: Vec<String>,
}

impl CancellationMatcher {
    /// Build a matcher from keywords; blanks are dropped and matching is
    /// case-insensitive.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether free text from the host reads as a user cancellation.
    pub fn is_cancellation(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.keywords.iter().any(|k| message.contains(k.as_str()))
    }

    /// Classify an uninstall failure.
    ///
    /// Keywords are only matched against host-supplied text. Locally built
    /// errors (i/o, missing ids, missing capabilities) are always failures.
    pub fn classify(&self, error: &ExtmgrError) -> UninstallFailure {
        match error {
            ExtmgrError::UserCancelled { .. } => UninstallFailure::Cancelled,
            ExtmgrError::Registry { message, .. } if self.is_cancellation(message) => {
                UninstallFailure::Cancelled
            }
            _ => UninstallFailure::Failed,
        }
    }
}

impl Default for CancellationMatcher {
    fn default() -> Self {
        Self::new(["cancel", "user"])
    }
}
