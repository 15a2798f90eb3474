// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locale-aware name ordering.
//!
//! Compares display names the way a user expects a sorted list to read:
//! base letters first, then accents, then case (lowercase before uppercase),
//! and finally the raw code points so the order is total and deterministic.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Compare two display names under the collation described in the module docs.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(&tertiary_key(b)))
        .then_with(|| a.cmp(b))
}

/// Base letters only: compatibility-decomposed, marks stripped, case-folded.
fn primary_key(s: &str) -> Vec<char> {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Base letters plus accents, case-folded.
fn secondary_key(s: &str) -> Vec<char> {
    s.nfkd().flat_map(char::to_lowercase).collect()
}

/// Case pattern of the base letters: `false` (lowercase) sorts first.
fn tertiary_key(s: &str) -> Vec<bool> {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(char::is_uppercase)
        .collect()
}
