// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration failures as miette diagnostics.
//!
//! Figment records which file a bad key or value came from. The helpers here
//! find that key again in the TOML text so the report can underline it, and
//! offer the closest known key name when an unknown one looks like a typo.

#![allow(unused_assignments)] // emitted by the `Diagnostic` derive

use figment::error::{Error as FigmentError, Kind};
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Unknown keys scoring below this against every known key get no suggestion.
const MIN_SIMILARITY: f64 = 0.75;

/// TOML documents that fed a figment, as `(display path, contents)`.
pub type TomlSources = [(String, String)];

/// One problem with the loaded configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` is not a recognized setting")]
    #[diagnostic(
        code(extmgr::config::unknown_key),
        help("{}", known_keys_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest known key, if any is similar enough.
        suggestion: Option<String>,
        /// Keys accepted in the same table.
        valid_keys: Vec<String>,
        #[label("unrecognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(extmgr::config::invalid_type), help("use {expected} here"))]
    InvalidType {
        /// Dotted path, e.g. `sync.resync_delay_ms`.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` must be set")]
    #[diagnostic(
        code(extmgr::config::missing_key),
        help("set `{key}` in extmgr.toml or through an EXTMGR_ variable")
    )]
    MissingKey { key: String },

    /// A value that parsed but is out of range or malformed.
    #[error("{message}")]
    #[diagnostic(code(extmgr::config::validation))]
    Validation { message: String },

    #[error("{0}")]
    #[diagnostic(code(extmgr::config::other))]
    Other(String),
}

fn known_keys_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let known = valid_keys.join(", ");
    match suggestion {
        Some(closest) => format!("did you mean `{closest}`? known keys: {known}"),
        None => format!("known keys: {known}"),
    }
}

/// Split a figment error into one diagnostic per underlying failure.
pub fn from_figment(err: FigmentError, sources: &TomlSources) -> Vec<ConfigError> {
    err.into_iter().map(|e| convert(&e, sources)).collect()
}

fn convert(error: &FigmentError, sources: &TomlSources) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(key, expected) => {
            // The path stops at the table holding the unknown key.
            let (span, src) = locate(error, &error.path, key, sources);
            ConfigError::UnknownKey {
                key: key.clone(),
                suggestion: closest_key(key, expected.iter().copied()),
                valid_keys: expected.iter().map(|k| (*k).to_string()).collect(),
                span,
                src,
            }
        }
        Kind::MissingField(key) => ConfigError::MissingKey {
            key: key.to_string(),
        },
        Kind::InvalidType(found, expected) => {
            let (span, src) = match error.path.split_last() {
                Some((field, table)) => locate(error, table, field, sources),
                None => (None, None),
            };
            ConfigError::InvalidType {
                key: error.path.join("."),
                found: found.to_string(),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Span of `key` inside `table` in whichever source file the error names.
fn locate(
    error: &FigmentError,
    table: &[String],
    key: &str,
    sources: &TomlSources,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(file)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let file = file.display().to_string();

    sources
        .iter()
        .find(|(path, _)| *path == file)
        .and_then(|(path, content)| {
            let start = key_offset(content, table, key)?;
            Some((
                SourceSpan::new(start.into(), key.len()),
                NamedSource::new(path, content.clone()),
            ))
        })
        .map_or((None, None), |(span, src)| (Some(span), Some(src)))
}

/// Byte offset where `key` is assigned inside `table`.
///
/// An empty `table` means the top level, before any header. Nested tables
/// match on their dotted header, e.g. `["a", "b"]` for `[a.b]`.
pub fn key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
        } else if current == wanted && assigns(trimmed, key) {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

fn assigns(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// The known key most similar to `unknown` by Jaro-Winkler score.
pub fn closest_key<'a>(
    unknown: &str,
    known: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    known
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), candidate))
        .filter(|(score, _)| *score >= MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Render every error with miette's graphical handler.
pub fn render_to_string(errors: &[ConfigError]) -> String {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        if handler.render_report(&mut out, error as &dyn Diagnostic).is_err() {
            out.push_str(&format!("Error: {error}\n"));
        }
    }
    out
}

/// Print [`render_to_string`] to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_to_string(errors));
}
