// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering of the popup body.
//!
//! `--json` prints a [`ListResponse`] for scripting. Otherwise the body is
//! printed as text, with colors unless `--plain` is passed or stdout is not
//! a TTY.

use std::io::IsTerminal;

use extmgr_core::types::ExtensionDescriptor;
use extmgr_sync::messages::{self, MessageCatalog};
use extmgr_sync::view::{ExtensionRow, IconSource, PopupBody};
use extmgr_sync::{Phase, SyncSnapshot};
use serde::Serialize;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub json: bool,
    pub use_color: bool,
}

impl OutputOptions {
    pub fn detect(json: bool, plain: bool) -> Self {
        Self {
            json,
            use_color: !plain && std::io::stdout().is_terminal(),
        }
    }
}

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub phase: Phase,
    pub extensions: Vec<ExtensionDescriptor>,
    pub error: Option<String>,
}

impl ListResponse {
    pub fn from_snapshot(snapshot: &SyncSnapshot, catalog: &dyn MessageCatalog) -> Self {
        Self {
            phase: snapshot.phase,
            extensions: snapshot.extensions.clone(),
            error: snapshot
                .last_error
                .as_ref()
                .map(|e| messages::error_text(e, catalog)),
        }
    }
}

/// Print a snapshot in the selected format.
pub fn print_snapshot(
    snapshot: &SyncSnapshot,
    body: &PopupBody,
    catalog: &dyn MessageCatalog,
    options: OutputOptions,
) {
    if options.json {
        let response = ListResponse::from_snapshot(snapshot, catalog);
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print!("{}", render_text(body, options.use_color));
    }
}

/// Text form of the popup body.
pub fn render_text(body: &PopupBody, use_color: bool) -> String {
    let mut out = String::new();
    out.push('\n');
    match body {
        PopupBody::Loading { label } => {
            out.push_str(&format!("  {label}\n"));
        }
        PopupBody::Failed {
            message,
            retry_label,
        } => {
            out.push_str(&format!("  {}\n", error_line(message, use_color)));
            out.push_str(&format!("  ({retry_label}: extmgr list)\n"));
        }
        PopupBody::Empty { message } => {
            out.push_str(&format!("  {message}\n"));
        }
        PopupBody::List { banner, rows } => {
            if let Some(banner) = banner {
                out.push_str(&format!("  {}\n", error_line(banner, use_color)));
                out.push_str(&format!("  {}\n", "-".repeat(40)));
            }
            for row in rows {
                out.push_str(&format!("  {}\n", row_line(row, use_color)));
            }
        }
    }
    out.push('\n');
    out
}

fn error_line(message: &str, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "✗".red(), message.red())
    } else {
        format!("[FAIL] {message}")
    }
}

fn row_line(row: &ExtensionRow, use_color: bool) -> String {
    let icon = match &row.icon {
        IconSource::Url(_) => "",
        IconSource::Fallback => " (no icon)",
    };
    if use_color {
        use colored::Colorize;
        let state = if row.enabled {
            "on ".green()
        } else {
            "off".dimmed()
        };
        format!("[{state}] {}  {}{icon}", row.name.bold(), row.id.as_str().dimmed())
    } else {
        let state = if row.enabled { "on " } else { "off" };
        format!("[{state}] {}  {}{icon}", row.name, row.id)
    }
}
