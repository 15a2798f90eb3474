// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `extmgr` command-line popup.
//!
//! Runs the extension sync controller over a file-backed registry profile
//! and renders the popup body to the terminal.

pub mod commands;
pub mod output;
pub mod profile;
pub mod shutdown;
pub mod watch;

pub use commands::{Action, Session};
pub use output::OutputOptions;
pub use profile::{ConfirmMode, ProfileRegistry};
