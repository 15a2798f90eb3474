// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for extmgr.
//!
//! Provides a mock registry adapter and record fixtures for fast,
//! deterministic tests without a real host.
//!
//! # Components
//!
//! - [`MockRegistry`] - Scriptable registry with failure injection, call
//!   capture, and event emission
//! - [`fixtures`] - Builders for raw registry records

pub mod fixtures;
pub mod mock_registry;

pub use mock_registry::{MockCall, MockRegistry};
