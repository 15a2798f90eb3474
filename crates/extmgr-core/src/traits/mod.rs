// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions at the host boundary.
//!
//! The registry adapter uses `#[async_trait]` for dynamic dispatch
//! compatibility, so the controller can hold `Arc<dyn RegistryAdapter>`.

pub mod registry;

pub use registry::{broadcast_event_stream, EventStream, RegistryAdapter};
