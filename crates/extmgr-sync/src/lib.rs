// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension state synchronization for extmgr.
//!
//! [`SyncController`] keeps an ordered cache of manageable extensions in step
//! with a [`RegistryAdapter`](extmgr_core::RegistryAdapter): a full fetch on
//! activation, in-place patches for enabled/disabled notifications, full
//! refreshes for installs and removals, and a deferred resync after a failed
//! toggle. The [`view`] module turns controller snapshots into popup content.

pub mod classify;
pub mod collation;
pub mod controller;
pub mod error;
pub mod messages;
pub mod policy;
pub mod subscription;
pub mod view;

pub use classify::{CancellationMatcher, UninstallFailure};
pub use controller::{
    CommandOutcome, Phase, SyncController, SyncOptions, SyncSnapshot, SyncStats,
};
pub use error::{CommandAction, SyncError};
pub use messages::{EnglishCatalog, Message, MessageCatalog, MessageKey};
pub use policy::{FilterPolicy, build_cache};
pub use subscription::SubscriptionHandle;
pub use view::{ContextMenu, PopupBody, PopupView};
