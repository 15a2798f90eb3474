// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controller behavior against the mock registry: refresh, notifications,
//! commands, and deferred resynchronization.

use std::sync::Arc;
use std::time::Duration;

use extmgr_core::ExtmgrError;
use extmgr_core::types::{
    Capability, EventKind, ExtensionId, RegistryCapabilities, RegistryEvent, UninstallOptions,
};
use extmgr_sync::view::{MenuSize, Point, Viewport};
use extmgr_sync::{
    CommandAction, CommandOutcome, EnglishCatalog, Phase, PopupBody, PopupView, SyncController,
    SyncError, SyncOptions,
};
use extmgr_test_utils::fixtures::{builtin, record, unmanaged, with_icons};
use extmgr_test_utils::{MockCall, MockRegistry};

const WAIT: Duration = Duration::from_secs(5);

fn id(s: &str) -> ExtensionId {
    ExtensionId::from(s)
}

/// The three-record registry used by most scenarios.
fn scenario_registry() -> MockRegistry {
    MockRegistry::with_records(vec![
        record("a", "Zed", true),
        record("b", "Acme", false),
        record("self", "Extension Manager", true),
    ])
    .with_self_id("self")
}

fn controller_for(registry: &Arc<MockRegistry>) -> SyncController {
    SyncController::with_registry(registry.clone(), SyncOptions::default())
}

fn names(controller: &SyncController) -> Vec<String> {
    controller
        .snapshot()
        .extensions
        .iter()
        .map(|d| d.name.clone())
        .collect()
}

/// Let background tasks run until `done` holds.
async fn settle(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !done() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}

#[tokio::test]
async fn activation_builds_filtered_sorted_cache() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);

    assert_eq!(controller.activate().await, Phase::Ready);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert!(snapshot.last_error.is_none());
    let listed: Vec<(&str, bool)> = snapshot
        .extensions
        .iter()
        .map(|d| (d.name.as_str(), d.enabled))
        .collect();
    assert_eq!(listed, vec![("Acme", false), ("Zed", true)]);
}

#[tokio::test]
async fn builtins_and_unmanageable_installs_never_listed() {
    let registry = Arc::new(MockRegistry::with_records(vec![
        builtin("pdf", "Chrome PDF Viewer"),
        unmanaged("ext", "Externally Pushed"),
        with_icons(record("c", "Color Picker", true), &[(16, "c16.png"), (48, "c48.png")]),
    ]));
    let controller = controller_for(&registry);
    controller.refresh().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.extensions.len(), 1);
    assert_eq!(snapshot.extensions[0].icon_url.as_deref(), Some("c48.png"));
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);

    controller.refresh().await;
    let first = controller.snapshot();
    controller.refresh().await;
    assert_eq!(controller.snapshot(), first);
    assert_eq!(registry.query_count(), 2);
}

#[tokio::test]
async fn collation_ignores_case_and_accents() {
    let registry = Arc::new(MockRegistry::with_records(vec![
        record("1", "zebra", true),
        record("2", "Émoji Keyboard", true),
        record("3", "apple", true),
        record("4", "Banana", true),
    ]));
    let controller = controller_for(&registry);
    controller.refresh().await;
    assert_eq!(
        names(&controller),
        vec!["apple", "Banana", "Émoji Keyboard", "zebra"]
    );
}

#[tokio::test]
async fn missing_management_capability_fails_without_querying() {
    let registry = Arc::new(scenario_registry().with_capabilities(RegistryCapabilities {
        query_all: false,
        ..RegistryCapabilities::full()
    }));
    let controller = controller_for(&registry);

    assert_eq!(controller.activate().await, Phase::Error);

    let snapshot = controller.snapshot();
    assert_eq!(
        snapshot.last_error,
        Some(SyncError::CapabilityUnavailable {
            capability: Capability::QueryAll
        })
    );
    assert_eq!(registry.query_count(), 0);
}

#[tokio::test]
async fn missing_registry_renders_api_unavailable_with_retry() {
    let controller = SyncController::new(None, SyncOptions::default());
    assert_eq!(controller.activate().await, Phase::Error);
    assert!(!controller.is_subscribed());

    let view = PopupView::new(controller, Arc::new(EnglishCatalog), MenuSize::default());
    assert_eq!(
        view.body(),
        PopupBody::Failed {
            message: "Extension API is not available".to_string(),
            retry_label: "Retry".to_string(),
        }
    );
}

#[tokio::test]
async fn query_failure_keeps_previous_cache() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;
    let before = controller.snapshot().extensions;

    registry
        .fail_next_query(ExtmgrError::registry("profile locked"))
        .await;
    assert_eq!(controller.refresh().await, Phase::Error);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.extensions, before);
    assert!(matches!(
        snapshot.last_error,
        Some(SyncError::QueryFailed { .. })
    ));

    // Retry recovers and clears the error.
    assert_eq!(controller.refresh().await, Phase::Ready);
    assert!(controller.snapshot().last_error.is_none());
}

#[tokio::test]
async fn enabled_notification_patches_only_matching_descriptor() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;
    let before = controller.snapshot().extensions;

    registry.emit(RegistryEvent::Enabled(id("b")));
    assert!(
        controller
            .wait_until(WAIT, |s| s.find(&id("b")).is_some_and(|d| d.enabled))
            .await
    );

    let after = controller.snapshot().extensions;
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        if old.id == id("b") {
            assert_eq!(new.id, old.id);
            assert_eq!(new.name, old.name);
            assert_eq!(new.icon_url, old.icon_url);
            assert!(new.enabled);
        } else {
            assert_eq!(new, old);
        }
    }
    // No refresh was needed for a patch.
    assert_eq!(registry.query_count(), 1);
}

#[tokio::test]
async fn unknown_and_duplicate_notifications_are_no_ops() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;
    let before = controller.snapshot();

    registry.emit(RegistryEvent::Disabled(id("nope")));
    registry.emit(RegistryEvent::Enabled(id("a")));
    registry.emit(RegistryEvent::Enabled(id("a")));
    settle(|| controller.stats().events_handled == 3).await;

    assert_eq!(controller.snapshot(), before);
}

#[tokio::test]
async fn install_notification_triggers_full_refresh() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;

    registry.install(record("c", "Beta", true)).await;

    assert!(
        controller
            .wait_until(WAIT, |s| s.phase == Phase::Ready && s.extensions.len() == 3)
            .await
    );
    assert_eq!(names(&controller), vec!["Acme", "Beta", "Zed"]);
    assert_eq!(registry.query_count(), 2);
}

#[tokio::test]
async fn uninstalled_notification_without_id_still_refreshes() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;

    registry
        .set_records(vec![record("a", "Zed", true), record("self", "Extension Manager", true)])
        .await;
    registry.emit(RegistryEvent::Uninstalled(None));

    assert!(
        controller
            .wait_until(WAIT, |s| s.phase == Phase::Ready && s.extensions.len() == 1)
            .await
    );
}

#[tokio::test]
async fn toggle_success_waits_for_notification() {
    let registry = Arc::new(scenario_registry().with_auto_events(false));
    let controller = controller_for(&registry);
    controller.activate().await;

    let outcome = controller.toggle(&id("b"), true).await;
    assert_eq!(outcome, CommandOutcome::Requested);
    // Nothing flips locally until the registry says so.
    assert!(!controller.snapshot().find(&id("b")).unwrap().enabled);

    registry.emit(RegistryEvent::Enabled(id("b")));
    assert!(
        controller
            .wait_until(WAIT, |s| s.find(&id("b")).is_some_and(|d| d.enabled))
            .await
    );
    assert_eq!(controller.stats().resyncs_scheduled, 0);
}

#[tokio::test]
async fn toggle_round_trip_through_host_events() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;

    controller.toggle(&id("a"), false).await;
    assert!(
        controller
            .wait_until(WAIT, |s| s.find(&id("a")).is_some_and(|d| !d.enabled))
            .await
    );
    assert_eq!(
        registry.calls().last(),
        Some(&MockCall::SetEnabled {
            id: id("a"),
            enabled: false
        })
    );
}

#[tokio::test(start_paused = true)]
async fn toggle_failure_records_error_and_resyncs_once() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry
        .fail_next_set_enabled(ExtmgrError::registry("Extension is managed by policy"))
        .await;
    let outcome = controller.toggle(&id("a"), false).await;

    let expected = SyncError::CommandFailed {
        action: CommandAction::Disable,
        name: "Zed".to_string(),
        reason: "registry error: Extension is managed by policy".to_string(),
    };
    assert_eq!(outcome, CommandOutcome::Failed(expected.clone()));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_eq!(snapshot.last_error, Some(expected));
    assert_eq!(controller.stats().resyncs_scheduled, 1);

    tokio::time::sleep(Duration::from_millis(499)).await;
    assert_eq!(registry.query_count(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    settle(|| controller.stats().refreshes_completed == 2).await;
    assert_eq!(registry.query_count(), 2);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(registry.query_count(), 2);
    // The resync starts a fresh refresh, which clears the banner.
    assert!(controller.snapshot().last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn toggle_failure_for_unlisted_id_names_the_id() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry
        .fail_next_set_enabled(ExtmgrError::NotFound(id("ghost")))
        .await;
    let outcome = controller.toggle(&id("ghost"), true).await;
    match outcome {
        CommandOutcome::Failed(SyncError::CommandFailed { action, name, .. }) => {
            assert_eq!(action, CommandAction::Enable);
            assert_eq!(name, "ghost");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn resync_after_drop_does_nothing() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry
        .fail_next_set_enabled(ExtmgrError::registry("nope"))
        .await;
    controller.toggle(&id("a"), false).await;
    drop(controller);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(registry.query_count(), 1);
}

#[tokio::test]
async fn toggle_without_capability_does_not_call_registry() {
    let registry = Arc::new(scenario_registry().with_capabilities(RegistryCapabilities {
        set_enabled: false,
        ..RegistryCapabilities::full()
    }));
    let controller = controller_for(&registry);
    controller.refresh().await;

    let outcome = controller.toggle(&id("a"), false).await;
    assert_eq!(
        outcome,
        CommandOutcome::Failed(SyncError::CapabilityUnavailable {
            capability: Capability::SetEnabled
        })
    );
    assert!(
        !registry
            .calls()
            .iter()
            .any(|c| matches!(c, MockCall::SetEnabled { .. }))
    );
    assert_eq!(controller.stats().resyncs_scheduled, 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_uninstall_is_silent() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;
    let before = controller.snapshot();

    registry
        .fail_next_uninstall(ExtmgrError::registry("User cancelled the dialog"))
        .await;
    let outcome = controller.uninstall(&id("b"), "Acme").await;
    assert_eq!(outcome, CommandOutcome::Cancelled);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.snapshot(), before);
    assert_eq!(registry.query_count(), 1);
    assert_eq!(controller.stats().resyncs_scheduled, 0);
}

#[tokio::test]
async fn uninstall_asks_host_to_confirm() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;

    let outcome = controller.uninstall(&id("b"), "Acme").await;
    assert_eq!(outcome, CommandOutcome::Requested);
    assert!(registry.calls().contains(&MockCall::Uninstall {
        id: id("b"),
        options: UninstallOptions {
            show_confirm_dialog: true
        },
    }));

    assert!(
        controller
            .wait_until(WAIT, |s| s.phase == Phase::Ready && s.find(&id("b")).is_none())
            .await
    );
}

#[tokio::test(start_paused = true)]
async fn failed_uninstall_records_error_without_refresh() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry
        .fail_next_uninstall(ExtmgrError::registry("Extension is required by policy"))
        .await;
    let outcome = controller.uninstall(&id("b"), "Acme").await;
    assert!(matches!(
        outcome,
        CommandOutcome::Failed(SyncError::CommandFailed {
            action: CommandAction::Uninstall,
            ..
        })
    ));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(registry.query_count(), 1);
    let view = PopupView::new(controller, Arc::new(EnglishCatalog), MenuSize::default());
    match view.body() {
        PopupBody::List { banner, rows } => {
            assert_eq!(banner.as_deref(), Some("Failed to uninstall Acme"));
            assert_eq!(rows.len(), 2);
        }
        other => panic!("expected list with banner, got {other:?}"),
    }
}

#[tokio::test]
async fn command_start_clears_previous_error() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry
        .fail_next_uninstall(ExtmgrError::registry("blocked"))
        .await;
    controller.uninstall(&id("b"), "Acme").await;
    assert!(controller.snapshot().last_error.is_some());

    registry
        .fail_next_uninstall(ExtmgrError::UserCancelled {
            message: "dismissed".to_string(),
        })
        .await;
    controller.uninstall(&id("b"), "Acme").await;
    assert!(controller.snapshot().last_error.is_none());
}

#[tokio::test]
async fn commands_keep_list_failure_until_refresh() {
    let registry = Arc::new(scenario_registry().with_auto_events(false));
    let controller = controller_for(&registry);
    registry
        .fail_next_query(ExtmgrError::registry("profile locked"))
        .await;
    assert_eq!(controller.activate().await, Phase::Error);

    // A successful command must not leave `Error` without its cause.
    controller.uninstall(&id("b"), "Acme").await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Error);
    assert!(matches!(
        snapshot.last_error,
        Some(SyncError::QueryFailed { .. })
    ));

    // Nor may a failing one replace it with a command banner.
    registry
        .fail_next_uninstall(ExtmgrError::registry("blocked"))
        .await;
    controller.uninstall(&id("b"), "Acme").await;
    assert!(matches!(
        controller.snapshot().last_error,
        Some(SyncError::QueryFailed { .. })
    ));

    let view = PopupView::new(controller.clone(), Arc::new(EnglishCatalog), MenuSize::default());
    assert_eq!(
        view.body(),
        PopupBody::Failed {
            message: "Failed to load extensions".to_string(),
            retry_label: "Retry".to_string(),
        }
    );

    assert_eq!(controller.refresh().await, Phase::Ready);
    assert!(controller.snapshot().last_error.is_none());
}

#[tokio::test]
async fn local_uninstall_failure_under_user_path_is_reported() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry
        .fail_next_uninstall(ExtmgrError::Io {
            context: "parsing profile /Users/alice/Library/extensions.json".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::InvalidData),
        })
        .await;
    let outcome = controller.uninstall(&id("a"), "Zed").await;

    assert!(matches!(
        outcome,
        CommandOutcome::Failed(SyncError::CommandFailed {
            action: CommandAction::Uninstall,
            ref name,
            ..
        }) if name == "Zed"
    ));
    assert!(controller.snapshot().last_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn last_completed_refresh_wins() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.refresh().await;

    registry.delay_next_query(Duration::from_millis(100)).await;
    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    };
    settle(|| registry.query_count() == 2).await;

    registry.set_records(vec![record("n", "Newer", true)]).await;
    controller.refresh().await;
    assert_eq!(names(&controller), vec!["Newer"]);

    slow.await.expect("slow refresh task");
    assert_eq!(names(&controller), vec!["Acme", "Zed"]);
}

#[tokio::test]
async fn open_details_delegates_when_supported() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.open_details(&id("a"));
    assert_eq!(registry.opened(), vec![id("a")]);

    registry.set_capabilities(RegistryCapabilities {
        open_details: false,
        ..RegistryCapabilities::full()
    });
    controller.open_details(&id("b"));
    assert_eq!(registry.opened(), vec![id("a")]);
}

#[tokio::test]
async fn deactivate_closes_subscription() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;
    assert!(controller.is_subscribed());
    assert_eq!(registry.subscriber_count(), EventKind::ALL.len());

    controller.deactivate();
    assert!(!controller.is_subscribed());
    settle(|| registry.subscriber_count() == 0).await;

    registry.emit(RegistryEvent::Disabled(id("a")));
    tokio::task::yield_now().await;
    assert_eq!(controller.stats().events_handled, 0);
    assert!(controller.snapshot().find(&id("a")).unwrap().enabled);
}

#[tokio::test]
async fn subscribes_only_to_offered_notifications() {
    let registry = Arc::new(scenario_registry().with_capabilities(RegistryCapabilities {
        events: vec![EventKind::Enabled, EventKind::Disabled],
        ..RegistryCapabilities::full()
    }));
    let controller = controller_for(&registry);
    controller.activate().await;
    assert_eq!(registry.subscriber_count(), 2);
}

#[tokio::test]
async fn context_menu_survives_notifications_and_closes_on_action() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;
    let mut view = PopupView::new(controller.clone(), Arc::new(EnglishCatalog), MenuSize::default());
    let viewport = Viewport {
        width: 360.0,
        height: 480.0,
    };

    view.on_context_menu(&id("b"), Point::new(300.0, 470.0), viewport);
    assert_eq!(
        view.menu().target().map(|t| t.name.as_str()),
        Some("Acme")
    );

    registry.emit(RegistryEvent::Disabled(id("a")));
    assert!(
        controller
            .wait_until(WAIT, |s| s.find(&id("a")).is_some_and(|d| !d.enabled))
            .await
    );
    assert!(view.menu().is_open());

    let outcome = view.on_uninstall().await;
    assert_eq!(outcome, Some(CommandOutcome::Requested));
    assert!(!view.menu().is_open());
    assert_eq!(view.on_uninstall().await, None);
}

#[tokio::test]
async fn context_menu_details_action_and_outside_click() {
    let registry = Arc::new(scenario_registry());
    let controller = controller_for(&registry);
    controller.activate().await;
    let mut view = PopupView::new(controller, Arc::new(EnglishCatalog), MenuSize::default());
    let viewport = Viewport {
        width: 360.0,
        height: 480.0,
    };

    view.on_context_menu(&id("a"), Point::new(10.0, 10.0), viewport);
    view.on_outside_pointer();
    assert!(!view.menu().is_open());
    view.on_open_details();
    assert!(registry.opened().is_empty());

    view.on_context_menu(&id("a"), Point::new(10.0, 10.0), viewport);
    view.on_open_details();
    assert!(!view.menu().is_open());
    assert_eq!(registry.opened(), vec![id("a")]);
}

#[tokio::test]
async fn view_toggle_requests_opposite_state() {
    let registry = Arc::new(scenario_registry().with_auto_events(false));
    let controller = controller_for(&registry);
    controller.activate().await;
    let view = PopupView::new(controller, Arc::new(EnglishCatalog), MenuSize::default());

    assert_eq!(
        view.on_toggle(&id("b")).await,
        Some(CommandOutcome::Requested)
    );
    assert_eq!(
        registry.calls().last(),
        Some(&MockCall::SetEnabled {
            id: id("b"),
            enabled: true
        })
    );
    assert_eq!(view.on_toggle(&id("missing")).await, None);
}
