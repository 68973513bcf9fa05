//! Control panel state sync against the simulated session.

use std::time::Duration;

use qualshift_core::config::PanelConfig;
use qualshift_core::panel::{PanelController, StatusKind};
use qualshift_sim::SimHarness;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=abc123";

#[tokio::test(start_paused = true)]
async fn test_panel_opens_with_player_state() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;

    let state = panel.state();
    assert!(state.controls_enabled);
    assert_eq!(state.current.as_ref().unwrap().id.as_str(), "hd1080");
    assert_eq!(state.available.len(), 3);
    assert_eq!(state.slider_percent, 100.0);
    assert!(state.highest_selected);
    assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Success);

    panel.close();
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_page_disables_controls() {
    let harness = SimHarness::with_levels(&["auto", "hd1080"], "hd1080");

    let panel = PanelController::open(
        harness.relay.clone(),
        "https://example.com/feed",
        PanelConfig::default(),
    )
    .await;

    let state = panel.state();
    assert!(!state.controls_enabled);
    assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Warning);
}

#[tokio::test(start_paused = true)]
async fn test_poll_applies_external_change() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;

    // Quality changes outside the panel, e.g. via a keyboard shortcut.
    harness.player.force_current("medium");
    tokio::time::sleep(Duration::from_millis(1600)).await;

    let state = panel.state();
    assert_eq!(state.current.as_ref().unwrap().id.as_str(), "medium");
    assert_eq!(state.slider_percent, 0.0);
    assert!(state.lowest_selected);

    panel.close();
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_poll_keeps_drag_protection() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;

    // User starts dragging toward the middle of the range.
    panel.slider_moved(50.0);
    let state = panel.state();
    assert!(state.slider_dirty);
    assert_eq!(state.preview.as_ref().unwrap().id.as_str(), "hd720");

    // Polls with an unchanged level must not fight the drag.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(panel.state().slider_dirty);

    panel.close();
}

#[tokio::test(start_paused = true)]
async fn test_slider_release_applies_mapped_level() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;

    panel.slider_released(0.0).await;

    assert_eq!(harness.player.current().unwrap().as_str(), "medium");
    let state = panel.state();
    assert_eq!(state.current.as_ref().unwrap().id.as_str(), "medium");
    assert!(state.lowest_selected);
    assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Success);

    panel.close();
}

#[tokio::test(start_paused = true)]
async fn test_radio_jumps_through_relay() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "medium");

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;

    panel.select_highest().await;
    assert_eq!(harness.player.current().unwrap().as_str(), "hd1080");
    assert!(panel.state().highest_selected);

    panel.select_lowest().await;
    assert_eq!(harness.player.current().unwrap().as_str(), "medium");
    assert!(panel.state().lowest_selected);

    panel.close();
}

#[tokio::test(start_paused = true)]
async fn test_initial_query_failure_disables_controls() {
    let harness = SimHarness::builder().without_page_controls().build();

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;

    let state = panel.state();
    assert!(!state.controls_enabled);
    assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Error);

    panel.close();
}

#[tokio::test(start_paused = true)]
async fn test_poll_stops_on_close() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd1080");

    let panel =
        PanelController::open(harness.relay.clone(), WATCH_URL, PanelConfig::default()).await;
    panel.close();

    harness.player.force_current("hd720");
    tokio::time::sleep(Duration::from_secs(3)).await;

    // The panel never saw the change: polling ended with the close.
    assert_eq!(panel.state().current.as_ref().unwrap().id.as_str(), "hd1080");
}
