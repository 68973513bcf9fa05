//! End-to-end relay tests: command source to simulated player and back.

use qualshift_core::quality::QualityLevel;
use qualshift_core::relay::RelayError;
use qualshift_sim::SimHarness;

#[tokio::test(start_paused = true)]
async fn test_step_down_moves_toward_lower() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    let confirmed = harness.relay.decrease_quality().await.unwrap();

    assert_eq!(confirmed.unwrap().id.as_str(), "hd720");
    assert_eq!(harness.player.current().unwrap().as_str(), "hd720");
}

#[tokio::test(start_paused = true)]
async fn test_step_up_at_top_is_noop_with_feedback() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    let confirmed = harness.relay.increase_quality().await.unwrap();

    // Saturating walk: already at the top, level unchanged.
    assert_eq!(confirmed.unwrap().id.as_str(), "hd1080");
    assert!(harness.player.set_calls().is_empty());

    // The boundary no-op still shows the indicator.
    assert_eq!(harness.indicator.shown_labels(), vec!["1080p".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_step_down_at_bottom_is_noop_with_feedback() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "medium");

    let confirmed = harness.relay.decrease_quality().await.unwrap();

    assert_eq!(confirmed.unwrap().id.as_str(), "medium");
    assert!(harness.player.set_calls().is_empty());
    assert_eq!(harness.indicator.shown_labels(), vec!["360p".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_jumps_reach_list_ends() {
    let harness = SimHarness::with_levels(&["auto", "hd2160", "hd1080", "hd720"], "hd1080");

    let confirmed = harness.relay.lowest_quality().await.unwrap();
    assert_eq!(confirmed.unwrap().id.as_str(), "hd720");

    let confirmed = harness.relay.highest_quality().await.unwrap();
    assert_eq!(confirmed.unwrap().id.as_str(), "hd2160");
    assert_eq!(harness.player.current().unwrap().as_str(), "hd2160");
}

#[tokio::test(start_paused = true)]
async fn test_set_specific_unavailable_is_silent() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd1080");

    harness
        .relay
        .set_specific_quality(QualityLevel::from("hd2160"))
        .await
        .unwrap();

    // Unknown level: no mutation and no feedback.
    assert!(harness.player.set_calls().is_empty());
    assert!(harness.indicator.events().is_empty());
    assert_eq!(harness.player.current().unwrap().as_str(), "hd1080");
}

#[tokio::test(start_paused = true)]
async fn test_auto_sentinel_never_a_target() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd1080");

    harness
        .relay
        .set_specific_quality(QualityLevel::from("auto"))
        .await
        .unwrap();

    assert!(harness.player.set_calls().is_empty());
    assert!(harness.indicator.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sentinel_only_offering_is_inert() {
    let harness = SimHarness::with_levels(&["auto"], "auto");

    harness.relay.decrease_quality().await.unwrap();
    harness.relay.increase_quality().await.unwrap();
    harness.relay.highest_quality().await.unwrap();

    assert!(harness.player.set_calls().is_empty());
    assert!(harness.indicator.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_quality_info_reports_raw_offering() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd720");

    let report = harness.relay.quality_info().await.unwrap();

    assert_eq!(report.current.unwrap().id.as_str(), "hd720");
    // The report carries the raw offering, sentinel included; consumers
    // decide what is selectable.
    let ids: Vec<&str> = report.available.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["auto", "hd1080", "hd720"]);
}

#[tokio::test(start_paused = true)]
async fn test_page_controls_install_once() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd1080");

    for _ in 0..5 {
        harness.relay.decrease_quality().await.unwrap();
    }
    harness.relay.quality_info().await.unwrap();

    assert_eq!(harness.install_count(), 1);
    assert!(harness.session.controls_installed());
}

#[tokio::test(start_paused = true)]
async fn test_install_failure_rejects_commands() {
    let harness = SimHarness::builder().failing_install().build();

    let result = harness.relay.decrease_quality().await;
    assert!(matches!(result, Err(RelayError::InstallFailed { .. })));
    assert!(!harness.session.controls_installed());
}

#[tokio::test(start_paused = true)]
async fn test_query_times_out_without_page_side() {
    let harness = SimHarness::builder().without_page_controls().build();

    let result = harness.relay.quality_info().await;
    assert!(matches!(result, Err(RelayError::QueryTimeout)));

    // A mutation still succeeds: the command is fire-and-forget and the
    // missing confirmation is not an error.
    let confirmed = harness.relay.decrease_quality().await.unwrap();
    assert_eq!(confirmed, None);
}

#[tokio::test(start_paused = true)]
async fn test_player_teardown_and_return() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd1080");

    harness.relay.decrease_quality().await.unwrap();
    assert_eq!(harness.player.current().unwrap().as_str(), "hd720");

    // Host replaces the page; the player element disappears.
    harness.elements.remove("movie_player");
    let confirmed = harness.relay.decrease_quality().await.unwrap();
    assert_eq!(confirmed, None);
    assert_eq!(harness.player.current().unwrap().as_str(), "hd720");

    // It comes back; commands work again without reinstallation.
    harness
        .elements
        .register("movie_player", harness.player.clone());
    let confirmed = harness.relay.decrease_quality().await.unwrap();
    assert!(confirmed.is_some());
    assert_eq!(harness.install_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_offering_shrinks_between_commands() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720", "medium"], "hd1080");

    // The host withdraws hd720 before the next step down.
    harness
        .player
        .set_available(qualshift_sim::quality_levels(&["auto", "hd1080", "medium"]));

    harness.relay.decrease_quality().await.unwrap();
    assert_eq!(harness.player.current().unwrap().as_str(), "medium");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_queries_use_distinct_waiters() {
    let harness = SimHarness::with_levels(&["auto", "hd1080", "hd720"], "hd720");

    let (first, second) =
        tokio::join!(harness.relay.quality_info(), harness.relay.quality_info());

    assert_eq!(first.unwrap().current.unwrap().id.as_str(), "hd720");
    assert_eq!(second.unwrap().current.unwrap().id.as_str(), "hd720");
}
