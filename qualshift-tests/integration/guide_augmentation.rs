//! Shortcut-guide augmentation against the simulated dialog markup.

use std::sync::Arc;
use std::time::Duration;

use qualshift_core::config::GuideConfig;
use qualshift_core::guide::{DialogSurface, GuideAugmenter};
use qualshift_core::session::PageSession;
use qualshift_sim::SimDialog;

fn augmenter(
    dialog: &Arc<SimDialog>,
    session: &Arc<PageSession>,
    config: GuideConfig,
) -> GuideAugmenter {
    GuideAugmenter::new(
        Arc::clone(dialog) as Arc<dyn DialogSurface>,
        Arc::clone(session),
        config,
    )
}

#[tokio::test(start_paused = true)]
async fn test_rows_spliced_when_dialog_shown() {
    let dialog = Arc::new(SimDialog::new());
    let session = Arc::new(PageSession::new());
    let config = GuideConfig::default();

    let task = augmenter(&dialog, &session, config.clone()).spawn();

    // The container does not exist yet; the augmenter polls for it.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let container = dialog.open_popup_container();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    // The host builds the dialog hidden, then shows it.
    let node = dialog.insert_shortcut_dialog(container);
    dialog.add_section(node, "General", "Toggle play", "k");
    dialog.set_dialog_visible(node, true);

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("augmenter finished")
        .unwrap();

    assert!(session.guide_augmented());
    assert_eq!(
        dialog.rows_titled(&config.guide_title),
        vec![
            ("Quality down".to_string(), "Ctrl + Shift + 1".to_string()),
            ("Quality up".to_string(), "Ctrl + Shift + 2".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reopened_dialog_not_duplicated() {
    let dialog = Arc::new(SimDialog::new());
    let session = Arc::new(PageSession::new());
    let config = GuideConfig::default();

    let container = dialog.open_popup_container();
    let node = dialog.insert_shortcut_dialog(container);
    dialog.add_section(node, "General", "Toggle play", "k");
    dialog.set_dialog_visible(node, true);

    let task = augmenter(&dialog, &session, config.clone()).spawn();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("augmenter finished")
        .unwrap();
    assert_eq!(dialog.rows_titled(&config.guide_title).len(), 2);

    // Dialog closes and reopens; a fresh watch must not splice again.
    dialog.set_dialog_visible(node, false);
    dialog.set_dialog_visible(node, true);

    let task = augmenter(&dialog, &session, config.clone()).spawn();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("augmenter finished")
        .unwrap();

    assert_eq!(dialog.rows_titled(&config.guide_title).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_section_aborts_and_allows_retry() {
    let dialog = Arc::new(SimDialog::new());
    let session = Arc::new(PageSession::new());
    let config = GuideConfig::default();

    let container = dialog.open_popup_container();
    let node = dialog.insert_shortcut_dialog(container);
    // No section matches the configured title.
    dialog.add_section(node, "Playback", "Toggle play", "k");
    dialog.set_dialog_visible(node, true);

    let task = augmenter(&dialog, &session, config.clone()).spawn();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("augmenter finished")
        .unwrap();

    // Aborted silently and released the one-shot slot for a retry.
    assert!(!session.guide_augmented());
    assert!(dialog.rows_titled(&config.guide_title).is_empty());

    // The host markup gains the expected section; a retry succeeds.
    dialog.add_section(node, "General", "Toggle play", "k");
    let task = augmenter(&dialog, &session, config.clone()).spawn();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("augmenter finished")
        .unwrap();

    assert!(session.guide_augmented());
    assert_eq!(dialog.rows_titled(&config.guide_title).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_watch_per_session() {
    let dialog = Arc::new(SimDialog::new());
    let session = Arc::new(PageSession::new());
    let config = GuideConfig::default();

    // First watch blocks polling for a container that never appears.
    let first = augmenter(&dialog, &session, config.clone()).spawn();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // A second watch gives up immediately: the slot is taken.
    let second = augmenter(&dialog, &session, config).spawn();
    tokio::time::timeout(Duration::from_secs(5), second)
        .await
        .expect("second augmenter returned")
        .unwrap();

    first.abort();
}
