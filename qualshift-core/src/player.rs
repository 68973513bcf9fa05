//! Adapter seam over the host page's video player.
//!
//! The host player is an external collaborator reachable through a
//! well-known element identifier. The adapter re-resolves that handle on
//! every call rather than caching it: the host may replace the player
//! element at any time. A missing player degrades every accessor to an
//! empty or neutral result, never an error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::quality::{self, QualityInfo, QualityLevel};

/// Well-known identifier of the host player element.
pub const PLAYER_ELEMENT_ID: &str = "movie_player";

/// Capability surface exposed by the host player.
///
/// Mirrors the host's quality API: list offered levels (the auto sentinel
/// included), read the active level, and request a level change.
#[async_trait]
pub trait PlayerControls: Send + Sync {
    /// Raw offered levels in host-reported order, sentinel included.
    async fn available_quality_levels(&self) -> Vec<QualityLevel>;

    /// The level currently in effect, if the player reports one.
    async fn playback_quality(&self) -> Option<QualityLevel>;

    /// Requests a level change. Fire-and-forget on the host side.
    async fn set_playback_quality_range(&self, level: QualityLevel);
}

/// Resolves a player handle by element identifier.
///
/// Implementations look the element up fresh on every call; returning
/// `None` is the normal signal that no player is present right now.
pub trait PlayerLocator: Send + Sync {
    fn locate(&self, element_id: &str) -> Option<Arc<dyn PlayerControls>>;
}

/// Wraps a locator and exposes the quality surface with soft failure.
///
/// Every accessor tolerates an absent player; callers treat "no player"
/// as a recoverable state during page load or navigation.
#[derive(Clone)]
pub struct PlayerAdapter {
    locator: Arc<dyn PlayerLocator>,
    element_id: String,
}

impl PlayerAdapter {
    pub fn new(locator: Arc<dyn PlayerLocator>) -> Self {
        Self::with_element_id(locator, PLAYER_ELEMENT_ID)
    }

    pub fn with_element_id(locator: Arc<dyn PlayerLocator>, element_id: impl Into<String>) -> Self {
        Self {
            locator,
            element_id: element_id.into(),
        }
    }

    fn player(&self) -> Option<Arc<dyn PlayerControls>> {
        self.locator.locate(&self.element_id)
    }

    /// Raw offered levels, sentinel included; empty when no player exists.
    pub async fn list_levels(&self) -> Vec<QualityLevel> {
        match self.player() {
            Some(player) => player.available_quality_levels().await,
            None => Vec::new(),
        }
    }

    /// The active level, or `None` when no player exists.
    pub async fn current_level(&self) -> Option<QualityLevel> {
        let player = self.player()?;
        player.playback_quality().await
    }

    /// Applies a level if the player exists and currently offers it.
    ///
    /// A level that disappeared between listing and applying is a no-op,
    /// not an error; the offered set is re-fetched here for that reason.
    pub async fn apply_level(&self, level: &QualityLevel) {
        let Some(player) = self.player() else {
            debug!(element_id = %self.element_id, "player not present, level not applied");
            return;
        };

        let offered = player.available_quality_levels().await;
        if !offered.contains(level) {
            debug!(%level, "requested level not currently offered");
            return;
        }

        player.set_playback_quality_range(level.clone()).await;
    }

    /// Formats a level for display via the static resolution table.
    pub fn format_for_display(&self, level: &QualityLevel) -> QualityInfo {
        quality::display_info(level)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakePlayer {
        available: Vec<QualityLevel>,
        current: Option<QualityLevel>,
        applied: Mutex<Vec<QualityLevel>>,
    }

    #[async_trait]
    impl PlayerControls for FakePlayer {
        async fn available_quality_levels(&self) -> Vec<QualityLevel> {
            self.available.clone()
        }

        async fn playback_quality(&self) -> Option<QualityLevel> {
            self.current.clone()
        }

        async fn set_playback_quality_range(&self, level: QualityLevel) {
            self.applied.lock().push(level);
        }
    }

    struct FakeLocator {
        player: Mutex<Option<Arc<FakePlayer>>>,
    }

    impl PlayerLocator for FakeLocator {
        fn locate(&self, _element_id: &str) -> Option<Arc<dyn PlayerControls>> {
            self.player
                .lock()
                .clone()
                .map(|player| player as Arc<dyn PlayerControls>)
        }
    }

    fn adapter_with(player: Option<Arc<FakePlayer>>) -> (PlayerAdapter, Arc<FakeLocator>) {
        let locator = Arc::new(FakeLocator {
            player: Mutex::new(player),
        });
        (PlayerAdapter::new(Arc::clone(&locator) as Arc<dyn PlayerLocator>), locator)
    }

    #[tokio::test]
    async fn test_missing_player_is_neutral() {
        let (adapter, _locator) = adapter_with(None);

        assert!(adapter.list_levels().await.is_empty());
        assert_eq!(adapter.current_level().await, None);

        // Applying against nothing must not panic.
        adapter.apply_level(&QualityLevel::from("hd720")).await;
    }

    #[tokio::test]
    async fn test_apply_requires_offered_level() {
        let player = Arc::new(FakePlayer {
            available: vec![QualityLevel::from("hd1080"), QualityLevel::from("hd720")],
            current: Some(QualityLevel::from("hd1080")),
            applied: Mutex::new(Vec::new()),
        });
        let (adapter, _locator) = adapter_with(Some(Arc::clone(&player)));

        adapter.apply_level(&QualityLevel::from("hd2160")).await;
        assert!(player.applied.lock().is_empty());

        adapter.apply_level(&QualityLevel::from("hd720")).await;
        assert_eq!(
            player.applied.lock().as_slice(),
            &[QualityLevel::from("hd720")]
        );
    }

    #[tokio::test]
    async fn test_handle_re_resolved_each_call() {
        let player = Arc::new(FakePlayer {
            available: vec![QualityLevel::from("hd720")],
            current: Some(QualityLevel::from("hd720")),
            applied: Mutex::new(Vec::new()),
        });
        let (adapter, locator) = adapter_with(Some(player));

        assert_eq!(adapter.list_levels().await.len(), 1);

        // Host tears the player down; the next call must see its absence.
        *locator.player.lock() = None;
        assert!(adapter.list_levels().await.is_empty());
    }
}
