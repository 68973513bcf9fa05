//! Simulated host player and element registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use qualshift_core::player::{PlayerControls, PlayerLocator};
use qualshift_core::quality::QualityLevel;

#[derive(Debug, Default)]
struct SimPlayerState {
    available: Vec<QualityLevel>,
    current: Option<QualityLevel>,
    set_calls: Vec<QualityLevel>,
}

/// In-memory player with a mutable offered set.
///
/// Applying a level moves `current` immediately, like a host player that
/// honors every request. Tests can shrink or swap the offered set between
/// commands to exercise staleness handling.
#[derive(Debug, Default)]
pub struct SimPlayer {
    state: Mutex<SimPlayerState>,
}

impl SimPlayer {
    pub fn new(available: Vec<QualityLevel>, current: Option<QualityLevel>) -> Self {
        Self {
            state: Mutex::new(SimPlayerState {
                available,
                current,
                set_calls: Vec::new(),
            }),
        }
    }

    /// Player offering the full known vocabulary plus the auto sentinel.
    pub fn with_standard_levels(current: &str) -> Self {
        let available = ["auto", "hd2160", "hd1080", "hd720", "large", "medium", "tiny"]
            .iter()
            .map(|id| QualityLevel::from(*id))
            .collect();
        Self::new(available, Some(QualityLevel::from(current)))
    }

    /// Replaces the offered set, simulating a host-side change.
    pub fn set_available(&self, available: Vec<QualityLevel>) {
        self.state.lock().available = available;
    }

    /// Forces the active level without recording a set call.
    pub fn force_current(&self, level: &str) {
        self.state.lock().current = Some(QualityLevel::from(level));
    }

    pub fn current(&self) -> Option<QualityLevel> {
        self.state.lock().current.clone()
    }

    /// Levels applied through the quality API, in order.
    pub fn set_calls(&self) -> Vec<QualityLevel> {
        self.state.lock().set_calls.clone()
    }
}

#[async_trait]
impl PlayerControls for SimPlayer {
    async fn available_quality_levels(&self) -> Vec<QualityLevel> {
        self.state.lock().available.clone()
    }

    async fn playback_quality(&self) -> Option<QualityLevel> {
        self.state.lock().current.clone()
    }

    async fn set_playback_quality_range(&self, level: QualityLevel) {
        let mut state = self.state.lock();
        state.set_calls.push(level.clone());
        state.current = Some(level);
    }
}

/// Registry of page elements the locator resolves against.
///
/// Registering and removing players between calls simulates the host
/// replacing or tearing down the player element.
#[derive(Default)]
pub struct SimElements {
    players: Mutex<HashMap<String, Arc<SimPlayer>>>,
}

impl SimElements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, element_id: impl Into<String>, player: Arc<SimPlayer>) {
        self.players.lock().insert(element_id.into(), player);
    }

    pub fn remove(&self, element_id: &str) {
        self.players.lock().remove(element_id);
    }
}

impl PlayerLocator for SimElements {
    fn locate(&self, element_id: &str) -> Option<Arc<dyn PlayerControls>> {
        self.players
            .lock()
            .get(element_id)
            .cloned()
            .map(|player| player as Arc<dyn PlayerControls>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_moves_current_and_records() {
        let player = SimPlayer::with_standard_levels("hd1080");
        player
            .set_playback_quality_range(QualityLevel::from("hd720"))
            .await;

        assert_eq!(player.current(), Some(QualityLevel::from("hd720")));
        assert_eq!(player.set_calls(), vec![QualityLevel::from("hd720")]);
    }

    #[test]
    fn test_registry_resolves_fresh() {
        let elements = SimElements::new();
        let player = Arc::new(SimPlayer::with_standard_levels("hd1080"));
        elements.register("movie_player", Arc::clone(&player));

        assert!(elements.locate("movie_player").is_some());
        elements.remove("movie_player");
        assert!(elements.locate("movie_player").is_none());
    }
}
