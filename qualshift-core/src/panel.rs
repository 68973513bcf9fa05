//! Control panel state sync.
//!
//! Keeps a slider/radio control surface consistent with the player's
//! actual quality: one initial query when the panel opens, then a fixed
//! interval poll that only touches the panel when the reported level
//! differs from the last known one, so a user mid-drag is never fought.
//! Slider position and level index are a linear mapping, with percent 100
//! at the highest offered level; the two directions of the mapping are
//! inverse-consistent.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::PanelConfig;
use crate::quality::{Command, QualityInfo, QualityReport};
use crate::relay::RelayHandle;
use crate::watch_page::is_watch_page;

/// Severity of a panel status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Short status message surfaced next to the controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusLine {
    fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Snapshot of everything the panel renders.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    /// Selectable levels, highest to lowest, sentinel filtered.
    pub available: Vec<QualityInfo>,
    /// Last known active level.
    pub current: Option<QualityInfo>,
    /// Level previewed while the slider is being dragged.
    pub preview: Option<QualityInfo>,
    /// Slider position; 100 is the highest offered level.
    pub slider_percent: f64,
    /// Set while the user drags; cleared by external changes.
    pub slider_dirty: bool,
    pub controls_enabled: bool,
    /// Radio state: current level is the highest offered.
    pub highest_selected: bool,
    /// Radio state: current level is the lowest offered.
    pub lowest_selected: bool,
    pub status: Option<StatusLine>,
}

/// Maps a list index to a slider percentage.
///
/// Index 0 (highest quality) maps to 100; the last index maps to 0.
/// A single-entry list pins the slider to 100.
pub fn slider_percent_for_index(index: usize, len: usize) -> f64 {
    if len <= 1 {
        return 100.0;
    }
    100.0 - (index as f64 / (len - 1) as f64) * 100.0
}

/// Maps a slider percentage back to a list index, clamped into range.
pub fn index_for_slider_percent(percent: f64, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let normalized = (100.0 - percent.clamp(0.0, 100.0)) / 100.0;
    let index = (normalized * (len - 1) as f64).round() as usize;
    index.min(len - 1)
}

/// Filters and orders a reported sequence into the selectable set.
fn selectable_levels(reported: Vec<QualityInfo>) -> Vec<QualityInfo> {
    let mut levels: Vec<QualityInfo> = reported
        .into_iter()
        .filter(|info| !info.id.is_auto())
        .collect();
    levels.sort_by_key(|info| info.id.priority_rank().map_or(-1, |rank| rank as i64));
    levels
}

/// Aligns slider and radios with the current level.
fn sync_display(state: &mut PanelState) {
    let Some(current) = state.current.clone() else {
        state.highest_selected = false;
        state.lowest_selected = false;
        return;
    };

    if let Some(index) = state.available.iter().position(|info| info.id == current.id) {
        if !state.slider_dirty {
            state.slider_percent = slider_percent_for_index(index, state.available.len());
        }
    }

    state.highest_selected = state
        .available
        .first()
        .is_some_and(|info| info.id == current.id);
    state.lowest_selected = state
        .available
        .last()
        .is_some_and(|info| info.id == current.id);
}

/// Applies the first query's result when the panel opens.
fn apply_initial_report(state: &mut PanelState, report: QualityReport) {
    let available = selectable_levels(report.available);
    if available.is_empty() {
        state.controls_enabled = false;
        state.status = Some(StatusLine::new(
            "No quality levels available",
            StatusKind::Warning,
        ));
        return;
    }

    state.available = available;
    state.current = report.current;
    state.controls_enabled = true;
    state.slider_dirty = false;
    sync_display(state);
    state.status = Some(StatusLine::new("Ready", StatusKind::Success));
}

/// Applies a polled report, touching the panel only on a real change.
///
/// Returns whether anything was updated.
fn apply_poll_report(state: &mut PanelState, report: QualityReport) -> bool {
    let available = selectable_levels(report.available);
    if available.is_empty() {
        return false;
    }

    let new_id = report.current.as_ref().map(|info| &info.id);
    let known_id = state.current.as_ref().map(|info| &info.id);
    if new_id == known_id {
        return false;
    }

    state.available = available;
    state.current = report.current;
    // The change came from outside the panel; stop protecting the slider.
    state.slider_dirty = false;
    state.preview = None;
    sync_display(state);
    true
}

/// Applies the confirmed level returned after a mutation command.
fn apply_confirmed_level(state: &mut PanelState, info: QualityInfo) {
    state.current = Some(info);
    state.slider_dirty = false;
    state.preview = None;
    sync_display(state);
}

/// Owns the panel state and its polling loop.
///
/// Dropping the controller (or calling [`PanelController::close`]) stops
/// the poll.
pub struct PanelController {
    relay: RelayHandle,
    config: PanelConfig,
    state: Arc<Mutex<PanelState>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl PanelController {
    /// Opens the panel against a target page.
    ///
    /// An unsupported URL disables the controls immediately; otherwise
    /// the initial query runs and the poll starts.
    pub async fn open(relay: RelayHandle, target_url: &str, config: PanelConfig) -> Self {
        let controller = Self {
            relay,
            config,
            state: Arc::new(Mutex::new(PanelState::default())),
            poll_task: Mutex::new(None),
        };

        if !is_watch_page(target_url, &controller.config.watch_patterns) {
            {
                let mut state = controller.state.lock();
                state.controls_enabled = false;
                state.status = Some(StatusLine::new(
                    "Not a supported video page",
                    StatusKind::Warning,
                ));
            }
            return controller;
        }

        controller.initial_query().await;
        controller.start_polling();
        controller
    }

    /// Current render snapshot.
    pub fn state(&self) -> PanelState {
        self.state.lock().clone()
    }

    async fn initial_query(&self) {
        match self.relay.quality_info().await {
            Ok(report) => apply_initial_report(&mut self.state.lock(), report),
            Err(error) => {
                warn!(%error, "initial quality query failed");
                let mut state = self.state.lock();
                state.controls_enabled = false;
                state.status = Some(StatusLine::new(
                    "Could not retrieve quality information",
                    StatusKind::Error,
                ));
            }
        }
    }

    fn start_polling(&self) {
        let mut task = self.poll_task.lock();
        if task.is_some() {
            return;
        }

        let relay = self.relay.clone();
        let state = Arc::clone(&self.state);
        let period = self.config.poll_interval;
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The immediate first tick duplicates the initial query.
            interval.tick().await;
            loop {
                interval.tick().await;
                match relay.quality_info().await {
                    Ok(report) => {
                        if apply_poll_report(&mut state.lock(), report) {
                            debug!("panel updated from polled quality state");
                        }
                    }
                    // Poll failures are transient; the next tick retries.
                    Err(_) => continue,
                }
            }
        }));
    }

    /// Slider drag in progress: preview only, no command.
    pub fn slider_moved(&self, percent: f64) {
        let mut state = self.state.lock();
        if state.available.is_empty() {
            return;
        }
        state.slider_dirty = true;
        state.slider_percent = percent;
        let index = index_for_slider_percent(percent, state.available.len());
        state.preview = state.available.get(index).cloned();
    }

    /// Slider released: apply the level the position maps to.
    pub async fn slider_released(&self, percent: f64) {
        let target = {
            let state = self.state.lock();
            if state.available.is_empty() {
                return;
            }
            let index = index_for_slider_percent(percent, state.available.len());
            match state.available.get(index) {
                Some(info) => info.id.clone(),
                None => return,
            }
        };

        self.dispatch(Command::SetSpecificQuality { quality: target })
            .await;
    }

    /// Radio selection: jump to the highest offered level.
    pub async fn select_highest(&self) {
        self.dispatch(Command::HighestQuality).await;
    }

    /// Radio selection: jump to the lowest offered level.
    pub async fn select_lowest(&self) {
        self.dispatch(Command::LowestQuality).await;
    }

    async fn dispatch(&self, command: Command) {
        self.state.lock().status = Some(StatusLine::new("Changing quality…", StatusKind::Info));

        match self.relay.send_command(command).await {
            Ok(confirmed) => {
                let mut state = self.state.lock();
                if let Some(info) = confirmed {
                    apply_confirmed_level(&mut state, info);
                }
                state.status = Some(StatusLine::new("Quality changed", StatusKind::Success));
            }
            Err(error) => {
                warn!(%error, "quality command failed");
                self.state.lock().status = Some(StatusLine::new(
                    "Could not change quality",
                    StatusKind::Error,
                ));
            }
        }
    }

    /// Stops the poll; the panel is being torn down.
    pub fn close(&self) {
        if let Some(task) = self.poll_task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{QualityLevel, display_info};

    fn info(id: &str) -> QualityInfo {
        display_info(&QualityLevel::from(id))
    }

    fn report(current: Option<&str>, available: &[&str]) -> QualityReport {
        QualityReport {
            current: current.map(info),
            available: available.iter().map(|id| info(id)).collect(),
        }
    }

    #[test]
    fn test_slider_mapping_endpoints() {
        assert_eq!(slider_percent_for_index(0, 4), 100.0);
        assert_eq!(slider_percent_for_index(3, 4), 0.0);
        assert_eq!(index_for_slider_percent(100.0, 4), 0);
        assert_eq!(index_for_slider_percent(0.0, 4), 3);
    }

    #[test]
    fn test_slider_mapping_inverse_consistent() {
        for len in 1..10usize {
            for index in 0..len {
                let percent = slider_percent_for_index(index, len);
                assert_eq!(index_for_slider_percent(percent, len), index);
            }
        }
    }

    #[test]
    fn test_slider_mapping_single_level() {
        assert_eq!(slider_percent_for_index(0, 1), 100.0);
        assert_eq!(index_for_slider_percent(37.0, 1), 0);
    }

    #[test]
    fn test_slider_percent_clamped() {
        assert_eq!(index_for_slider_percent(250.0, 5), 0);
        assert_eq!(index_for_slider_percent(-40.0, 5), 4);
    }

    #[test]
    fn test_selectable_filters_and_orders() {
        let levels = selectable_levels(vec![
            info("auto"),
            info("medium"),
            info("hd1080"),
            info("hd2160"),
        ]);
        let ids: Vec<&str> = levels.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["hd2160", "hd1080", "medium"]);
    }

    #[test]
    fn test_initial_report_enables_controls() {
        let mut state = PanelState::default();
        apply_initial_report(
            &mut state,
            report(Some("hd720"), &["auto", "hd1080", "hd720", "medium"]),
        );

        assert!(state.controls_enabled);
        assert_eq!(state.available.len(), 3);
        assert_eq!(state.current.as_ref().unwrap().id.as_str(), "hd720");
        assert_eq!(state.slider_percent, 50.0);
        assert!(!state.highest_selected);
        assert!(!state.lowest_selected);
        assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Success);
    }

    #[test]
    fn test_initial_report_without_levels_disables() {
        let mut state = PanelState::default();
        apply_initial_report(&mut state, report(None, &["auto"]));

        assert!(!state.controls_enabled);
        assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Warning);
    }

    #[test]
    fn test_poll_report_ignores_unchanged_level() {
        let mut state = PanelState::default();
        apply_initial_report(&mut state, report(Some("hd720"), &["hd1080", "hd720"]));

        state.slider_dirty = true;
        let updated = apply_poll_report(&mut state, report(Some("hd720"), &["hd1080", "hd720"]));

        assert!(!updated);
        // An unchanged poll must not clear the drag protection.
        assert!(state.slider_dirty);
    }

    #[test]
    fn test_poll_report_applies_external_change() {
        let mut state = PanelState::default();
        apply_initial_report(&mut state, report(Some("hd720"), &["hd1080", "hd720"]));
        state.slider_dirty = true;

        let updated = apply_poll_report(&mut state, report(Some("hd1080"), &["hd1080", "hd720"]));

        assert!(updated);
        assert!(!state.slider_dirty);
        assert_eq!(state.current.as_ref().unwrap().id.as_str(), "hd1080");
        assert_eq!(state.slider_percent, 100.0);
        assert!(state.highest_selected);
        assert!(!state.lowest_selected);
    }

    #[test]
    fn test_radio_state_tracks_extremes() {
        let mut state = PanelState::default();
        apply_initial_report(
            &mut state,
            report(Some("medium"), &["hd1080", "hd720", "medium"]),
        );

        assert!(state.lowest_selected);
        assert!(!state.highest_selected);

        apply_confirmed_level(&mut state, info("hd1080"));
        assert!(state.highest_selected);
        assert!(!state.lowest_selected);
    }
}
