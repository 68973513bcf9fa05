//! Transient on-screen quality indicator.
//!
//! Every applied command, including a saturating no-op at a list
//! boundary, flashes the resolved level's label and badge for a fixed
//! duration. Re-triggering cancels and replaces the pending hide timer;
//! hides are never stacked.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::config::IndicatorConfig;
use crate::quality::QualityInfo;

/// Display surface the indicator renders on.
///
/// The surface belongs to the host page; `show` returns `false` when its
/// elements are currently absent, in which case nothing is rendered and
/// no hide is scheduled.
pub trait IndicatorSurface: Send + Sync {
    fn show(&self, info: &QualityInfo) -> bool;
    fn hide(&self);
}

/// Drives a surface with auto-hide semantics.
#[derive(Clone)]
pub struct IndicatorController {
    surface: Arc<dyn IndicatorSurface>,
    display_duration: Duration,
    hide_timer: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl IndicatorController {
    pub fn new(surface: Arc<dyn IndicatorSurface>, config: &IndicatorConfig) -> Self {
        Self {
            surface,
            display_duration: config.display_duration,
            hide_timer: Arc::new(Mutex::new(None)),
        }
    }

    /// Shows a level and arms the hide timer.
    ///
    /// A pending hide from an earlier flash is cancelled and replaced, so
    /// rapid commands keep the indicator up until the last one expires.
    pub fn flash(&self, info: &QualityInfo) {
        if !self.surface.show(info) {
            return;
        }

        let mut timer = self.hide_timer.lock();
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        let surface = Arc::clone(&self.surface);
        let duration = self.display_duration;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            surface.hide();
        }));
    }
}
