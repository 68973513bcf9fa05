//! Recording indicator surface.

use parking_lot::Mutex;
use qualshift_core::indicator::IndicatorSurface;
use qualshift_core::quality::QualityInfo;

/// What the simulated surface rendered, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorEvent {
    Shown { label: String, tag: Option<String> },
    Hidden,
}

/// Indicator surface that records every show/hide call.
///
/// The `absent` variant models a page whose indicator elements are
/// missing: `show` reports unavailability and records nothing.
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    events: Mutex<Vec<IndicatorEvent>>,
    absent: bool,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absent() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            absent: true,
        }
    }

    pub fn events(&self) -> Vec<IndicatorEvent> {
        self.events.lock().clone()
    }

    /// Labels shown so far, ignoring hides.
    pub fn shown_labels(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                IndicatorEvent::Shown { label, .. } => Some(label.clone()),
                IndicatorEvent::Hidden => None,
            })
            .collect()
    }
}

impl IndicatorSurface for RecordingIndicator {
    fn show(&self, info: &QualityInfo) -> bool {
        if self.absent {
            return false;
        }
        self.events.lock().push(IndicatorEvent::Shown {
            label: info.label.clone(),
            tag: info.tag.clone(),
        });
        true
    }

    fn hide(&self) {
        self.events.lock().push(IndicatorEvent::Hidden);
    }
}
