//! Qualshift Simulation - Deterministic page environment for testing.
//!
//! Every external collaborator the core depends on — the host player, the
//! shared page transport, the dialog markup, the indicator surface — has
//! an in-memory implementation here, so the full command path can run
//! under controlled, reproducible conditions without a host page.

pub mod dialog;
pub mod harness;
pub mod indicator;
pub mod player;
pub mod transport;

pub use dialog::SimDialog;
pub use harness::{InstallBehavior, SimHarness, SimHarnessBuilder, SimInstaller};
pub use indicator::{IndicatorEvent, RecordingIndicator};
pub use player::{SimElements, SimPlayer};
pub use transport::SimTransport;

use qualshift_core::quality::QualityLevel;

/// Convenience conversion from string ids to quality levels.
pub fn quality_levels(ids: &[&str]) -> Vec<QualityLevel> {
    ids.iter().map(|id| QualityLevel::from(*id)).collect()
}
