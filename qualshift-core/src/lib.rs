//! Qualshift Core - Playback quality control for embedded video players
//!
//! This crate provides the building blocks for switching a host video
//! player's playback resolution from outside its native quality menu:
//! a pure quality-step resolver, the player adapter seam, an async
//! command relay bridging the command source and the page world, the
//! transient on-screen indicator, the shortcut-guide dialog augmenter,
//! and the control-panel state sync.

pub mod config;
pub mod guide;
pub mod indicator;
pub mod panel;
pub mod player;
pub mod quality;
pub mod relay;
pub mod session;
pub mod tracing_setup;
pub mod watch_page;

// Re-export main types for convenient access
pub use config::QualshiftConfig;
pub use guide::{GuideAugmenter, GuideError};
pub use panel::PanelController;
pub use player::PlayerAdapter;
pub use quality::{QualityInfo, QualityLevel, QualityList, QualityReport};
pub use relay::{RelayError, RelayHandle, spawn_relay};
pub use session::PageSession;

/// Core errors that can bubble up from any Qualshift subsystem.
///
/// High-level error types representing failures in core functionality.
#[derive(Debug, thiserror::Error)]
pub enum QualshiftError {
    #[error("Relay error: {0}")]
    Relay(#[from] relay::RelayError),

    #[error("Guide error: {0}")]
    Guide(#[from] guide::GuideError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QualshiftError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            QualshiftError::Relay(e) => match e {
                relay::RelayError::QueryTimeout => {
                    "Could not retrieve quality information".to_string()
                }
                relay::RelayError::InstallFailed { .. } => {
                    "Playback controls are unavailable on this page".to_string()
                }
                _ => "Quality control is currently unavailable".to_string(),
            },
            QualshiftError::Guide(_) => "Shortcut guide could not be updated".to_string(),
            QualshiftError::Configuration { .. } => "Configuration error occurred".to_string(),
            QualshiftError::Io(_) => "File system error occurred".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QualshiftError>;
