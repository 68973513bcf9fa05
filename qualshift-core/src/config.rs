//! Centralized configuration for Qualshift.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

use crate::guide::ShortcutRow;
use crate::watch_page::DEFAULT_WATCH_PATTERNS;

/// Central configuration for all Qualshift components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct QualshiftConfig {
    pub relay: RelayConfig,
    pub indicator: IndicatorConfig,
    pub guide: GuideConfig,
    pub panel: PanelConfig,
    pub simulation: SimulationConfig,
}

/// Command relay configuration.
///
/// Controls the relay actor's channel capacity and the timing of the
/// cross-context request/reply protocol.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Capacity of the relay actor's command channel
    pub command_buffer: usize,
    /// How long a query waits for a page-side reply before failing
    pub reply_timeout: Duration,
    /// Pause between publishing a mutation and querying the new level
    pub confirm_delay: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            command_buffer: 32,
            reply_timeout: Duration::from_secs(1),
            confirm_delay: Duration::from_millis(100),
        }
    }
}

/// On-screen quality indicator configuration.
#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    /// How long the indicator stays visible after a quality change
    pub display_duration: Duration,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            display_duration: Duration::from_millis(700),
        }
    }
}

/// Shortcut-guide augmenter configuration.
///
/// Controls the dialog wait chain and the rows spliced into the
/// host-owned shortcut guide.
#[derive(Debug, Clone)]
pub struct GuideConfig {
    /// Delay between attempts to locate the popup container
    pub container_retry_delay: Duration,
    /// Title of the host dialog section the rows are appended to
    pub section_title: String,
    /// Title rendered above the appended rows
    pub guide_title: String,
    /// Rows appended to the guide, one per supported command
    pub rows: Vec<ShortcutRow>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            container_retry_delay: Duration::from_secs(1),
            section_title: "General".to_string(),
            guide_title: "Playback quality".to_string(),
            rows: vec![
                ShortcutRow::new("Quality down", "Ctrl + Shift + 1"),
                ShortcutRow::new("Quality up", "Ctrl + Shift + 2"),
            ],
        }
    }
}

/// Control panel state-sync configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Interval between quality re-queries while the panel is open
    pub poll_interval: Duration,
    /// URL fragments identifying pages the panel can control
    pub watch_patterns: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            watch_patterns: DEFAULT_WATCH_PATTERNS
                .iter()
                .map(|pattern| (*pattern).to_string())
                .collect(),
        }
    }
}

/// Simulation mode configuration for testing and development.
///
/// Controls whether components use simulated or real implementations,
/// and configures simulation parameters for deterministic testing.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Enable simulation mode for all components
    pub enabled: bool,
    /// Deterministic seed for reproducible simulations
    pub deterministic_seed: Option<u64>,
    /// Simulated page-transport latency in milliseconds
    pub transport_latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            deterministic_seed: None,
            transport_latency_ms: 0,
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration for deterministic testing.
    pub fn deterministic_testing() -> Self {
        Self {
            enabled: true,
            deterministic_seed: Some(42),
            transport_latency_ms: 0,
        }
    }

    /// Creates a configuration for development with realistic latency.
    pub fn realistic_simulation() -> Self {
        Self {
            enabled: true,
            deterministic_seed: None,
            transport_latency_ms: 30,
        }
    }
}

impl QualshiftConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("QUALSHIFT_REPLY_TIMEOUT_MS") {
            if let Ok(millis) = timeout.parse::<u64>() {
                config.relay.reply_timeout = Duration::from_millis(millis);
            }
        }

        if let Ok(interval) = std::env::var("QUALSHIFT_POLL_INTERVAL_MS") {
            if let Ok(millis) = interval.parse::<u64>() {
                config.panel.poll_interval = Duration::from_millis(millis);
            }
        }

        if let Ok(duration) = std::env::var("QUALSHIFT_INDICATOR_MS") {
            if let Ok(millis) = duration.parse::<u64>() {
                config.indicator.display_duration = Duration::from_millis(millis);
            }
        }

        if let Ok(enabled) = std::env::var("QUALSHIFT_SIMULATION_MODE") {
            config.simulation.enabled = enabled.parse().unwrap_or(false);
        }

        if let Ok(seed) = std::env::var("QUALSHIFT_SIMULATION_SEED") {
            if let Ok(seed_value) = seed.parse::<u64>() {
                config.simulation.deterministic_seed = Some(seed_value);
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            simulation: SimulationConfig::deterministic_testing(),
            ..Default::default()
        }
    }

    /// Creates a configuration for development with realistic simulation.
    pub fn for_development() -> Self {
        Self {
            simulation: SimulationConfig::realistic_simulation(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = QualshiftConfig::default();

        assert_eq!(config.relay.reply_timeout, Duration::from_secs(1));
        assert_eq!(config.relay.confirm_delay, Duration::from_millis(100));
        assert_eq!(
            config.indicator.display_duration,
            Duration::from_millis(700)
        );
        assert_eq!(config.guide.container_retry_delay, Duration::from_secs(1));
        assert_eq!(config.panel.poll_interval, Duration::from_secs(1));
        assert_eq!(config.guide.rows.len(), 2);
        assert!(!config.simulation.enabled);
    }

    #[test]
    fn test_simulation_config_presets() {
        let testing_config = SimulationConfig::deterministic_testing();
        assert!(testing_config.enabled);
        assert_eq!(testing_config.deterministic_seed, Some(42));
        assert_eq!(testing_config.transport_latency_ms, 0);

        let realistic_config = SimulationConfig::realistic_simulation();
        assert!(realistic_config.enabled);
        assert_eq!(realistic_config.deterministic_seed, None);
        assert!(realistic_config.transport_latency_ms > 0);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("QUALSHIFT_REPLY_TIMEOUT_MS", "2500");
            std::env::set_var("QUALSHIFT_POLL_INTERVAL_MS", "250");
            std::env::set_var("QUALSHIFT_SIMULATION_MODE", "true");
            std::env::set_var("QUALSHIFT_SIMULATION_SEED", "12345");
        }

        let config = QualshiftConfig::from_env();

        assert_eq!(config.relay.reply_timeout, Duration::from_millis(2500));
        assert_eq!(config.panel.poll_interval, Duration::from_millis(250));
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.deterministic_seed, Some(12345));

        unsafe {
            std::env::remove_var("QUALSHIFT_REPLY_TIMEOUT_MS");
            std::env::remove_var("QUALSHIFT_POLL_INTERVAL_MS");
            std::env::remove_var("QUALSHIFT_SIMULATION_MODE");
            std::env::remove_var("QUALSHIFT_SIMULATION_SEED");
        }
    }
}
