//! Configuration management for the metronome engine
//!
//! Runtime configuration is loaded from JSON files so scheduler timing and
//! the click voice can be tuned without recompilation. Every section has
//! defaults; missing fields fall back to them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::MetronomeError;
use crate::timing::DEFAULT_TEMPO_BPM;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub click: ClickConfig,
    pub transport: TransportConfig,
    pub notification: NotificationConfig,
}

/// Lookahead scheduler timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How far past the current audio clock beats are committed (seconds)
    pub lookahead_secs: f64,
    /// Delay between poll wake-ups (milliseconds)
    pub poll_interval_ms: u64,
    /// Upper bound on beats emitted by a single pass; the rest wait for the next pass
    pub max_beats_per_pass: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_secs: 0.1,
            poll_interval_ms: 25,
            max_beats_per_pass: 64,
        }
    }
}

impl SchedulerConfig {
    /// Check the lookahead/poll relationship.
    ///
    /// # Errors
    /// Returns `MetronomeError::InvalidConfig` when the lookahead window is
    /// not a positive finite duration, when the poll interval is zero or not
    /// strictly shorter than the window, or when the per-pass cap is zero.
    pub fn validate(&self) -> Result<(), MetronomeError> {
        if !(self.lookahead_secs.is_finite() && self.lookahead_secs > 0.0) {
            return Err(MetronomeError::InvalidConfig {
                reason: format!(
                    "lookahead_secs must be positive (got {})",
                    self.lookahead_secs
                ),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(MetronomeError::InvalidConfig {
                reason: "poll_interval_ms must be greater than 0".to_string(),
            });
        }
        if self.poll_interval_ms as f64 >= self.lookahead_secs * 1000.0 {
            return Err(MetronomeError::InvalidConfig {
                reason: format!(
                    "poll_interval_ms ({}) must be shorter than the lookahead window ({} ms)",
                    self.poll_interval_ms,
                    self.lookahead_secs * 1000.0
                ),
            });
        }
        if self.max_beats_per_pass == 0 {
            return Err(MetronomeError::InvalidConfig {
                reason: "max_beats_per_pass must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

/// Click voice parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Sine frequency of the click in Hz
    pub frequency_hz: f32,
    /// Initial gain of the click envelope
    pub gain: f32,
    /// Click length in milliseconds
    pub duration_ms: f32,
    /// Gain the exponential decay reaches at the end of the click
    pub decay_floor: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            gain: 0.5,
            duration_ms: 50.0,
            decay_floor: 0.001,
        }
    }
}

/// Transport defaults applied by the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Tempo used before the host sets one
    pub tempo_bpm: f64,
    /// Start as soon as the controller is attached
    pub auto_start: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_TEMPO_BPM,
            auto_start: false,
        }
    }
}

/// Best-effort side-channel notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long the indicator stays lit per beat (milliseconds)
    pub flash_duration_ms: u64,
    /// Capacity of each broadcast channel; slow subscribers lag beyond this
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            flash_duration_ms: 100,
            channel_capacity: 256,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults when the file is missing or
    /// the JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/metronome_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.lookahead_secs, 0.1);
        assert_eq!(config.scheduler.poll_interval_ms, 25);
        assert_eq!(config.click.frequency_hz, 1000.0);
        assert_eq!(config.transport.tempo_bpm, 120.0);
        assert!(!config.transport.auto_start);
        assert_eq!(config.notification.flash_duration_ms, 100);
        assert!(config.scheduler.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.scheduler.lookahead_secs, config.scheduler.lookahead_secs);
        assert_eq!(parsed.click.duration_ms, config.click.duration_ms);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"transport": {"tempo_bpm": 90.0}}"#).unwrap();
        assert_eq!(parsed.transport.tempo_bpm, 90.0);
        assert!(!parsed.transport.auto_start);
        assert_eq!(parsed.scheduler.poll_interval_ms, 25);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/metronome.json");
        assert_eq!(config.scheduler.max_beats_per_pass, 64);
    }

    #[test]
    fn test_poll_must_be_shorter_than_lookahead() {
        let config = SchedulerConfig {
            lookahead_secs: 0.1,
            poll_interval_ms: 100,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetronomeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_degenerate_values() {
        let zero_poll = SchedulerConfig {
            poll_interval_ms: 0,
            ..SchedulerConfig::default()
        };
        assert!(zero_poll.validate().is_err());

        let nan_window = SchedulerConfig {
            lookahead_secs: f64::NAN,
            ..SchedulerConfig::default()
        };
        assert!(nan_window.validate().is_err());

        let no_cap = SchedulerConfig {
            max_beats_per_pass: 0,
            ..SchedulerConfig::default()
        };
        assert!(no_cap.validate().is_err());
    }
}
