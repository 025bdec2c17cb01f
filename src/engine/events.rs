//! Observable events published to collaborators (UI layer, host application).

use serde::{Deserialize, Serialize};

/// Transport and beat notifications.
///
/// `Beat` is delivered asynchronously, close to but not synchronous with the
/// click's audio onset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetronomeEvent {
    Started {
        tempo: f64,
    },
    Stopped,
    Beat {
        tempo: f64,
        sequence_index: u64,
        /// Onset on the audio clock, in seconds
        timestamp: f64,
    },
}

/// Visual indicator commands for the beat flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorEvent {
    FlashOn { sequence_index: u64 },
    FlashOff,
    /// Transport stopped; clear any lit indicator
    Off,
}
