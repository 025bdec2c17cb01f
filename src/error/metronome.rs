// Metronome error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Metronome error code constants
///
/// Single source of truth for the numeric codes reported by
/// [`MetronomeError::code`], so hosts can branch on them without matching
/// the enum.
///
/// Error code range: 2001-2005
pub struct MetronomeErrorCodes {}

impl MetronomeErrorCodes {
    /// The audio clock could not be acquired at start
    pub const CLOCK_UNAVAILABLE: i32 = 2001;

    /// Tempo is zero, negative, non-finite or not a number
    pub const INVALID_TEMPO: i32 = 2002;

    /// Scheduler configuration violates the lookahead/poll constraints
    pub const INVALID_CONFIG: i32 = 2003;

    /// The poll worker could not be created
    pub const SCHEDULER_SPAWN_FAILED: i32 = 2004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 2005;
}

/// Log a metronome error with structured context
///
/// Logs the numeric code, the component and the human-readable message.
/// The logging is non-blocking and will not panic on failure.
pub fn log_metronome_error(err: &MetronomeError, context: &str) {
    error!(
        "Metronome error in {}: code={}, component=Transport, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Metronome errors
///
/// Start-time failures are returned synchronously; steady-state scheduling
/// never produces one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum MetronomeError {
    /// The precise audio clock could not be acquired
    ClockUnavailable { reason: String },

    /// Tempo resolved to zero, negative or non-finite
    InvalidTempo { bpm: f64 },

    /// Scheduler configuration is unusable
    InvalidConfig { reason: String },

    /// Poll worker thread or runtime could not be created
    SchedulerSpawnFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for MetronomeError {
    fn code(&self) -> i32 {
        match self {
            MetronomeError::ClockUnavailable { .. } => MetronomeErrorCodes::CLOCK_UNAVAILABLE,
            MetronomeError::InvalidTempo { .. } => MetronomeErrorCodes::INVALID_TEMPO,
            MetronomeError::InvalidConfig { .. } => MetronomeErrorCodes::INVALID_CONFIG,
            MetronomeError::SchedulerSpawnFailed { .. } => {
                MetronomeErrorCodes::SCHEDULER_SPAWN_FAILED
            }
            MetronomeError::LockPoisoned { .. } => MetronomeErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            MetronomeError::ClockUnavailable { reason } => {
                format!("Audio clock unavailable: {}", reason)
            }
            MetronomeError::InvalidTempo { bpm } => {
                format!("Tempo must be a positive finite BPM (got {})", bpm)
            }
            MetronomeError::InvalidConfig { reason } => {
                format!("Invalid scheduler configuration: {}", reason)
            }
            MetronomeError::SchedulerSpawnFailed { reason } => {
                format!("Failed to spawn scheduler: {}", reason)
            }
            MetronomeError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for MetronomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetronomeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for MetronomeError {}

impl From<std::io::Error> for MetronomeError {
    fn from(err: std::io::Error) -> Self {
        MetronomeError::SchedulerSpawnFailed {
            reason: err.to_string(),
        }
    }
}
