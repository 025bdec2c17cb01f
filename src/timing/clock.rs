//! Audio clock sources
//!
//! A [`ClockSource`] is the precise time reference all scheduling arithmetic
//! is done against. It is independent of the poll timer: the poll only
//! decides *when to look*, the clock decides *what is due*.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic high-resolution time reference in seconds.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Clock derived from the number of frames the audio callback has rendered.
///
/// The frame counter is advanced by the audio backend only, so this clock
/// runs at exactly the device's sample rate.
pub struct FrameClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl FrameClock {
    pub fn new(frames: Arc<AtomicU64>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl ClockSource for FrameClock {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }
}

/// Clock measuring elapsed time since it was created.
///
/// Used by the desktop stub where no device drives a frame counter.
pub struct InstantClock {
    origin: Instant,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for InstantClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. For tests and offline simulation.
#[derive(Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Jump to `secs`. Ignored when it would move the clock backwards.
    pub fn set(&self, secs: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (secs >= f64::from_bits(current)).then_some(secs.to_bits())
            });
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
