//! Tempo - validated BPM values and the shared tempo cell
//!
//! The UI side writes the tempo while the poll worker reads it on every
//! scheduling iteration. The value is kept as the bit pattern of an `f64` in
//! an `AtomicU64`, so a reader always observes a whole value (possibly
//! stale, never torn). Invalid values are stored as written and replaced by
//! [`DEFAULT_TEMPO_BPM`] when read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MetronomeError;

/// Tempo substituted whenever the configured value is unusable
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// A positive, finite tempo in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tempo(f64);

impl Tempo {
    /// Validate a raw BPM value.
    ///
    /// # Errors
    /// Returns `MetronomeError::InvalidTempo` for zero, negative, NaN,
    /// infinite values and values so small that the beat interval overflows.
    pub fn new(bpm: f64) -> Result<Self, MetronomeError> {
        if bpm.is_finite() && bpm > 0.0 && (60.0 / bpm).is_finite() {
            Ok(Self(bpm))
        } else {
            Err(MetronomeError::InvalidTempo { bpm })
        }
    }

    /// Resolve a raw BPM value, substituting the default when invalid.
    #[inline]
    pub fn resolve(bpm: f64) -> Self {
        Self::new(bpm).unwrap_or_default()
    }

    /// Parse a tempo from text, substituting the default when the text is
    /// not a number or the number is invalid.
    ///
    /// # Examples
    /// ```
    /// use pulse_metronome::timing::Tempo;
    ///
    /// assert_eq!(Tempo::parse(" 90 ").bpm(), 90.0);
    /// assert_eq!(Tempo::parse("fast").bpm(), 120.0);
    /// ```
    pub fn parse(text: &str) -> Self {
        text.trim()
            .parse::<f64>()
            .map(Self::resolve)
            .unwrap_or_default()
    }

    /// Beats per minute
    #[inline]
    pub fn bpm(self) -> f64 {
        self.0
    }

    /// Seconds between consecutive beats: `60 / bpm`
    #[inline]
    pub fn beat_interval(self) -> f64 {
        60.0 / self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(DEFAULT_TEMPO_BPM)
    }
}

/// Shared tempo cell read by the scheduler and written by the host.
#[derive(Debug, Clone)]
pub struct TempoHandle {
    bits: Arc<AtomicU64>,
}

impl TempoHandle {
    pub fn new(bpm: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(bpm.to_bits())),
        }
    }

    /// Store a raw BPM value. Invalid values are kept and resolved on read.
    pub fn set(&self, bpm: f64) {
        self.bits.store(bpm.to_bits(), Ordering::Release);
    }

    /// The value last written, before validation
    pub fn raw(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// The effective tempo
    #[inline]
    pub fn load(&self) -> Tempo {
        Tempo::resolve(self.raw())
    }
}

impl Default for TempoHandle {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO_BPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_interval_formula() {
        assert_eq!(Tempo::resolve(60.0).beat_interval(), 1.0);
        assert_eq!(Tempo::resolve(120.0).beat_interval(), 0.5);
        assert_eq!(Tempo::resolve(240.0).beat_interval(), 0.25);
    }

    #[test]
    fn test_invalid_tempo_rejected() {
        for bpm in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = Tempo::new(bpm);
            assert!(
                matches!(result, Err(MetronomeError::InvalidTempo { .. })),
                "{} should be rejected",
                bpm
            );
        }
    }

    #[test]
    fn test_subnormal_tempo_rejected() {
        // 60 / 5e-324 overflows to infinity
        assert!(Tempo::new(5e-324).is_err());
        assert_eq!(Tempo::resolve(5e-324).bpm(), DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn test_resolve_substitutes_default() {
        for bpm in [0.0, -5.0, f64::NAN] {
            let tempo = Tempo::resolve(bpm);
            assert_eq!(tempo.bpm(), DEFAULT_TEMPO_BPM);
            assert_eq!(tempo.beat_interval(), 0.5);
        }
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(Tempo::parse("72.5").bpm(), 72.5);
        assert_eq!(Tempo::parse("abc").bpm(), DEFAULT_TEMPO_BPM);
        assert_eq!(Tempo::parse("").bpm(), DEFAULT_TEMPO_BPM);
        assert_eq!(Tempo::parse("0").bpm(), DEFAULT_TEMPO_BPM);
        assert_eq!(Tempo::parse("-40").bpm(), DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn test_handle_keeps_raw_value() {
        let handle = TempoHandle::new(90.0);
        assert_eq!(handle.load().bpm(), 90.0);

        handle.set(-5.0);
        assert_eq!(handle.raw(), -5.0);
        assert_eq!(handle.load().bpm(), DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn test_handle_clones_share_state() {
        let writer = TempoHandle::default();
        let reader = writer.clone();

        writer.set(180.0);
        assert_eq!(reader.load().bpm(), 180.0);
    }

    #[test]
    fn test_concurrent_writes_never_tear() {
        let handle = TempoHandle::new(60.0);
        let writer = handle.clone();

        let thread = std::thread::spawn(move || {
            for i in 0..10_000 {
                writer.set(if i % 2 == 0 { 60.0 } else { 240.0 });
            }
        });

        for _ in 0..10_000 {
            let bpm = handle.load().bpm();
            assert!(bpm == 60.0 || bpm == 240.0, "observed torn tempo {}", bpm);
        }

        thread.join().unwrap();
    }
}
