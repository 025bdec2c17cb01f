//! Metronome - click voice generation and clock/frame conversion
//!
//! This module pre-renders the percussive click used for every beat and
//! converts audio-clock timestamps into frame positions.
//! Key features:
//! - Sine burst with an exponential decay envelope
//! - Pure functions (no side effects, deterministic output)
//! - Zero allocations in the conversion helpers

use crate::config::ClickConfig;

/// Generates a metronome click sample.
///
/// The click is a sine at `config.frequency_hz` whose gain starts at
/// `config.gain` and decays exponentially to `config.decay_floor` over
/// `config.duration_ms`.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz (typically 48000)
/// * `config` - Click voice parameters
///
/// # Returns
/// A `Vec<f32>` containing exactly `duration_ms` worth of samples
///
/// # Examples
/// ```
/// use pulse_metronome::audio::generate_click_sample;
/// use pulse_metronome::config::ClickConfig;
///
/// let click = generate_click_sample(48000, &ClickConfig::default());
/// assert_eq!(click.len(), 2400); // 50ms at 48kHz
/// ```
pub fn generate_click_sample(sample_rate: u32, config: &ClickConfig) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * config.duration_ms / 1000.0) as usize;
    if num_samples == 0 {
        return Vec::new();
    }

    let floor = config.decay_floor.max(f32::MIN_POSITIVE);
    let start = config.gain.max(floor);
    // gain(n) = start * (floor / start)^(n / len)
    let decay_per_sample = (floor / start).powf(1.0 / num_samples as f32);
    let phase_step = std::f32::consts::TAU * config.frequency_hz / sample_rate as f32;

    let mut samples = Vec::with_capacity(num_samples);
    let mut gain = start;
    for n in 0..num_samples {
        samples.push((phase_step * n as f32).sin() * gain);
        gain *= decay_per_sample;
    }

    samples
}

/// Converts an audio-clock timestamp (seconds) to the frame at which it starts.
///
/// Negative and non-finite timestamps map to frame 0.
#[inline]
pub fn seconds_to_frame(seconds: f64, sample_rate: u32) -> u64 {
    let frame = (seconds * sample_rate as f64).round();
    if frame.is_finite() && frame > 0.0 {
        frame as u64
    } else {
        0
    }
}

/// Converts a frame position to audio-clock seconds.
#[inline]
pub fn frame_to_seconds(frame: u64, sample_rate: u32) -> f64 {
    frame as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_click_sample_duration() {
        let config = ClickConfig::default();
        for &sr in &[44100, 48000, 96000] {
            let click = generate_click_sample(sr, &config);
            let expected = (sr as f32 * config.duration_ms / 1000.0) as usize;
            assert_eq!(
                click.len(),
                expected,
                "Click duration should be exactly 50ms at {} Hz",
                sr
            );
        }
    }

    #[test]
    fn test_generate_click_sample_range() {
        let config = ClickConfig::default();
        let click = generate_click_sample(48000, &config);

        for (i, &sample) in click.iter().enumerate() {
            assert!(
                sample.abs() <= config.gain + f32::EPSILON,
                "Sample {} at index {} exceeds the click gain",
                sample,
                i
            );
        }
    }

    #[test]
    fn test_generate_click_sample_decays() {
        let click = generate_click_sample(48000, &ClickConfig::default());

        let head: f32 = click[..240].iter().map(|s| s.abs()).fold(0.0, f32::max);
        let tail: f32 = click[click.len() - 240..]
            .iter()
            .map(|s| s.abs())
            .fold(0.0, f32::max);

        assert!(head > 0.3, "click onset should be loud (peak {})", head);
        assert!(tail < 0.01, "click tail should have decayed (peak {})", tail);
    }

    #[test]
    fn test_generate_click_sample_deterministic() {
        let config = ClickConfig::default();
        assert_eq!(
            generate_click_sample(48000, &config),
            generate_click_sample(48000, &config)
        );
    }

    #[test]
    fn test_zero_duration_click_is_empty() {
        let config = ClickConfig {
            duration_ms: 0.0,
            ..ClickConfig::default()
        };
        assert!(generate_click_sample(48000, &config).is_empty());
    }

    #[test]
    fn test_seconds_to_frame() {
        assert_eq!(seconds_to_frame(0.0, 48000), 0);
        assert_eq!(seconds_to_frame(0.5, 48000), 24000);
        assert_eq!(seconds_to_frame(1.0, 44100), 44100);
        assert_eq!(seconds_to_frame(-1.0, 48000), 0);
        assert_eq!(seconds_to_frame(f64::NAN, 48000), 0);
    }

    #[test]
    fn test_frame_to_seconds() {
        assert_eq!(frame_to_seconds(24000, 48000), 0.5);
        assert_eq!(frame_to_seconds(0, 48000), 0.0);
    }
}
