//! Offline rendering of a beat schedule into PCM and WAV files.
//!
//! Mixes the click voice at the exact frame of every scheduled beat, the
//! same way the live output callback does, so a simulated session can be
//! listened to or inspected without an audio device.

use std::path::Path;

use anyhow::{Context, Result};

use super::metronome::{generate_click_sample, seconds_to_frame};
use crate::config::ClickConfig;
use crate::engine::ScheduledBeat;

/// Render `beats` into a mono buffer of `duration_secs`.
///
/// Overlapping clicks are summed and the result is clamped to [-1.0, 1.0].
/// Beats starting past the end of the buffer are ignored; clicks running
/// past the end are truncated.
pub fn render_beats(
    beats: &[ScheduledBeat],
    sample_rate: u32,
    duration_secs: f64,
    click: &ClickConfig,
) -> Vec<f32> {
    let total_frames = seconds_to_frame(duration_secs, sample_rate) as usize;
    let click_samples = generate_click_sample(sample_rate, click);
    let mut buffer = vec![0.0f32; total_frames];

    for beat in beats {
        let onset = seconds_to_frame(beat.timestamp, sample_rate) as usize;
        if onset >= total_frames {
            continue;
        }
        let end = (onset + click_samples.len()).min(total_frames);
        for (out, sample) in buffer[onset..end].iter_mut().zip(click_samples.iter()) {
            *out += *sample;
        }
    }

    for sample in &mut buffer {
        *sample = sample.clamp(-1.0, 1.0);
    }

    buffer
}

/// Write mono float samples to a 32-bit float WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;

    Ok(())
}
