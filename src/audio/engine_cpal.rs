//! AudioEngine - cpal output stream acting as the precise clock domain
//!
//! The output callback owns the only writer of the frame counter, so
//! `frames / sample_rate` is the audio clock. Click onsets arrive as frame
//! positions through a lock-free SPSC queue and start exactly at their frame.
//!
//! Thread model:
//! - Audio thread: owns the `cpal::Stream` for its whole life (streams are
//!   not `Send` on every platform) and parks until shutdown
//! - Device callback: renders clicks, advances the frame counter
//! - Scheduler side: pushes onset frames, never blocks on the callback

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::metronome::{generate_click_sample, seconds_to_frame};
use crate::config::ClickConfig;
use crate::error::MetronomeError;

/// Onsets that may be queued ahead of the callback
pub const DEFAULT_ONSET_QUEUE_SIZE: usize = 256;

/// Output engine wrapping a running cpal stream.
///
/// Dropping the engine stops the stream and joins the audio thread.
pub struct AudioEngine {
    /// Frames rendered since the stream started
    frame_counter: Arc<AtomicU64>,
    /// Device sample rate in Hz
    sample_rate: u32,
    /// Producer side of the onset queue
    onsets: Mutex<rtrb::Producer<u64>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Open the default output device and start rendering silence.
    ///
    /// # Errors
    /// Returns `MetronomeError::ClockUnavailable` when no device, no usable
    /// config or no stream can be obtained.
    pub fn open(click: &ClickConfig, queue_size: usize) -> Result<Self, MetronomeError> {
        let frame_counter = Arc::new(AtomicU64::new(0));
        let (producer, consumer) = rtrb::RingBuffer::<u64>::new(queue_size);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, MetronomeError>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_counter = Arc::clone(&frame_counter);
        let click = click.clone();
        let thread = std::thread::Builder::new()
            .name("metronome-audio".to_string())
            .spawn(move || {
                let stream = match build_output_stream(thread_counter, consumer, &click) {
                    Ok((stream, sample_rate)) => {
                        let _ = ready_tx.send(Ok(sample_rate));
                        stream
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                // Park until the engine is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
                log::debug!("[AudioEngine] Output stream closed");
            })
            .map_err(|e| MetronomeError::ClockUnavailable {
                reason: format!("Failed to spawn audio thread: {}", e),
            })?;

        let sample_rate = match ready_rx.recv() {
            Ok(Ok(sample_rate)) => sample_rate,
            Ok(Err(err)) => {
                let _ = thread.join();
                return Err(err);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(MetronomeError::ClockUnavailable {
                    reason: "Audio thread exited before the stream started".to_string(),
                });
            }
        };

        log::info!("[AudioEngine] Output stream running at {} Hz", sample_rate);

        Ok(Self {
            frame_counter,
            sample_rate,
            onsets: Mutex::new(producer),
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Queue a click to start at `onset_secs` on the audio clock.
    ///
    /// Onsets already in the past start on the next rendered frame.
    /// Never blocks; a full queue drops the click with a warning.
    pub fn schedule_click(&self, onset_secs: f64) {
        let frame = seconds_to_frame(onset_secs, self.sample_rate);
        match self.onsets.lock() {
            Ok(mut producer) => {
                if producer.push(frame).is_err() {
                    log::warn!(
                        "[AudioEngine] Onset queue full, dropping click at frame {}",
                        frame
                    );
                }
            }
            Err(_) => log::error!("[AudioEngine] Onset queue lock poisoned"),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Shared reference to the frame counter, for building a `FrameClock`
    pub fn get_frame_counter_ref(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frame_counter)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn build_output_stream(
    frame_counter: Arc<AtomicU64>,
    mut onsets: rtrb::Consumer<u64>,
    click: &ClickConfig,
) -> Result<(cpal::Stream, u32), MetronomeError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| MetronomeError::ClockUnavailable {
            reason: "No default output device found".to_string(),
        })?;

    let config = device
        .default_output_config()
        .map_err(|e| MetronomeError::ClockUnavailable {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    let stream_config: cpal::StreamConfig = config.clone().into();
    let channels_count = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;
    let click_samples = generate_click_sample(sample_rate, click);
    let mut click_pos = click_samples.len();

    let err_fn = |err| log::error!("[AudioEngine] Output stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // data.len() = frames * channels
                let frame_count = data.len() / channels_count;
                let current_frame_start = frame_counter.load(Ordering::Relaxed);

                for i in 0..frame_count {
                    let frame_idx = current_frame_start + i as u64;

                    // Onsets are queued in increasing order
                    while let Ok(&onset) = onsets.peek() {
                        if onset > frame_idx {
                            break;
                        }
                        let _ = onsets.pop();
                        click_pos = 0;
                    }

                    let mut sample_val = 0.0;
                    if click_pos < click_samples.len() {
                        sample_val = click_samples[click_pos];
                        click_pos += 1;
                    }

                    for ch in 0..channels_count {
                        data[i * channels_count + ch] = sample_val;
                    }
                }

                frame_counter.fetch_add(frame_count as u64, Ordering::Release);
            },
            err_fn,
            None,
        ),
        _ => {
            return Err(MetronomeError::ClockUnavailable {
                reason: "Only F32 sample format is currently supported for output".to_string(),
            })
        }
    }
    .map_err(|e| MetronomeError::ClockUnavailable {
        reason: format!("{:?}", e),
    })?;

    stream.play().map_err(|e| MetronomeError::ClockUnavailable {
        reason: format!("Output start failed: {}", e),
    })?;

    Ok((stream, sample_rate))
}
