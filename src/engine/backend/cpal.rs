//! CPAL-based audio backend for desktop platforms (Linux, macOS, Windows)
//!
//! Each session owns one `AudioEngine` output stream; its frame counter is
//! exposed as the session clock.

use std::sync::Arc;

use crate::audio::engine_cpal::{AudioEngine, DEFAULT_ONSET_QUEUE_SIZE};
use crate::config::ClickConfig;
use crate::error::MetronomeError;
use crate::timing::{ClockSource, FrameClock};

use super::{AudioBackend, AudioSession};

/// CPAL-based audio backend opening the default output device
pub struct CpalBackend {
    click: ClickConfig,
    queue_size: usize,
}

impl CpalBackend {
    pub fn new(click: ClickConfig) -> Self {
        Self {
            click,
            queue_size: DEFAULT_ONSET_QUEUE_SIZE,
        }
    }
}

struct CpalSession {
    engine: AudioEngine,
    clock: Arc<FrameClock>,
}

impl AudioSession for CpalSession {
    fn clock(&self) -> Arc<dyn ClockSource> {
        self.clock.clone()
    }

    fn schedule_click(&self, onset_secs: f64) {
        self.engine.schedule_click(onset_secs);
    }
}

impl AudioBackend for CpalBackend {
    fn open_session(&self) -> Result<Arc<dyn AudioSession>, MetronomeError> {
        let engine = AudioEngine::open(&self.click, self.queue_size)?;
        let clock = Arc::new(FrameClock::new(
            engine.get_frame_counter_ref(),
            engine.sample_rate(),
        ));
        Ok(Arc::new(CpalSession { engine, clock }))
    }
}
