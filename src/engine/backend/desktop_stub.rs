use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::MetronomeError;
use crate::timing::{ClockSource, InstantClock, ManualClock};

use super::{AudioBackend, AudioSession};

/// Where stub sessions take their clock from.
#[derive(Clone)]
pub enum StubClockMode {
    /// A fresh `InstantClock` per session, starting at zero
    Realtime,
    /// A shared clock advanced by the caller
    Manual(Arc<ManualClock>),
}

/// Desktop stub backend used for deterministic testing and CLI tooling.
///
/// Sessions produce no sound; every scheduled click is recorded instead.
/// The backend can be switched to simulate an audio subsystem that fails to
/// initialize.
pub struct DesktopStubBackend {
    available: AtomicBool,
    clock_mode: StubClockMode,
    sessions_opened: AtomicUsize,
    live_sessions: Arc<AtomicUsize>,
    clicks: Arc<Mutex<Vec<f64>>>,
}

impl DesktopStubBackend {
    pub fn new() -> Self {
        Self::with_clock_mode(StubClockMode::Realtime)
    }

    pub fn with_manual_clock(clock: Arc<ManualClock>) -> Self {
        Self::with_clock_mode(StubClockMode::Manual(clock))
    }

    pub fn with_clock_mode(clock_mode: StubClockMode) -> Self {
        Self {
            available: AtomicBool::new(true),
            clock_mode,
            sessions_opened: AtomicUsize::new(0),
            live_sessions: Arc::new(AtomicUsize::new(0)),
            clicks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A backend whose clock can never be acquired
    pub fn unavailable() -> Self {
        let backend = Self::new();
        backend.set_available(false);
        backend
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Sessions successfully opened so far
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet released
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    /// Every click onset scheduled on any session, in scheduling order
    pub fn scheduled_clicks(&self) -> Vec<f64> {
        self.clicks
            .lock()
            .map(|clicks| clicks.clone())
            .unwrap_or_default()
    }
}

impl Default for DesktopStubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for DesktopStubBackend {
    fn open_session(&self) -> Result<Arc<dyn AudioSession>, MetronomeError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(MetronomeError::ClockUnavailable {
                reason: "stub audio subsystem disabled".to_string(),
            });
        }

        let clock: Arc<dyn ClockSource> = match &self.clock_mode {
            StubClockMode::Realtime => Arc::new(InstantClock::new()),
            StubClockMode::Manual(clock) => clock.clone(),
        };

        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.live_sessions.fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(StubSession {
            clock,
            clicks: Arc::clone(&self.clicks),
            live_sessions: Arc::clone(&self.live_sessions),
        }))
    }
}

/// Session handed out by [`DesktopStubBackend`].
pub struct StubSession {
    clock: Arc<dyn ClockSource>,
    clicks: Arc<Mutex<Vec<f64>>>,
    live_sessions: Arc<AtomicUsize>,
}

impl AudioSession for StubSession {
    fn clock(&self) -> Arc<dyn ClockSource> {
        Arc::clone(&self.clock)
    }

    fn schedule_click(&self, onset_secs: f64) {
        match self.clicks.lock() {
            Ok(mut clicks) => clicks.push(onset_secs),
            Err(_) => log::error!("[StubSession] Click log lock poisoned"),
        }
    }
}

impl Drop for StubSession {
    fn drop(&mut self) {
        self.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
