//! TransportController: start/stop state machine for the metronome.
//!
//! Owns the audio session lifetime. `start()` opens a session, seeds the
//! scheduler at the session clock's "now", runs the first pass and hands the
//! scheduler to a [`PollWorker`]. `stop()` joins the worker before the
//! session is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::backend::{AudioBackend, AudioSession};
use super::emitter::{BeatNotifier, EventEmitter};
use super::events::{IndicatorEvent, MetronomeEvent};
use super::poll::PollWorker;
use super::scheduler::{LookaheadScheduler, RunState};
use crate::config::AppConfig;
use crate::error::{log_metronome_error, MetronomeError};
use crate::managers::BroadcastChannelManager;
use crate::timing::{Tempo, TempoHandle, DEFAULT_TEMPO_BPM};

/// Resources alive while Running. Field order matters: the worker is
/// dropped (joined) before the session is released.
struct RunningSession {
    worker: PollWorker,
    audio: Arc<dyn AudioSession>,
}

pub struct TransportController {
    config: AppConfig,
    backend: Arc<dyn AudioBackend>,
    tempo: TempoHandle,
    pub(crate) broadcasts: BroadcastChannelManager,
    session: Mutex<Option<RunningSession>>,
    attached: AtomicBool,
}

impl TransportController {
    /// Controller with the on-disk config and the platform backend.
    pub fn new() -> Result<Self, MetronomeError> {
        Self::from_config(AppConfig::load())
    }

    pub fn from_config(config: AppConfig) -> Result<Self, MetronomeError> {
        let backend = Self::create_backend(&config);
        Self::with_backend(config, backend)
    }

    /// Controller over an explicit backend.
    ///
    /// # Errors
    /// `InvalidConfig` when the scheduler timing is inconsistent.
    pub fn with_backend(
        config: AppConfig,
        backend: Arc<dyn AudioBackend>,
    ) -> Result<Self, MetronomeError> {
        config.scheduler.validate()?;

        let tempo = TempoHandle::new(config.transport.tempo_bpm);
        if Tempo::new(config.transport.tempo_bpm).is_err() {
            log::warn!(
                "[TransportController] Configured tempo {} is invalid, using default",
                config.transport.tempo_bpm
            );
        }
        let broadcasts = BroadcastChannelManager::new(config.notification.channel_capacity);

        Ok(Self {
            config,
            backend,
            tempo,
            broadcasts,
            session: Mutex::new(None),
            attached: AtomicBool::new(false),
        })
    }

    fn create_backend(config: &AppConfig) -> Arc<dyn AudioBackend> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "cpal-backend")] {
                Arc::new(super::backend::CpalBackend::new(config.click.clone()))
            } else {
                let _ = config;
                Arc::new(super::backend::DesktopStubBackend::new())
            }
        }
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<RunningSession>>, MetronomeError> {
        self.session
            .lock()
            .map_err(|_| MetronomeError::LockPoisoned {
                component: "transport session".to_string(),
            })
    }

    // ========================================================================
    // TRANSPORT COMMANDS
    // ========================================================================

    /// Idle -> Running. A no-op when already running.
    ///
    /// # Errors
    /// - `ClockUnavailable` if the audio session cannot be opened; the
    ///   transport stays Idle and `start()` may be retried
    /// - `SchedulerSpawnFailed` if the poll worker cannot be created
    pub fn start(&self) -> Result<(), MetronomeError> {
        let mut guard = self.lock_session()?;
        if guard.is_some() {
            log::debug!("[TransportController] start() ignored, already running");
            return Ok(());
        }

        let audio = self.backend.open_session().map_err(|err| {
            log_metronome_error(&err, "TransportController::start");
            err
        })?;
        let runtime = PollWorker::build_runtime()?;

        let notifier = BeatNotifier::new(
            runtime.handle().clone(),
            self.broadcasts.events_sender(),
            self.broadcasts.indicator_sender(),
            Duration::from_millis(self.config.notification.flash_duration_ms),
        );
        let mut emitter = EventEmitter::new(Arc::clone(&audio), Some(notifier));
        let mut scheduler = LookaheadScheduler::new(&self.config.scheduler, self.tempo.clone());
        let clock = audio.clock();

        // Notifications from the first pass only run once the worker drives
        // the runtime, so Started is always observed first.
        let clock_now = clock.now();
        let first_pass = scheduler.start(clock_now, &mut emitter);
        let tempo = self.tempo.load().bpm();
        self.broadcasts.publish_event(MetronomeEvent::Started { tempo });

        let worker = match PollWorker::spawn(
            runtime,
            scheduler,
            clock,
            emitter,
            self.config.scheduler.poll_interval(),
        ) {
            Ok(worker) => worker,
            Err(err) => {
                log_metronome_error(&err, "TransportController::start");
                self.broadcasts.publish_event(MetronomeEvent::Stopped);
                self.broadcasts.publish_indicator(IndicatorEvent::Off);
                return Err(err);
            }
        };

        log::info!(
            "[TransportController] Started at {:.1} BPM (clock {:.3}s, {} beat(s) in first pass)",
            tempo,
            clock_now,
            first_pass
        );
        *guard = Some(RunningSession { worker, audio });
        Ok(())
    }

    /// Running -> Idle. A no-op when already idle.
    ///
    /// When this returns no scheduler pass or beat notification runs any
    /// more. Clicks already handed to the audio clock may still sound until
    /// the session is released.
    pub fn stop(&self) -> Result<(), MetronomeError> {
        let mut guard = self.lock_session()?;
        let Some(RunningSession { mut worker, audio }) = guard.take() else {
            log::debug!("[TransportController] stop() ignored, not running");
            return Ok(());
        };

        worker.cancel();
        drop(audio);
        drop(guard);

        self.broadcasts.publish_event(MetronomeEvent::Stopped);
        self.broadcasts.publish_indicator(IndicatorEvent::Off);
        log::info!("[TransportController] Stopped");
        Ok(())
    }

    /// Stop if running, start otherwise.
    ///
    /// # Returns
    /// The state after the toggle
    ///
    /// # Errors
    /// `LockPoisoned` if the session lock is poisoned, before any transition
    pub fn toggle(&self) -> Result<RunState, MetronomeError> {
        let running = self.lock_session()?.is_some();
        if running {
            self.stop()?;
            Ok(RunState::Idle)
        } else {
            self.start()?;
            Ok(RunState::Running)
        }
    }

    pub fn run_state(&self) -> RunState {
        if self.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// `false` also when the session lock is poisoned; commands report
    /// that case as `LockPoisoned`.
    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    // ========================================================================
    // TEMPO
    // ========================================================================

    /// Store a new tempo; it applies from the next scheduled beat.
    ///
    /// Invalid values are kept and replaced by the default tempo when read,
    /// so this never fails.
    pub fn set_tempo(&self, bpm: f64) {
        if let Err(err) = Tempo::new(bpm) {
            log::warn!(
                "[TransportController] {}, using {} BPM",
                err,
                DEFAULT_TEMPO_BPM
            );
        }
        self.tempo.set(bpm);
    }

    /// Tempo given as text, e.g. from a form field. Unparseable text selects
    /// the default tempo.
    pub fn set_tempo_text(&self, text: &str) {
        match text.trim().parse::<f64>() {
            Ok(bpm) => self.set_tempo(bpm),
            Err(_) => {
                log::warn!(
                    "[TransportController] Tempo text {:?} is not a number, using {} BPM",
                    text,
                    DEFAULT_TEMPO_BPM
                );
                self.tempo.set(DEFAULT_TEMPO_BPM);
            }
        }
    }

    /// Tempo in effect for the next beat
    pub fn tempo(&self) -> Tempo {
        self.tempo.load()
    }

    // ========================================================================
    // HOST LIFECYCLE
    // ========================================================================

    /// Host presence flag mapped onto start/stop.
    pub fn set_playing(&self, playing: bool) -> Result<(), MetronomeError> {
        if playing {
            self.start()
        } else {
            self.stop()
        }
    }

    /// Called when the host attaches the metronome; starts it if
    /// `auto_start` is configured.
    pub fn attach(&self) -> Result<(), MetronomeError> {
        self.attached.store(true, Ordering::SeqCst);
        if self.config.transport.auto_start {
            self.start()?;
        }
        Ok(())
    }

    /// Called when the host detaches; always stops.
    pub fn detach(&self) -> Result<(), MetronomeError> {
        self.attached.store(false, Ordering::SeqCst);
        self.stop()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    pub fn subscribe_events(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.broadcasts.subscribe_events()
    }

    pub fn subscribe_indicator(&self) -> broadcast::Receiver<IndicatorEvent> {
        self.broadcasts.subscribe_indicator()
    }

    /// Events as an async stream. Messages missed by a lagging consumer are
    /// skipped.
    pub fn event_stream(&self) -> impl Stream<Item = MetronomeEvent> + Send + 'static {
        BroadcastStream::new(self.broadcasts.subscribe_events()).filter_map(|item| async move {
            match item {
                Ok(event) => Some(event),
                Err(err) => {
                    log::warn!("[TransportController] Event stream lagged: {}", err);
                    None
                }
            }
        })
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log_metronome_error(&err, "TransportController::drop");
        }
    }
}

#[cfg(test)]
mod tests;
