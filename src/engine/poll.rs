//! Poll worker: the coarse repeating wake-up that drives scheduler passes.
//!
//! Runs on its own thread with a current-thread tokio runtime. The runtime
//! times the wake-ups and also hosts the emitter's notification tasks, so
//! joining the thread cancels everything still pending.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;

use super::emitter::EventEmitter;
use super::scheduler::LookaheadScheduler;
use crate::error::MetronomeError;
use crate::timing::ClockSource;

pub struct PollWorker {
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollWorker {
    /// Runtime the worker will drive. Build it first so notification tasks
    /// for the synchronous first pass can be queued before the thread starts.
    pub fn build_runtime() -> Result<Runtime, MetronomeError> {
        Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|err| MetronomeError::SchedulerSpawnFailed {
                reason: format!("tokio runtime: {}", err),
            })
    }

    /// Move the scheduler and emitter onto a new "metronome-poll" thread and
    /// run one pass per `poll_interval` until cancelled.
    pub fn spawn(
        runtime: Runtime,
        mut scheduler: LookaheadScheduler,
        clock: Arc<dyn ClockSource>,
        mut emitter: EventEmitter,
        poll_interval: Duration,
    ) -> Result<Self, MetronomeError> {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("metronome-poll".to_string())
            .spawn(move || {
                tracing::debug!(?poll_interval, "poll worker started");

                runtime.block_on(async {
                    loop {
                        tokio::select! {
                            _ = &mut shutdown_rx => break,
                            _ = tokio::time::sleep(poll_interval) => {
                                let clock_now = clock.now();
                                let emitted = scheduler.run_pass(clock_now, &mut emitter);
                                if emitted > 0 {
                                    tracing::trace!(
                                        clock_now,
                                        emitted,
                                        cursor = scheduler.cursor(),
                                        "scheduler pass"
                                    );
                                }
                            }
                        }
                    }
                });

                scheduler.stop();
                tracing::debug!(
                    beats = scheduler.next_sequence_index(),
                    "poll worker stopped"
                );
                // Dropping the runtime here cancels pending notifications
                drop(runtime);
            })?;

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Signal the worker and wait for it to exit.
    ///
    /// Once this returns no pass runs and no notification fires.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("[PollWorker] Poll thread panicked");
            }
        }
    }
}

impl Drop for PollWorker {
    fn drop(&mut self) {
        self.cancel();
    }
}
