//! EventEmitter - hands beats to the audio clock and schedules notifications
//!
//! Two independent paths per beat:
//! - Audio: the exact timestamp goes to the [`AudioSession`], which renders
//!   the click sample-accurately on its own clock
//! - Notification: a best-effort timer task fires roughly when the beat
//!   sounds and publishes `Beat` plus an indicator flash. It carries no
//!   accuracy guarantee and may run late under load.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use super::backend::AudioSession;
use super::events::{IndicatorEvent, MetronomeEvent};
use super::scheduler::{BeatSink, ScheduledBeat};

/// Best-effort notification channel driven by a tokio runtime.
#[derive(Clone)]
pub struct BeatNotifier {
    runtime: Handle,
    events: broadcast::Sender<MetronomeEvent>,
    indicator: broadcast::Sender<IndicatorEvent>,
    flash_duration: Duration,
}

impl BeatNotifier {
    pub fn new(
        runtime: Handle,
        events: broadcast::Sender<MetronomeEvent>,
        indicator: broadcast::Sender<IndicatorEvent>,
        flash_duration: Duration,
    ) -> Self {
        Self {
            runtime,
            events,
            indicator,
            flash_duration,
        }
    }

    /// Arrange the `Beat` event and flash to fire after `delay`.
    pub fn notify_after(&self, beat: &ScheduledBeat, delay: Duration) {
        let events = self.events.clone();
        let indicator = self.indicator.clone();
        let flash_duration = self.flash_duration;
        let beat = *beat;

        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let _ = indicator.send(IndicatorEvent::FlashOn {
                sequence_index: beat.sequence_index,
            });
            let _ = events.send(MetronomeEvent::Beat {
                tempo: beat.tempo_bpm,
                sequence_index: beat.sequence_index,
                timestamp: beat.timestamp,
            });

            tokio::time::sleep(flash_duration).await;
            let _ = indicator.send(IndicatorEvent::FlashOff);
        });
    }
}

/// Wall-clock delay until a beat sounds, as seen from `clock_now`.
///
/// Beats already due, and readings that are not finite, fire immediately.
pub fn notification_delay(beat_timestamp: f64, clock_now: f64) -> Duration {
    let delay = beat_timestamp - clock_now;
    if delay.is_finite() && delay > 0.0 {
        Duration::from_secs_f64(delay)
    } else {
        Duration::ZERO
    }
}

pub struct EventEmitter {
    session: Arc<dyn AudioSession>,
    notifier: Option<BeatNotifier>,
}

impl EventEmitter {
    pub fn new(session: Arc<dyn AudioSession>, notifier: Option<BeatNotifier>) -> Self {
        Self { session, notifier }
    }
}

impl BeatSink for EventEmitter {
    fn emit_beat(&mut self, beat: &ScheduledBeat, clock_now: f64) {
        self.session.schedule_click(beat.timestamp);

        if let Some(notifier) = &self.notifier {
            notifier.notify_after(beat, notification_delay(beat.timestamp, clock_now));
        }
    }
}
