//! LookaheadScheduler - commits beats a short window ahead of the audio clock
//!
//! A coarse, jittery poll calls [`LookaheadScheduler::run_pass`] with a
//! reading of the precise clock. Each pass emits every beat whose timestamp
//! falls before `clock_now + lookahead`, so the audio side always holds the
//! next beats even when a wake-up arrives late.
//!
//! Invariants:
//! - Beats are emitted in strictly increasing timestamp order
//! - The cursor advances by exactly the beat interval read for that beat
//! - A late pass batches every due beat; no sequence index is skipped

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::error::MetronomeError;
use crate::timing::{Tempo, TempoHandle};

/// Transport run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
}

/// A beat committed to the audio clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledBeat {
    /// Onset on the audio clock, in seconds
    pub timestamp: f64,
    /// Position of the beat since start, gap-free
    pub sequence_index: u64,
    /// Tempo read when the beat was scheduled
    pub tempo_bpm: f64,
}

/// Receiver of scheduled beats.
pub trait BeatSink {
    /// Called once per beat, in order. `clock_now` is the clock reading the
    /// pass was started with.
    fn emit_beat(&mut self, beat: &ScheduledBeat, clock_now: f64);
}

impl BeatSink for Vec<ScheduledBeat> {
    fn emit_beat(&mut self, beat: &ScheduledBeat, _clock_now: f64) {
        self.push(*beat);
    }
}

pub struct LookaheadScheduler {
    tempo: TempoHandle,
    lookahead_secs: f64,
    max_beats_per_pass: usize,
    /// Timestamp of the next beat not yet scheduled
    cursor: f64,
    next_sequence_index: u64,
    state: RunState,
}

impl LookaheadScheduler {
    pub fn new(config: &SchedulerConfig, tempo: TempoHandle) -> Self {
        Self {
            tempo,
            lookahead_secs: config.lookahead_secs,
            max_beats_per_pass: config.max_beats_per_pass.max(1),
            cursor: 0.0,
            next_sequence_index: 0,
            state: RunState::Idle,
        }
    }

    /// Seed the cursor at `clock_now` and run the first pass.
    ///
    /// # Returns
    /// Number of beats emitted by the first pass
    pub fn start(&mut self, clock_now: f64, sink: &mut dyn BeatSink) -> usize {
        self.cursor = clock_now;
        self.next_sequence_index = 0;
        self.state = RunState::Running;
        self.run_pass(clock_now, sink)
    }

    /// Emit every beat due before `clock_now + lookahead`.
    ///
    /// The tempo is re-read for every beat, so a change made while the pass
    /// runs only affects beats not yet emitted. At most
    /// `max_beats_per_pass` beats are emitted; the remainder stays pending
    /// for the next pass.
    ///
    /// # Returns
    /// Number of beats emitted (0 when idle)
    pub fn run_pass(&mut self, clock_now: f64, sink: &mut dyn BeatSink) -> usize {
        if self.state != RunState::Running {
            return 0;
        }

        let horizon = clock_now + self.lookahead_secs;
        let mut emitted = 0;

        while self.cursor < horizon {
            if emitted == self.max_beats_per_pass {
                log::warn!(
                    "[Scheduler] Pass capped at {} beats; deferring beats from {:.3}s (clock {:.3}s)",
                    self.max_beats_per_pass,
                    self.cursor,
                    clock_now
                );
                break;
            }

            let mut tempo = self.tempo.load();
            if !advances(self.cursor, tempo) {
                log::warn!(
                    "[Scheduler] {}: interval does not advance from {:.3}s, using default",
                    MetronomeError::InvalidTempo { bpm: tempo.bpm() },
                    self.cursor
                );
                tempo = Tempo::default();
                if !advances(self.cursor, tempo) {
                    log::error!(
                        "[Scheduler] Cursor {:.3}s cannot advance, pass aborted",
                        self.cursor
                    );
                    break;
                }
            }

            let beat = ScheduledBeat {
                timestamp: self.cursor,
                sequence_index: self.next_sequence_index,
                tempo_bpm: tempo.bpm(),
            };
            sink.emit_beat(&beat, clock_now);

            self.cursor += tempo.beat_interval();
            self.next_sequence_index += 1;
            emitted += 1;
        }

        emitted
    }

    /// Stop scheduling. The cursor is left where it is.
    pub fn stop(&mut self) {
        self.state = RunState::Idle;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn next_sequence_index(&self) -> u64 {
        self.next_sequence_index
    }
}

/// Whether one beat interval moves `cursor` forward in f64.
fn advances(cursor: f64, tempo: Tempo) -> bool {
    cursor + tempo.beat_interval() > cursor
}
