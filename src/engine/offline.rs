//! Offline simulation of the poll loop against a manual clock.
//!
//! Produces the exact beat schedule a live transport would commit, without
//! audio hardware or wall-clock waiting. Used by the CLI `plan` and `render`
//! commands and by property tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::scheduler::{LookaheadScheduler, ScheduledBeat};
use crate::config::SchedulerConfig;
use crate::error::MetronomeError;
use crate::timing::TempoHandle;

/// A tempo change applied once the simulated clock reaches `at_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub at_secs: f64,
    pub bpm: f64,
}

/// Random extra delay added to each simulated poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollJitter {
    pub max_ms: f64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub tempo_bpm: f64,
    pub duration_secs: f64,
    pub tempo_changes: Vec<TempoChange>,
    pub jitter: Option<PollJitter>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            tempo_bpm: crate::timing::DEFAULT_TEMPO_BPM,
            duration_secs: 4.0,
            tempo_changes: Vec::new(),
            jitter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineRun {
    pub beats: Vec<ScheduledBeat>,
    /// Number of poll passes simulated, including the first
    pub passes: usize,
}

/// Run the scheduler from clock 0 until `duration_secs`.
///
/// The clock advances by the poll interval (plus jitter) between passes.
/// Beats at or beyond `duration_secs` are dropped from the result.
///
/// # Errors
/// `InvalidConfig` if the scheduler config does not validate, or the
/// duration or the jitter bound is not a finite non-negative number.
pub fn simulate(
    config: &SchedulerConfig,
    options: &SimulationOptions,
) -> Result<OfflineRun, MetronomeError> {
    config.validate()?;
    if !(options.duration_secs.is_finite() && options.duration_secs >= 0.0) {
        return Err(MetronomeError::InvalidConfig {
            reason: format!("duration must be non-negative (got {})", options.duration_secs),
        });
    }
    if let Some(jitter) = options.jitter {
        if !(jitter.max_ms.is_finite() && jitter.max_ms >= 0.0) {
            return Err(MetronomeError::InvalidConfig {
                reason: format!("jitter must be finite and non-negative (got {} ms)", jitter.max_ms),
            });
        }
    }

    let tempo = TempoHandle::new(options.tempo_bpm);
    let mut scheduler = LookaheadScheduler::new(config, tempo.clone());
    let mut rng = options.jitter.map(|j| StdRng::seed_from_u64(j.seed));
    let poll_secs = config.poll_interval_ms as f64 / 1000.0;

    let mut changes = options.tempo_changes.clone();
    changes.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
    let mut changes = changes.into_iter().peekable();

    let mut beats: Vec<ScheduledBeat> = Vec::new();
    let mut clock_now = 0.0;
    while let Some(change) = changes.next_if(|c| c.at_secs <= clock_now) {
        tempo.set(change.bpm);
    }
    scheduler.start(clock_now, &mut beats);
    let mut passes = 1;

    while clock_now < options.duration_secs {
        let mut step = poll_secs;
        if let (Some(rng), Some(jitter)) = (rng.as_mut(), options.jitter) {
            if jitter.max_ms > 0.0 {
                step += rng.gen_range(0.0..jitter.max_ms) / 1000.0;
            }
        }
        clock_now += step;

        while let Some(change) = changes.next_if(|c| c.at_secs <= clock_now) {
            tempo.set(change.bpm);
        }

        scheduler.run_pass(clock_now, &mut beats);
        passes += 1;
    }

    beats.retain(|b| b.timestamp < options.duration_secs);
    Ok(OfflineRun { beats, passes })
}
