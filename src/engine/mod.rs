//! Engine module housing the metronome core.
//!
//! `backend` opens audio sessions, `scheduler` decides which beats are due,
//! `emitter` hands them to the audio clock and the event channels, and
//! `core` ties them together in the `TransportController`.

pub mod backend;
pub mod core;
pub mod emitter;
pub mod events;
pub mod offline;
pub mod poll;
pub mod scheduler;

#[cfg(feature = "cpal-backend")]
pub use backend::CpalBackend;
pub use backend::{AudioBackend, AudioSession, DesktopStubBackend, StubClockMode};
pub use core::TransportController;
pub use emitter::{BeatNotifier, EventEmitter};
pub use events::{IndicatorEvent, MetronomeEvent};
pub use offline::{simulate, OfflineRun, PollJitter, SimulationOptions, TempoChange};
pub use scheduler::{BeatSink, LookaheadScheduler, RunState, ScheduledBeat};
