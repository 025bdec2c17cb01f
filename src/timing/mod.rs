// Timing module - tempo values and the audio-clock abstraction

pub mod clock;
pub mod tempo;

pub use clock::{ClockSource, FrameClock, InstantClock, ManualClock};
pub use tempo::{Tempo, TempoHandle, DEFAULT_TEMPO_BPM};
