// Audio module - click generation, offline rendering and device output

#[cfg(feature = "cpal-backend")]
pub mod engine_cpal;
pub mod metronome;
pub mod render;

// Re-export commonly used types for convenience
#[cfg(feature = "cpal-backend")]
pub use engine_cpal::AudioEngine;
pub use metronome::{frame_to_seconds, generate_click_sample, seconds_to_frame};
pub use render::{render_beats, write_wav};
