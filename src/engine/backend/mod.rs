//! Backend abstractions for the metronome engine.
//!
//! A backend opens an [`AudioSession`] when the transport starts. The
//! session is the explicit audio resource: it provides the precise clock and
//! accepts click onsets, and it is released when the last handle to it is
//! dropped at stop.

use std::sync::Arc;

use crate::error::MetronomeError;
use crate::timing::ClockSource;

/// Audio resource alive between `start()` and `stop()`.
pub trait AudioSession: Send + Sync {
    /// The precise clock all beat timestamps refer to.
    fn clock(&self) -> Arc<dyn ClockSource>;

    /// Render a click starting at `onset_secs` on [`AudioSession::clock`].
    ///
    /// Fire-and-forget: must not block and reports nothing back.
    fn schedule_click(&self, onset_secs: f64);
}

/// Trait implemented by platform-specific audio backends.
pub trait AudioBackend: Send + Sync {
    /// Acquire the audio clock and output path.
    ///
    /// # Errors
    /// Returns `MetronomeError::ClockUnavailable` when the audio subsystem
    /// cannot be initialized.
    fn open_session(&self) -> Result<Arc<dyn AudioSession>, MetronomeError>;
}

#[cfg(feature = "cpal-backend")]
mod cpal;
#[cfg(feature = "cpal-backend")]
pub use cpal::CpalBackend;

mod desktop_stub;
pub use desktop_stub::{DesktopStubBackend, StubClockMode, StubSession};
