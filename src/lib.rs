// Pulse Metronome Core - lookahead beat scheduling on an audio clock
// A coarse poll commits clicks a short window ahead; the audio side plays them sample-accurately

// Module declarations
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod managers;
pub mod timing;

// Re-exports for convenience
pub use config::AppConfig;
pub use engine::{IndicatorEvent, MetronomeEvent, RunState, TransportController};
pub use error::MetronomeError;
pub use timing::{Tempo, DEFAULT_TEMPO_BPM};

/// Install a `tracing` fmt subscriber at `level`, writing to stderr.
///
/// `log` records from the library are forwarded through it. Calling this
/// twice is harmless; the second call leaves the first subscriber in place.
pub fn init_logging(level: tracing::Level) {
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        log::debug!("Logging already initialized");
    }
}
