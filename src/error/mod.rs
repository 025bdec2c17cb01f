// Error types for the metronome engine
//
// This module defines the error type for transport and scheduling operations,
// providing structured error handling with numeric codes for host applications.

mod metronome;

pub use metronome::{log_metronome_error, MetronomeError, MetronomeErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// host integrations.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
