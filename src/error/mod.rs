// Error types for the gesture strike core
//
// This module defines custom error types for calibration and session
// operations, providing structured error handling with stable numeric codes
// that front-ends can map to user-facing messages.
//
// Illegal match transitions are deliberately absent: the reducer treats them
// as no-ops, never as errors.

mod calibration;
mod session;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the UI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
