// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Error code range: 3001-3007
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// A profile field is outside its documented bounds
    pub const OUT_OF_RANGE: i32 = 3001;

    /// Not enough neutral-pose samples collected
    pub const INSUFFICIENT_SAMPLES: i32 = 3002;

    /// A calibration sample was rejected
    pub const INVALID_SAMPLE: i32 = 3003;

    /// Calibration profile RwLock was poisoned
    pub const STATE_POISONED: i32 = 3004;

    /// Profile could not be read from or written to storage
    pub const STORAGE: i32 = 3005;

    /// A calibration procedure is already running
    pub const ALREADY_IN_PROGRESS: i32 = 3006;

    /// No calibration procedure is running
    pub const NOT_IN_PROGRESS: i32 = 3007;
}

/// Log a calibration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationProfile, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// Rejected at the configuration boundary; the previously valid profile is
/// always retained when one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Field value outside its documented bounds
    OutOfRange { field: &'static str, value: f64 },

    /// Calibration procedure finalized before enough samples arrived
    InsufficientSamples { required: usize, collected: usize },

    /// Sample rejected during the calibration procedure
    InvalidSample { reason: String },

    /// Calibration profile RwLock was poisoned
    StatePoisoned,

    /// Reading or writing the persisted profile failed
    Storage { reason: String },

    /// Calibration already in progress
    AlreadyInProgress,

    /// Sample or finish requested without a running procedure
    NotInProgress,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::OutOfRange { .. } => CalibrationErrorCodes::OUT_OF_RANGE,
            CalibrationError::InsufficientSamples { .. } => {
                CalibrationErrorCodes::INSUFFICIENT_SAMPLES
            }
            CalibrationError::InvalidSample { .. } => CalibrationErrorCodes::INVALID_SAMPLE,
            CalibrationError::StatePoisoned => CalibrationErrorCodes::STATE_POISONED,
            CalibrationError::Storage { .. } => CalibrationErrorCodes::STORAGE,
            CalibrationError::AlreadyInProgress => CalibrationErrorCodes::ALREADY_IN_PROGRESS,
            CalibrationError::NotInProgress => CalibrationErrorCodes::NOT_IN_PROGRESS,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::OutOfRange { field, value } => {
                format!("{} out of range: {}", field, value)
            }
            CalibrationError::InsufficientSamples {
                required,
                collected,
            } => {
                format!("Insufficient samples: need {}, got {}", required, collected)
            }
            CalibrationError::InvalidSample { reason } => {
                format!("Invalid sample: {}", reason)
            }
            CalibrationError::StatePoisoned => "Calibration profile lock poisoned".to_string(),
            CalibrationError::Storage { reason } => {
                format!("Calibration storage failed: {}", reason)
            }
            CalibrationError::AlreadyInProgress => "Calibration already in progress".to_string(),
            CalibrationError::NotInProgress => "No calibration in progress".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

impl From<std::io::Error> for CalibrationError {
    fn from(err: std::io::Error) -> Self {
        CalibrationError::Storage {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CalibrationError {
    fn from(err: serde_json::Error) -> Self {
        CalibrationError::Storage {
            reason: err.to_string(),
        }
    }
}
