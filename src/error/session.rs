// Session error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Session error code constants
///
/// Error code range: 4001-4004
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Persisted session history could not be parsed
    pub const HISTORY_CORRUPT: i32 = 4001;

    /// Reading or writing persisted data failed
    pub const IO: i32 = 4002;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 4003;

    /// Camera or landmark detector reported a failure
    pub const DETECTION_FAILED: i32 = 4004;
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=MatchSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Session-related errors
///
/// None of these are raised for illegal match transitions; those are no-ops.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Persisted history JSON was malformed
    HistoryCorrupt { reason: String },

    /// Filesystem failure while loading or saving
    Io { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Detection collaborator failed; surfaced to the user, not recovered here
    DetectionFailed { reason: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::HistoryCorrupt { .. } => SessionErrorCodes::HISTORY_CORRUPT,
            SessionError::Io { .. } => SessionErrorCodes::IO,
            SessionError::LockPoisoned { .. } => SessionErrorCodes::LOCK_POISONED,
            SessionError::DetectionFailed { .. } => SessionErrorCodes::DETECTION_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::HistoryCorrupt { reason } => {
                format!("Session history corrupt: {}", reason)
            }
            SessionError::Io { reason } => format!("I/O failure: {}", reason),
            SessionError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
            SessionError::DetectionFailed { reason } => {
                format!("Hand detection failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::HistoryCorrupt {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_codes() {
        assert_eq!(
            SessionError::HistoryCorrupt {
                reason: "x".to_string()
            }
            .code(),
            4001
        );
        assert_eq!(
            SessionError::Io {
                reason: "x".to_string()
            }
            .code(),
            4002
        );
        assert_eq!(
            SessionError::LockPoisoned {
                component: "MatchStore".to_string()
            }
            .code(),
            4003
        );
        assert_eq!(
            SessionError::DetectionFailed {
                reason: "camera".to_string()
            }
            .code(),
            4004
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SessionError = io.into();
        assert!(matches!(err, SessionError::Io { .. }));
        assert!(err.message().contains("missing"));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::LockPoisoned {
            component: "MatchStore".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("SessionError"));
        assert!(display.contains("4003"));
    }
}
