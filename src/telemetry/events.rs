//! Core telemetry event types describing diagnostics data exposed to
//! CLI surfaces and stream subscribers.

use serde::{Deserialize, Serialize};

use crate::analysis::smoothing::HandState;
use crate::session::state::{Difficulty, MatchStatus};

/// High-level lifecycle stages reported by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    EngineStarted,
    DetectionStarted,
    DetectionStopped,
    CalibrationStarted,
    CalibrationFinished,
    EngineStopped,
}

/// Diagnostic error codes surfaced via telemetry metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticError {
    FixtureLoad,
    HistoryLoad,
    HistorySave,
    DetectionFailed,
    CalibrationRejected,
    Unknown,
}

/// Metric events covering frame latency, gestures, match actions and lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    /// Rolling per-frame processing latency
    FrameLatency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    HandStateChanged {
        state: HandState,
    },
    Action {
        action: String,
        applied: bool,
        status: MatchStatus,
    },
    SessionEnded {
        score: u64,
        accuracy: f32,
        highest_wave: u32,
        difficulty: Difficulty,
    },
    CalibrationUpdated {
        center_x: f32,
        center_y: f32,
        smoothing_frames: u8,
    },
    Lifecycle {
        phase: LifecyclePhase,
        timestamp_ms: u64,
    },
    Error {
        code: DiagnosticError,
        context: String,
    },
}
