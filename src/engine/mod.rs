//! Engine module housing the reusable gesture/match core.
//!
//! This module exposes the time sources (`clock`) and the `EngineHandle`
//! orchestration layer (`core`) shared by the CLI and embedding front-ends.

pub mod clock;
pub mod core;

pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use core::{EngineHandle, EngineOptions, FrameOutcome, KeyboardCommand};
