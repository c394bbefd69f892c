//! Match session: game state, the pure reducer, the store that serializes
//! dispatches, and the effect layer that owns timers and haptics.

pub mod effects;
pub mod reducer;
pub mod state;
pub mod store;

pub use effects::{
    EffectOrchestrator, EffectTimings, HapticDevice, HapticPattern, NullHaptics, RecordingHaptics,
};
pub use reducer::{reduce, Action};
pub use state::{Difficulty, GameState, MatchStats, MatchStatus};
pub use store::{MatchStore, Transition};
