//! Session analytics: finished-match snapshots, history persistence and
//! the insights shown before the next match.

pub mod history;
pub mod insights;

pub use history::{
    append_session_history, normalize_history, HistoryStore, SessionSnapshot, DEFAULT_HISTORY_CAP,
};
pub use insights::{derive_session_insights, recommend_difficulty, SessionInsights};
