// Session history - snapshots of finished matches and their persistence
//
// History on disk is untrusted. A file that is not a JSON array loads as an
// empty history; individual entries that fail to parse or validate are
// dropped so one bad record never hides the rest. Whatever survives is put
// back into most-recent-first order and cut to the retention cap.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{log_session_error, SessionError};
use crate::session::state::{Difficulty, GameState};

/// Default number of snapshots retained
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// Summary of one finished match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    /// Epoch milliseconds
    pub ended_at: u64,
    pub score: u64,
    /// Hit percentage in [0, 100]
    pub accuracy: f32,
    pub kills: u32,
    pub highest_wave: u32,
    pub duration_ms: u64,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl SessionSnapshot {
    /// Summarize a finished match
    pub fn from_game_state(id: impl Into<String>, state: &GameState) -> Self {
        let stats = &state.stats;
        Self {
            id: id.into(),
            ended_at: stats
                .session_ended_at
                .or(stats.session_started_at)
                .unwrap_or(0),
            score: state.score,
            accuracy: stats.accuracy(),
            kills: stats.enemies_defeated,
            highest_wave: stats.highest_wave,
            duration_ms: stats.duration_ms(),
            difficulty: state.difficulty,
        }
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty() && self.accuracy.is_finite() && (0.0..=100.0).contains(&self.accuracy)
    }
}

/// Prepend `snapshot`, sort by `ended_at` descending and keep `max_items`
///
/// The sort is stable, so snapshots with equal timestamps keep their
/// relative order with the new one first.
pub fn append_session_history(
    history: &[SessionSnapshot],
    snapshot: SessionSnapshot,
    max_items: usize,
) -> Vec<SessionSnapshot> {
    let mut next = Vec::with_capacity(history.len() + 1);
    next.push(snapshot);
    next.extend_from_slice(history);
    normalize_history(next, max_items)
}

/// Sort by `ended_at` descending (stable) and keep at most `max_items`
pub fn normalize_history(mut history: Vec<SessionSnapshot>, max_items: usize) -> Vec<SessionSnapshot> {
    history.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
    history.truncate(max_items);
    history
}

/// Parse history JSON, dropping invalid entries
pub fn parse_history(json: &str) -> Result<Vec<SessionSnapshot>, SessionError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = entries.len();

    let history: Vec<SessionSnapshot> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<SessionSnapshot>(entry).ok())
        .filter(SessionSnapshot::is_valid)
        .collect();

    if history.len() < total {
        log::warn!(
            "[History] Dropped {} invalid session entries",
            total - history.len()
        );
    }
    Ok(history)
}

/// JSON file holding the session history
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_items: usize,
}

impl HistoryStore {
    /// Store retaining [`DEFAULT_HISTORY_CAP`] snapshots
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_capacity(path, DEFAULT_HISTORY_CAP)
    }

    /// Store retaining at most `max_items` snapshots (at least one)
    pub fn with_capacity<P: Into<PathBuf>>(path: P, max_items: usize) -> Self {
        Self {
            path: path.into(),
            max_items: max_items.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load history, most recent first and bounded by the store capacity
    ///
    /// A missing file is an empty history.
    ///
    /// # Errors
    /// * `SessionError::HistoryCorrupt` - file is not a JSON array
    /// * `SessionError::Io` - file exists but cannot be read
    pub fn try_load(&self) -> Result<Vec<SessionSnapshot>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let history = parse_history(&contents)?;
                let total = history.len();
                let history = normalize_history(history, self.max_items);
                if history.len() < total {
                    log::info!(
                        "[History] Keeping the {} most recent of {} stored sessions",
                        history.len(),
                        total
                    );
                }
                Ok(history)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Load history, treating any failure as an empty history
    pub fn load(&self) -> Vec<SessionSnapshot> {
        self.try_load().unwrap_or_else(|err| {
            log_session_error(&err, "HistoryStore::load");
            Vec::new()
        })
    }

    /// Write history as pretty JSON, creating parent directories
    pub fn save(&self, history: &[SessionSnapshot]) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(history)
            .map_err(|err| SessionError::Io {
                reason: err.to_string(),
            })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
