// Session insights - rolling performance summary and difficulty recommendation
//
// Averages use the most recent sessions only so the recommendation follows
// current form; bests scan the whole retained history.

use serde::{Deserialize, Serialize};

use crate::analytics::history::SessionSnapshot;
use crate::session::state::Difficulty;

/// Sessions that feed the rolling averages
pub const ROLLING_WINDOW: usize = 5;

/// Sessions required before a recommendation is based on performance
pub const MIN_SESSIONS_FOR_RECOMMENDATION: usize = 3;

const ELITE_ACCURACY: f32 = 86.0;
const ELITE_WAVE: u32 = 9;
const VETERAN_ACCURACY: f32 = 68.0;
const VETERAN_WAVE: u32 = 5;
const ROOKIE_ACCURACY: f32 = 42.0;

/// Summary shown by the pre-match menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInsights {
    pub total_sessions: usize,
    pub average_accuracy: f32,
    pub average_duration_ms: u64,
    pub best_score: u64,
    pub best_wave: u32,
    pub recommended_difficulty: Difficulty,
}

impl Default for SessionInsights {
    fn default() -> Self {
        Self {
            total_sessions: 0,
            average_accuracy: 0.0,
            average_duration_ms: 0,
            best_score: 0,
            best_wave: 0,
            recommended_difficulty: Difficulty::LOWEST,
        }
    }
}

/// Derive insights from session history (any order)
///
/// Total function: an empty history yields the zero value with the lowest
/// tier recommended.
pub fn derive_session_insights(history: &[SessionSnapshot]) -> SessionInsights {
    if history.is_empty() {
        return SessionInsights::default();
    }

    let mut recent: Vec<&SessionSnapshot> = history.iter().collect();
    recent.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
    recent.truncate(ROLLING_WINDOW);

    let count = recent.len();
    let accuracy_sum: f32 = recent.iter().map(|s| sanitize_accuracy(s.accuracy)).sum();
    let duration_sum: u128 = recent.iter().map(|s| s.duration_ms as u128).sum();

    let average_accuracy = accuracy_sum / count as f32;
    let average_duration_ms = (duration_sum / count as u128) as u64;
    let best_score = history.iter().map(|s| s.score).max().unwrap_or(0);
    let best_wave = history.iter().map(|s| s.highest_wave).max().unwrap_or(0);

    SessionInsights {
        total_sessions: history.len(),
        average_accuracy,
        average_duration_ms,
        best_score,
        best_wave,
        recommended_difficulty: recommend_difficulty(history.len(), average_accuracy, best_wave),
    }
}

/// Difficulty rules, first match wins
pub fn recommend_difficulty(total_sessions: usize, average_accuracy: f32, best_wave: u32) -> Difficulty {
    if total_sessions < MIN_SESSIONS_FOR_RECOMMENDATION {
        Difficulty::Rookie
    } else if average_accuracy >= ELITE_ACCURACY && best_wave >= ELITE_WAVE {
        Difficulty::Elite
    } else if average_accuracy >= VETERAN_ACCURACY && best_wave >= VETERAN_WAVE {
        Difficulty::Veteran
    } else if average_accuracy < ROOKIE_ACCURACY {
        Difficulty::Rookie
    } else {
        Difficulty::Regular
    }
}

fn sanitize_accuracy(accuracy: f32) -> f32 {
    if accuracy.is_finite() {
        accuracy.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, ended_at: u64, accuracy: f32, wave: u32) -> SessionSnapshot {
        SessionSnapshot {
            id: id.to_string(),
            ended_at,
            score: ended_at * 10,
            accuracy,
            kills: 3,
            highest_wave: wave,
            duration_ms: 60_000,
            difficulty: Difficulty::Regular,
        }
    }

    #[test]
    fn test_empty_history() {
        let insights = derive_session_insights(&[]);
        assert_eq!(insights.total_sessions, 0);
        assert_eq!(insights.average_accuracy, 0.0);
        assert_eq!(insights.recommended_difficulty, Difficulty::LOWEST);
    }

    #[test]
    fn test_three_strong_sessions_recommend_elite() {
        let history = vec![
            snapshot("a", 3, 90.0, 10),
            snapshot("b", 2, 88.0, 7),
            snapshot("c", 1, 84.0, 4),
        ];
        let insights = derive_session_insights(&history);
        assert_eq!(insights.total_sessions, 3);
        assert!((insights.average_accuracy - 87.333).abs() < 0.01);
        assert_eq!(insights.best_wave, 10);
        assert_eq!(insights.recommended_difficulty, Difficulty::HIGHEST);
    }

    #[test]
    fn test_too_few_sessions_stay_lowest() {
        let history = vec![snapshot("a", 2, 99.0, 20), snapshot("b", 1, 99.0, 20)];
        assert_eq!(
            derive_session_insights(&history).recommended_difficulty,
            Difficulty::Rookie
        );
    }

    #[test]
    fn test_rolling_window_uses_most_recent() {
        // Old sessions were poor; the five most recent are strong
        let mut history: Vec<SessionSnapshot> =
            (0..5).map(|i| snapshot("old", i, 10.0, 2)).collect();
        history.extend((10..15).map(|i| snapshot("new", i, 80.0, 6)));

        let insights = derive_session_insights(&history);
        assert_eq!(insights.total_sessions, 10);
        assert!((insights.average_accuracy - 80.0).abs() < 1e-4);
        assert_eq!(insights.best_score, 140);
        assert_eq!(insights.recommended_difficulty, Difficulty::Veteran);
    }

    #[test]
    fn test_best_values_scan_whole_history() {
        let mut history: Vec<SessionSnapshot> =
            (10..15).map(|i| snapshot("recent", i, 50.0, 2)).collect();
        history.push(snapshot("ancient", 1, 50.0, 12));

        let insights = derive_session_insights(&history);
        assert_eq!(insights.best_wave, 12);
        assert_eq!(insights.recommended_difficulty, Difficulty::Regular);
    }

    #[test]
    fn test_recommendation_order() {
        assert_eq!(recommend_difficulty(3, 86.0, 9), Difficulty::Elite);
        assert_eq!(recommend_difficulty(3, 86.0, 8), Difficulty::Veteran);
        assert_eq!(recommend_difficulty(3, 68.0, 5), Difficulty::Veteran);
        assert_eq!(recommend_difficulty(3, 68.0, 4), Difficulty::Regular);
        assert_eq!(recommend_difficulty(3, 41.9, 20), Difficulty::Rookie);
        assert_eq!(recommend_difficulty(3, 42.0, 1), Difficulty::Regular);
    }

    #[test]
    fn test_non_finite_accuracy_counts_as_zero() {
        let history = vec![
            snapshot("a", 3, f32::NAN, 1),
            snapshot("b", 2, 90.0, 1),
            snapshot("c", 1, 90.0, 1),
        ];
        let insights = derive_session_insights(&history);
        assert!((insights.average_accuracy - 60.0).abs() < 1e-4);
    }
}
