// Match state - GameState, MatchStats and their enums
//
// GameState is owned by the reducer. Everything else reads snapshots of it;
// nothing outside session::reducer builds a modified copy.

use serde::{Deserialize, Serialize};

/// Upper bound for player health
pub const MAX_HEALTH: u32 = 100;
/// Magazine size of a fresh match
pub const DEFAULT_MAX_AMMO: u32 = 10;
/// Wave a fresh match starts on
pub const FIRST_WAVE: u32 = 1;

/// State-machine discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Menu,
    Playing,
    Paused,
    #[serde(rename = "GAMEOVER")]
    GameOver,
}

/// Difficulty tiers, lowest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Rookie,
    #[default]
    Regular,
    Veteran,
    Elite,
}

impl Difficulty {
    pub const LOWEST: Difficulty = Difficulty::Rookie;
    pub const HIGHEST: Difficulty = Difficulty::Elite;

    pub fn display_name(&self) -> &'static str {
        match self {
            Difficulty::Rookie => "Rookie",
            Difficulty::Regular => "Regular",
            Difficulty::Veteran => "Veteran",
            Difficulty::Elite => "Elite",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rookie" => Ok(Difficulty::Rookie),
            "regular" => Ok(Difficulty::Regular),
            "veteran" => Ok(Difficulty::Veteran),
            "elite" => Ok(Difficulty::Elite),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Per-session counters, reset on every new match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStats {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub enemies_defeated: u32,
    pub highest_wave: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Epoch milliseconds
    pub session_started_at: Option<u64>,
    /// Epoch milliseconds, set when the match reaches GAMEOVER
    pub session_ended_at: Option<u64>,
}

impl Default for MatchStats {
    fn default() -> Self {
        Self {
            shots_fired: 0,
            shots_hit: 0,
            enemies_defeated: 0,
            highest_wave: FIRST_WAVE,
            current_streak: 0,
            best_streak: 0,
            session_started_at: None,
            session_ended_at: None,
        }
    }
}

impl MatchStats {
    /// Hit percentage in [0, 100]; 0 when no shot was fired
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32 * 100.0
        }
    }

    /// Session length, 0 until both ends are known
    pub fn duration_ms(&self) -> u64 {
        match (self.session_started_at, self.session_ended_at) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }
}

/// Complete match state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub ammo: u32,
    pub max_ammo: u32,
    pub score: u64,
    pub health: u32,
    pub status: MatchStatus,
    pub is_reloading: bool,
    /// Epoch milliseconds of the last hit taken
    pub last_damage_time: Option<u64>,
    pub is_game_over: bool,
    pub wave: u32,
    pub difficulty: Difficulty,
    pub stats: MatchStats,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

impl GameState {
    /// Fresh menu state
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            ammo: DEFAULT_MAX_AMMO,
            max_ammo: DEFAULT_MAX_AMMO,
            score: 0,
            health: MAX_HEALTH,
            status: MatchStatus::Menu,
            is_reloading: false,
            last_damage_time: None,
            is_game_over: false,
            wave: FIRST_WAVE,
            difficulty,
            stats: MatchStats::default(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == MatchStatus::Playing
    }
}
