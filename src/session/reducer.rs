// Reducer - pure match state machine
//
// reduce(state, action) -> state, with no hidden state and no side effects.
//
// Status transitions:
//   MENU --START_MATCH--> PLAYING <--PAUSE/RESUME--> PAUSED
//   PLAYING --TAKE_DAMAGE (health 0)--> GAMEOVER
//   any --RETURN_MENU--> MENU
//   any --START_MATCH--> PLAYING (fresh session)
//
// An action whose precondition does not hold returns a clone of the input.
// Noisy gesture input produces contradictory bursts (RELOAD while already
// reloading, FIRE on an empty magazine); those are no-ops, never errors.

use serde::{Deserialize, Serialize};

use crate::session::state::{Difficulty, GameState, MatchStats, MatchStatus};

/// Discrete event applied to the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Start a fresh session; `difficulty` overrides the current tier
    StartMatch {
        at: u64,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    /// Full reset to the menu, optionally pre-seeding the next tier
    ReturnMenu {
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    PauseMatch,
    ResumeMatch,
    RegisterShot {
        #[serde(rename = "didHit")]
        did_hit: bool,
    },
    ReloadStart,
    ReloadComplete,
    TakeDamage { amount: u32, at: u64 },
    EnemyDefeated { points: u64 },
    SetWave { wave: u32 },
}

impl Action {
    /// Stable wire name, used for logs and telemetry
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartMatch { .. } => "START_MATCH",
            Action::ReturnMenu { .. } => "RETURN_MENU",
            Action::PauseMatch => "PAUSE_MATCH",
            Action::ResumeMatch => "RESUME_MATCH",
            Action::RegisterShot { .. } => "REGISTER_SHOT",
            Action::ReloadStart => "RELOAD_START",
            Action::ReloadComplete => "RELOAD_COMPLETE",
            Action::TakeDamage { .. } => "TAKE_DAMAGE",
            Action::EnemyDefeated { .. } => "ENEMY_DEFEATED",
            Action::SetWave { .. } => "SET_WAVE",
        }
    }

    /// Whether the action begins a new session lifetime
    pub fn starts_session(&self) -> bool {
        matches!(self, Action::StartMatch { .. } | Action::ReturnMenu { .. })
    }
}

/// Apply `action` to `state`
pub fn reduce(state: &GameState, action: &Action) -> GameState {
    match *action {
        Action::StartMatch { at, difficulty } => GameState {
            status: MatchStatus::Playing,
            stats: MatchStats {
                session_started_at: Some(at),
                ..MatchStats::default()
            },
            ..GameState::new(difficulty.unwrap_or(state.difficulty))
        },

        Action::ReturnMenu { difficulty } => {
            GameState::new(difficulty.unwrap_or(state.difficulty))
        }

        Action::PauseMatch if state.status == MatchStatus::Playing => GameState {
            status: MatchStatus::Paused,
            ..state.clone()
        },

        Action::ResumeMatch if state.status == MatchStatus::Paused => GameState {
            status: MatchStatus::Playing,
            ..state.clone()
        },

        Action::RegisterShot { did_hit }
            if state.status == MatchStatus::Playing && !state.is_reloading && state.ammo > 0 =>
        {
            let mut next = state.clone();
            next.ammo -= 1;
            next.stats.shots_fired = next.stats.shots_fired.saturating_add(1);
            if did_hit {
                next.stats.shots_hit = next.stats.shots_hit.saturating_add(1);
                next.stats.current_streak = next.stats.current_streak.saturating_add(1);
                next.stats.best_streak = next.stats.best_streak.max(next.stats.current_streak);
            } else {
                next.stats.current_streak = 0;
            }
            next
        }

        Action::ReloadStart
            if state.status == MatchStatus::Playing
                && !state.is_reloading
                && state.ammo < state.max_ammo =>
        {
            GameState {
                is_reloading: true,
                ..state.clone()
            }
        }

        Action::ReloadComplete if state.is_reloading => GameState {
            is_reloading: false,
            ammo: state.max_ammo,
            ..state.clone()
        },

        Action::TakeDamage { amount, at }
            if state.status == MatchStatus::Playing && state.health > 0 =>
        {
            let mut next = state.clone();
            next.health = state.health.saturating_sub(amount);
            next.last_damage_time = Some(at);
            if next.health == 0 {
                next.status = MatchStatus::GameOver;
                next.is_game_over = true;
                next.stats.session_ended_at = Some(at);
            }
            next
        }

        Action::EnemyDefeated { points } if state.status == MatchStatus::Playing => {
            let mut next = state.clone();
            next.score = next.score.saturating_add(points);
            next.stats.enemies_defeated = next.stats.enemies_defeated.saturating_add(1);
            next
        }

        Action::SetWave { wave } if state.status != MatchStatus::Menu => {
            let mut next = state.clone();
            next.wave = wave;
            next.stats.highest_wave = next.stats.highest_wave.max(wave);
            next
        }

        _ => state.clone(),
    }
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod tests;
