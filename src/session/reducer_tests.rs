use super::*;
use crate::session::state::{DEFAULT_MAX_AMMO, MAX_HEALTH};

const T0: u64 = 1_700_000_000_000;

fn playing() -> GameState {
    reduce(
        &GameState::default(),
        &Action::StartMatch {
            at: T0,
            difficulty: None,
        },
    )
}

fn with_status(status: MatchStatus) -> GameState {
    GameState {
        status,
        ..playing()
    }
}

fn apply_all(state: GameState, actions: &[Action]) -> GameState {
    actions.iter().fold(state, |acc, action| reduce(&acc, action))
}

#[test]
fn test_start_match_from_menu() {
    let state = playing();
    assert_eq!(state.status, MatchStatus::Playing);
    assert_eq!(state.ammo, DEFAULT_MAX_AMMO);
    assert_eq!(state.health, MAX_HEALTH);
    assert_eq!(state.stats.session_started_at, Some(T0));
    assert_eq!(state.stats.session_ended_at, None);
}

#[test]
fn test_start_match_resets_previous_session() {
    let dirty = apply_all(
        playing(),
        &[
            Action::RegisterShot { did_hit: true },
            Action::EnemyDefeated { points: 100 },
            Action::TakeDamage { amount: 30, at: T0 + 10 },
            Action::SetWave { wave: 4 },
        ],
    );

    let fresh = reduce(
        &dirty,
        &Action::StartMatch {
            at: T0 + 500,
            difficulty: Some(Difficulty::Veteran),
        },
    );
    assert_eq!(fresh.score, 0);
    assert_eq!(fresh.health, MAX_HEALTH);
    assert_eq!(fresh.ammo, fresh.max_ammo);
    assert_eq!(fresh.wave, 1);
    assert_eq!(fresh.stats.shots_fired, 0);
    assert_eq!(fresh.stats.session_started_at, Some(T0 + 500));
    assert_eq!(fresh.difficulty, Difficulty::Veteran);
    assert_eq!(fresh.last_damage_time, None);
}

#[test]
fn test_start_match_keeps_difficulty_without_override() {
    let menu = GameState::new(Difficulty::Elite);
    let state = reduce(
        &menu,
        &Action::StartMatch {
            at: T0,
            difficulty: None,
        },
    );
    assert_eq!(state.difficulty, Difficulty::Elite);
}

#[test]
fn test_return_menu_full_reset_with_seeded_difficulty() {
    let over = apply_all(playing(), &[Action::TakeDamage { amount: 500, at: T0 + 1 }]);
    assert_eq!(over.status, MatchStatus::GameOver);

    let menu = reduce(
        &over,
        &Action::ReturnMenu {
            difficulty: Some(Difficulty::Rookie),
        },
    );
    assert_eq!(menu, GameState::new(Difficulty::Rookie));
}

#[test]
fn test_pause_and_resume() {
    let paused = reduce(&playing(), &Action::PauseMatch);
    assert_eq!(paused.status, MatchStatus::Paused);

    let resumed = reduce(&paused, &Action::ResumeMatch);
    assert_eq!(resumed, playing());
}

#[test]
fn test_illegal_actions_leave_state_unchanged() {
    let menu = GameState::default();
    let paused = with_status(MatchStatus::Paused);
    let over = apply_all(playing(), &[Action::TakeDamage { amount: 100, at: T0 }]);
    let reloading = apply_all(
        playing(),
        &[Action::RegisterShot { did_hit: false }, Action::ReloadStart],
    );
    let empty = GameState {
        ammo: 0,
        ..playing()
    };

    let cases: Vec<(&str, GameState, Vec<Action>)> = vec![
        (
            "menu",
            menu,
            vec![
                Action::PauseMatch,
                Action::ResumeMatch,
                Action::RegisterShot { did_hit: true },
                Action::ReloadStart,
                Action::ReloadComplete,
                Action::TakeDamage { amount: 5, at: T0 },
                Action::EnemyDefeated { points: 10 },
                Action::SetWave { wave: 3 },
            ],
        ),
        (
            "playing",
            playing(),
            vec![
                Action::ResumeMatch,
                Action::ReloadComplete,
                // Full magazine
                Action::ReloadStart,
            ],
        ),
        (
            "paused",
            paused,
            vec![
                Action::PauseMatch,
                Action::RegisterShot { did_hit: true },
                Action::ReloadStart,
                Action::ReloadComplete,
                Action::TakeDamage { amount: 5, at: T0 },
                Action::EnemyDefeated { points: 10 },
            ],
        ),
        (
            "gameover",
            over,
            vec![
                Action::PauseMatch,
                Action::ResumeMatch,
                Action::RegisterShot { did_hit: true },
                Action::ReloadStart,
                Action::ReloadComplete,
                Action::TakeDamage { amount: 5, at: T0 },
                Action::EnemyDefeated { points: 10 },
            ],
        ),
        (
            "reloading",
            reloading,
            vec![
                Action::RegisterShot { did_hit: true },
                Action::ReloadStart,
                Action::ResumeMatch,
            ],
        ),
        ("empty magazine", empty, vec![Action::RegisterShot { did_hit: true }]),
    ];

    for (label, state, actions) in cases {
        for action in actions {
            assert_eq!(
                reduce(&state, &action),
                state,
                "{} should ignore {:?}",
                label,
                action
            );
        }
    }
}

#[test]
fn test_nine_hits_scenario() {
    let state = apply_all(playing(), &[Action::RegisterShot { did_hit: true }; 9]);
    assert_eq!(state.ammo, 1);
    assert_eq!(state.stats.shots_hit, 9);
    assert_eq!(state.stats.shots_fired, 9);
    assert_eq!(state.stats.current_streak, 9);
    assert_eq!(state.stats.best_streak, 9);
}

#[test]
fn test_miss_resets_streak_but_keeps_best() {
    for n in 1..=DEFAULT_MAX_AMMO - 1 {
        let hits = vec![Action::RegisterShot { did_hit: true }; n as usize];
        let state = apply_all(playing(), &hits);
        assert_eq!(state.stats.current_streak, n);
        assert!(state.stats.best_streak >= n);

        let missed = reduce(&state, &Action::RegisterShot { did_hit: false });
        assert_eq!(missed.stats.current_streak, 0);
        assert_eq!(missed.stats.best_streak, state.stats.best_streak);
        assert_eq!(missed.stats.shots_hit, n);
        assert_eq!(missed.stats.shots_fired, n + 1);
    }
}

#[test]
fn test_best_streak_never_below_current() {
    let pattern = [true, true, false, true, true, true, false, true, true, true];
    let mut state = playing();
    for hit in pattern {
        state = reduce(&state, &Action::RegisterShot { did_hit: hit });
        assert!(state.stats.best_streak >= state.stats.current_streak);
    }
    assert_eq!(state.stats.best_streak, 3);
    assert_eq!(state.ammo, 0);
}

#[test]
fn test_reload_at_full_ammo_is_noop() {
    let state = playing();
    assert_eq!(state.ammo, state.max_ammo);
    let next = reduce(&state, &Action::ReloadStart);
    assert_eq!(next, state);
    assert!(!next.is_reloading);
}

#[test]
fn test_reload_cycle() {
    let state = apply_all(
        playing(),
        &[
            Action::RegisterShot { did_hit: true },
            Action::RegisterShot { did_hit: false },
            Action::ReloadStart,
        ],
    );
    assert!(state.is_reloading);
    assert_eq!(state.ammo, 8);

    // Firing while reloading changes nothing
    let blocked = reduce(&state, &Action::RegisterShot { did_hit: true });
    assert_eq!(blocked, state);

    let done = reduce(&state, &Action::ReloadComplete);
    assert!(!done.is_reloading);
    assert_eq!(done.ammo, done.max_ammo);
}

#[test]
fn test_reload_completes_while_paused() {
    let state = apply_all(
        playing(),
        &[
            Action::RegisterShot { did_hit: true },
            Action::ReloadStart,
            Action::PauseMatch,
            Action::ReloadComplete,
        ],
    );
    assert_eq!(state.status, MatchStatus::Paused);
    assert!(!state.is_reloading);
    assert_eq!(state.ammo, state.max_ammo);
}

#[test]
fn test_partial_damage() {
    let state = reduce(&playing(), &Action::TakeDamage { amount: 35, at: T0 + 42 });
    assert_eq!(state.health, 65);
    assert_eq!(state.last_damage_time, Some(T0 + 42));
    assert_eq!(state.status, MatchStatus::Playing);
    assert!(!state.is_game_over);
}

#[test]
fn test_lethal_damage_ends_match() {
    for amount in [40u32, 41, 100, u32::MAX] {
        let wounded = reduce(&playing(), &Action::TakeDamage { amount: 60, at: T0 + 1 });
        let state = reduce(&wounded, &Action::TakeDamage { amount, at: T0 + 9 });
        assert_eq!(state.health, 0, "amount {}", amount);
        assert_eq!(state.status, MatchStatus::GameOver);
        assert!(state.is_game_over);
        assert_eq!(state.stats.session_ended_at, Some(T0 + 9));
    }
}

#[test]
fn test_enemy_defeated_scores() {
    let state = apply_all(
        playing(),
        &[
            Action::EnemyDefeated { points: 100 },
            Action::EnemyDefeated { points: 250 },
        ],
    );
    assert_eq!(state.score, 350);
    assert_eq!(state.stats.enemies_defeated, 2);
}

#[test]
fn test_score_saturates() {
    let state = GameState {
        score: u64::MAX - 1,
        ..playing()
    };
    let next = reduce(&state, &Action::EnemyDefeated { points: 10 });
    assert_eq!(next.score, u64::MAX);
}

#[test]
fn test_set_wave_tracks_highest() {
    let state = apply_all(
        playing(),
        &[
            Action::SetWave { wave: 5 },
            Action::PauseMatch,
            Action::SetWave { wave: 3 },
        ],
    );
    assert_eq!(state.wave, 3);
    assert_eq!(state.stats.highest_wave, 5);
}

#[test]
fn test_set_wave_allowed_after_game_over() {
    let over = reduce(&playing(), &Action::TakeDamage { amount: 100, at: T0 });
    let state = reduce(&over, &Action::SetWave { wave: 7 });
    assert_eq!(state.wave, 7);
    assert_eq!(state.stats.highest_wave, 7);
}

#[test]
fn test_action_json_wire_format() {
    let action: Action = serde_json::from_str(r#"{"type":"REGISTER_SHOT","didHit":true}"#).unwrap();
    assert_eq!(action, Action::RegisterShot { did_hit: true });

    let action: Action = serde_json::from_str(r#"{"type":"START_MATCH","at":5}"#).unwrap();
    assert_eq!(
        action,
        Action::StartMatch {
            at: 5,
            difficulty: None
        }
    );
    assert_eq!(action.name(), "START_MATCH");
    assert!(action.starts_session());
    assert!(!Action::PauseMatch.starts_session());
}
