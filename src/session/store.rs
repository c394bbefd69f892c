// MatchStore - single authority over GameState
//
// Every mutation goes through dispatch(), which applies the pure reducer
// under one lock. Actions are therefore applied in dispatch order (FIFO) and
// no two reductions interleave. New states are published on a watch channel
// for HUD/rendering observers.
//
// The session generation increments on START_MATCH and RETURN_MENU. Timers
// capture the generation they were scheduled in and dispatch through
// dispatch_in_session(), which drops actions from a finished session.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use crate::session::reducer::{reduce, Action};
use crate::session::state::GameState;

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub action: Action,
    pub previous: GameState,
    pub current: GameState,
    /// `false` when the reducer treated the action as a no-op
    pub applied: bool,
    /// Session generation after the action
    pub generation: u64,
}

struct StoreInner {
    state: GameState,
    generation: u64,
}

pub struct MatchStore {
    inner: Mutex<StoreInner>,
    state_tx: watch::Sender<GameState>,
}

impl MatchStore {
    pub fn new(initial: GameState) -> Self {
        let (state_tx, _) = watch::channel(initial.clone());
        Self {
            inner: Mutex::new(StoreInner {
                state: initial,
                generation: 0,
            }),
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // The reducer cannot panic halfway through a mutation: the state is
        // replaced wholesale after reduce() returns, so a poisoned guard
        // still holds a consistent GameState.
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::error!("[MatchStore] State lock poisoned, recovering last state");
            poisoned.into_inner()
        })
    }

    /// Apply `action` and publish the new state
    pub fn dispatch(&self, action: Action) -> Transition {
        let mut inner = self.lock();
        Self::apply(&mut inner, &self.state_tx, action)
    }

    /// Apply `action` only if `generation` is still the live session
    ///
    /// # Returns
    /// * `Some(Transition)` - session still live, action dispatched
    /// * `None` - stale callback from an ended session, nothing happened
    pub fn dispatch_in_session(&self, generation: u64, action: Action) -> Option<Transition> {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(
                "[MatchStore] Dropping {} from stale session {} (live {})",
                action.name(),
                generation,
                inner.generation
            );
            return None;
        }
        Some(Self::apply(&mut inner, &self.state_tx, action))
    }

    fn apply(
        inner: &mut StoreInner,
        state_tx: &watch::Sender<GameState>,
        action: Action,
    ) -> Transition {
        let previous = inner.state.clone();
        let current = reduce(&previous, &action);
        let applied = current != previous;

        if action.starts_session() {
            inner.generation = inner.generation.wrapping_add(1);
        }

        if applied {
            inner.state = current.clone();
            state_tx.send_replace(current.clone());
        } else {
            tracing::debug!(
                "[MatchStore] Ignored {} in status {:?}",
                action.name(),
                previous.status
            );
        }

        Transition {
            action,
            previous,
            current,
            applied,
            generation: inner.generation,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> GameState {
        self.lock().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Watch the state; the receiver always holds the latest value
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.state_tx.subscribe()
    }
}

impl Default for MatchStore {
    fn default() -> Self {
        Self::new(GameState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::MatchStatus;

    #[test]
    fn test_dispatch_applies_in_order() {
        let store = MatchStore::default();
        store.dispatch(Action::StartMatch {
            at: 1,
            difficulty: None,
        });
        store.dispatch(Action::RegisterShot { did_hit: true });
        let t = store.dispatch(Action::RegisterShot { did_hit: false });

        assert!(t.applied);
        assert_eq!(t.previous.stats.current_streak, 1);
        assert_eq!(t.current.stats.current_streak, 0);
        assert_eq!(store.state().ammo, 8);
    }

    #[test]
    fn test_noop_is_reported_not_applied() {
        let store = MatchStore::default();
        let t = store.dispatch(Action::PauseMatch);
        assert!(!t.applied);
        assert_eq!(t.previous, t.current);
        assert_eq!(store.state().status, MatchStatus::Menu);
    }

    #[test]
    fn test_generation_advances_on_session_boundaries() {
        let store = MatchStore::default();
        assert_eq!(store.generation(), 0);

        let t = store.dispatch(Action::StartMatch {
            at: 1,
            difficulty: None,
        });
        assert_eq!(t.generation, 1);
        store.dispatch(Action::PauseMatch);
        assert_eq!(store.generation(), 1);

        store.dispatch(Action::ReturnMenu { difficulty: None });
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_stale_session_dispatch_is_dropped() {
        let store = MatchStore::default();
        let started = store.dispatch(Action::StartMatch {
            at: 1,
            difficulty: None,
        });
        store.dispatch(Action::RegisterShot { did_hit: true });
        store.dispatch(Action::ReloadStart);

        // New match before the old reload timer fires
        store.dispatch(Action::StartMatch {
            at: 2,
            difficulty: None,
        });
        store.dispatch(Action::RegisterShot { did_hit: true });
        store.dispatch(Action::ReloadStart);

        assert!(store
            .dispatch_in_session(started.generation, Action::ReloadComplete)
            .is_none());
        assert!(store.state().is_reloading);

        let live = store.generation();
        let t = store
            .dispatch_in_session(live, Action::ReloadComplete)
            .unwrap();
        assert!(t.applied);
        assert!(!store.state().is_reloading);
    }

    #[test]
    fn test_watch_receives_latest_state() {
        let store = MatchStore::default();
        let rx = store.subscribe();
        store.dispatch(Action::StartMatch {
            at: 7,
            difficulty: None,
        });
        store.dispatch(Action::EnemyDefeated { points: 50 });
        assert_eq!(rx.borrow().score, 50);
        assert_eq!(rx.borrow().status, MatchStatus::Playing);
    }
}
