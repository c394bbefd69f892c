//! Haptic and timer orchestration around the match store.
//!
//! The reducer stays pure; everything time-based lives here. The
//! orchestrator observes transitions and hand states and owns two timers:
//!
//! - the reload timer, which dispatches `RELOAD_COMPLETE` after `reload_ms`
//! - the footstep interval, pulsing while the player walks during PLAYING
//!
//! Timers only dispatch actions, always through
//! [`MatchStore::dispatch_in_session`], so a callback that outlives its
//! session is a no-op. They are aborted on GAMEOVER, RETURN_MENU, a new
//! START_MATCH and [`EffectOrchestrator::shutdown`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::analysis::classifier::MovementGesture;
use crate::analysis::smoothing::HandState;
use crate::config::SessionConfig;
use crate::session::reducer::Action;
use crate::session::state::MatchStatus;
use crate::session::store::{MatchStore, Transition};
use crate::telemetry::TelemetryHub;

/// Feedback patterns understood by haptic devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticPattern {
    Footstep,
    Shot,
    Damage,
    ReloadReady,
    GameOver,
}

impl HapticPattern {
    /// Vibrate/pause durations in milliseconds, vibration first
    pub fn vibration_ms(&self) -> &'static [u64] {
        match self {
            HapticPattern::Footstep => &[12],
            HapticPattern::Shot => &[30],
            HapticPattern::Damage => &[80, 40, 80],
            HapticPattern::ReloadReady => &[20, 30, 20],
            HapticPattern::GameOver => &[200, 100, 200],
        }
    }
}

/// Capability interface over the device vibration API
pub trait HapticDevice: Send + Sync {
    fn pulse(&self, pattern: HapticPattern);
}

/// Device without haptics
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHaptics;

impl HapticDevice for NullHaptics {
    fn pulse(&self, _pattern: HapticPattern) {}
}

/// Records every pulse; used by the CLI simulator and tests
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    pulses: Mutex<Vec<HapticPattern>>,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> Vec<HapticPattern> {
        self.pulses
            .lock()
            .map(|pulses| pulses.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn count(&self, pattern: HapticPattern) -> usize {
        self.pulses().iter().filter(|p| **p == pattern).count()
    }
}

impl HapticDevice for RecordingHaptics {
    fn pulse(&self, pattern: HapticPattern) {
        match self.pulses.lock() {
            Ok(mut pulses) => pulses.push(pattern),
            Err(poisoned) => poisoned.into_inner().push(pattern),
        }
    }
}

/// Timer periods used by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectTimings {
    pub reload: Duration,
    pub footstep_interval: Duration,
}

impl From<&SessionConfig> for EffectTimings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            reload: Duration::from_millis(config.reload_ms),
            footstep_interval: Duration::from_millis(config.footstep_interval_ms.max(1)),
        }
    }
}

impl Default for EffectTimings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

#[derive(Default)]
struct TimerSlots {
    reload: Option<JoinHandle<()>>,
    footsteps: Option<JoinHandle<()>>,
    movement: MovementGesture,
    shut_down: bool,
}

impl TimerSlots {
    fn stop_footsteps(&mut self) {
        if let Some(task) = self.footsteps.take() {
            task.abort();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(task) = self.reload.take() {
            task.abort();
        }
        self.stop_footsteps();
    }
}

/// Schedules haptics and timers from store transitions and hand states
pub struct EffectOrchestrator {
    store: Arc<MatchStore>,
    haptics: Arc<dyn HapticDevice>,
    telemetry: Arc<TelemetryHub>,
    timings: EffectTimings,
    runtime: Handle,
    slots: Mutex<TimerSlots>,
}

impl EffectOrchestrator {
    pub fn new(
        store: Arc<MatchStore>,
        haptics: Arc<dyn HapticDevice>,
        telemetry: Arc<TelemetryHub>,
        timings: EffectTimings,
        runtime: Handle,
    ) -> Self {
        Self {
            store,
            haptics,
            telemetry,
            timings,
            runtime,
            slots: Mutex::new(TimerSlots::default()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, TimerSlots> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// React to a dispatched action
    pub fn on_transition(&self, transition: &Transition) {
        if self.slots().shut_down {
            return;
        }

        if transition.action.starts_session() {
            self.slots().cancel_all();
        }

        if !transition.applied {
            return;
        }

        match transition.action {
            Action::RegisterShot { .. } => self.haptics.pulse(HapticPattern::Shot),
            Action::TakeDamage { .. } if transition.current.health < transition.previous.health => {
                self.haptics.pulse(HapticPattern::Damage)
            }
            Action::ReloadStart => self.schedule_reload(transition.generation),
            _ => {}
        }

        let previous = transition.previous.status;
        match transition.current.status {
            MatchStatus::GameOver if previous != MatchStatus::GameOver => {
                self.haptics.pulse(HapticPattern::GameOver);
                self.slots().cancel_all();
            }
            MatchStatus::GameOver | MatchStatus::Menu => self.slots().cancel_all(),
            MatchStatus::Paused => self.slots().stop_footsteps(),
            MatchStatus::Playing => self.sync_footsteps(true, transition.generation),
        }
    }

    /// React to a new stable hand state
    pub fn on_hand_state(&self, hand: &HandState) {
        self.slots().movement = hand.movement;
        let playing = self.store.state().is_playing();
        self.sync_footsteps(playing, self.store.generation());
    }

    /// Whether a reload timer is pending
    pub fn reload_pending(&self) -> bool {
        self.slots()
            .reload
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Whether the footstep interval is running
    pub fn footsteps_running(&self) -> bool {
        self.slots()
            .footsteps
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Cancel every timer; later transitions schedule nothing
    pub fn shutdown(&self) {
        let mut slots = self.slots();
        slots.shut_down = true;
        slots.cancel_all();
        log::info!("[EffectOrchestrator] Shut down, all timers cancelled");
    }

    fn schedule_reload(&self, generation: u64) {
        let store = Arc::clone(&self.store);
        let haptics = Arc::clone(&self.haptics);
        let telemetry = Arc::clone(&self.telemetry);
        let delay = self.timings.reload;

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(transition) = store.dispatch_in_session(generation, Action::ReloadComplete) {
                telemetry.record_transition(&transition);
                if transition.applied {
                    haptics.pulse(HapticPattern::ReloadReady);
                }
            }
        });

        let mut slots = self.slots();
        if let Some(previous) = slots.reload.replace(task) {
            previous.abort();
        }
        tracing::debug!("[EffectOrchestrator] Reload timer armed for {:?}", delay);
    }

    fn sync_footsteps(&self, playing: bool, generation: u64) {
        let mut slots = self.slots();
        if slots.shut_down {
            return;
        }

        let walking = slots.movement != MovementGesture::Stop;
        if !(walking && playing) {
            slots.stop_footsteps();
            return;
        }

        let running = slots
            .footsteps
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false);
        if running {
            return;
        }

        let store = Arc::clone(&self.store);
        let haptics = Arc::clone(&self.haptics);
        let period = self.timings.footstep_interval;

        slots.footsteps = Some(self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if store.generation() != generation || !store.state().is_playing() {
                    break;
                }
                haptics.pulse(HapticPattern::Footstep);
            }
        }));
    }
}

impl Drop for EffectOrchestrator {
    fn drop(&mut self) {
        self.slots().cancel_all();
    }
}
