//! EngineHandle: gesture-to-match orchestration layer.
//!
//! Owns the calibration manager, the gesture pipeline, the match store and
//! its effect orchestrator, plus session history. Frames flow in through
//! `process_frame` (or a `DetectionSource`), gameplay events from the
//! renderer through `dispatch` and its helpers. Every dispatch goes through
//! one path: store, effects, telemetry, then session bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::analysis::detection::{DetectionHandle, DetectionSource, LandmarkFrame};
use crate::analysis::smoothing::HandState;
use crate::analysis::{intents, GesturePipeline, Intent};
use crate::analytics::{
    append_session_history, derive_session_insights, HistoryStore, SessionInsights,
    SessionSnapshot,
};
use crate::calibration::{storage, CalibrationProfile, CalibrationProgress};
use crate::config::AppConfig;
use crate::engine::clock::{SystemTimeSource, TimeSource};
use crate::error::{log_calibration_error, log_session_error, CalibrationError, SessionError};
use crate::managers::{BroadcastChannelManager, CalibrationManager};
use crate::session::{
    Action, Difficulty, EffectOrchestrator, EffectTimings, GameState, HapticDevice, MatchStatus,
    MatchStore, NullHaptics, Transition,
};
use crate::telemetry::{self, DiagnosticError, LifecyclePhase, TelemetryHub};

#[path = "core_subscriptions.rs"]
mod core_subscriptions;

/// Keyboard shortcuts handled by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardCommand {
    /// PLAYING <-> PAUSED
    TogglePause,
    ReturnToMenu,
    /// Start from MENU or GAMEOVER at the recommended difficulty
    StartMatch,
}

/// Result of processing one detector frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    /// Stable hand state after this frame
    pub hand_state: HandState,
    /// Edge-triggered intents; `Fire` is left to the renderer's hit test
    pub intents: Vec<Intent>,
    /// Progress when the frame was fed to a running calibration
    pub calibration: Option<CalibrationProgress>,
}

/// Collaborators injected into the engine
pub struct EngineOptions {
    pub haptics: Arc<dyn HapticDevice>,
    pub time_source: Arc<dyn TimeSource>,
    pub telemetry: Arc<TelemetryHub>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            haptics: Arc::new(NullHaptics),
            time_source: Arc::new(SystemTimeSource),
            telemetry: telemetry::hub(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// EngineHandle wires gestures, match state, effects and analytics.
pub struct EngineHandle {
    config: AppConfig,
    calibration: CalibrationManager,
    pipeline: Mutex<GesturePipeline>,
    store: Arc<MatchStore>,
    effects: EffectOrchestrator,
    history: Mutex<Vec<SessionSnapshot>>,
    history_store: Option<HistoryStore>,
    pub(crate) broadcasts: BroadcastChannelManager,
    telemetry: Arc<TelemetryHub>,
    time_source: Arc<dyn TimeSource>,
    sessions_recorded: AtomicU64,
    /// Present only when the engine was created outside a tokio runtime
    runtime: Option<Runtime>,
}

impl EngineHandle {
    /// Create an engine with null haptics, wall-clock time and the global hub.
    pub fn new(config: AppConfig) -> Result<Self, SessionError> {
        Self::with_options(config, EngineOptions::default())
    }

    pub fn with_options(config: AppConfig, options: EngineOptions) -> Result<Self, SessionError> {
        let config = config.sanitized();
        let (runtime_handle, runtime) = match Handle::try_current() {
            Ok(handle) => (handle, None),
            Err(_) => {
                let runtime = Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("gesture-effects")
                    .enable_time()
                    .build()
                    .inspect_err(|err| log::error!("[EngineHandle] Runtime creation failed: {}", err))?;
                (runtime.handle().clone(), Some(runtime))
            }
        };

        let profile = match &config.storage.calibration_path {
            Some(path) => storage::load_profile_or_default(path),
            None => CalibrationProfile::new_default(),
        };
        let calibration = CalibrationManager::new(profile, config.gesture.calibration_samples);
        let pipeline = GesturePipeline::new(calibration.get_profile_arc());

        let store = Arc::new(MatchStore::default());
        let effects = EffectOrchestrator::new(
            Arc::clone(&store),
            options.haptics,
            Arc::clone(&options.telemetry),
            EffectTimings::from(&config.session),
            runtime_handle,
        );

        let history_capacity = config.session.history_capacity;
        let history_store = config
            .storage
            .history_path
            .clone()
            .map(|path| HistoryStore::with_capacity(path, history_capacity));
        let history = match &history_store {
            Some(history_store) => history_store.try_load().unwrap_or_else(|err| {
                log_session_error(&err, "load_history");
                options
                    .telemetry
                    .record_error(DiagnosticError::HistoryLoad, err.to_string());
                Vec::new()
            }),
            None => Vec::new(),
        };

        let broadcasts = BroadcastChannelManager::new();
        broadcasts.init_hand_state();
        broadcasts.init_calibration();

        options.telemetry.record_lifecycle(LifecyclePhase::EngineStarted);
        log::info!(
            "[EngineHandle] Ready ({} sessions in history, reload {}ms)",
            history.len(),
            config.session.reload_ms
        );

        Ok(Self {
            config,
            calibration,
            pipeline: Mutex::new(pipeline),
            store,
            effects,
            history: Mutex::new(history),
            history_store,
            broadcasts,
            telemetry: options.telemetry,
            time_source: options.time_source,
            sessions_recorded: AtomicU64::new(0),
            runtime,
        })
    }

    // ========================================================================
    // GESTURE PIPELINE
    // ========================================================================

    /// Classify one detector frame and act on the resulting intents
    ///
    /// A `Reload` intent dispatches RELOAD_START directly. While calibration
    /// is running the frame is also offered to the procedure.
    pub fn process_frame(&self, frame: &LandmarkFrame) -> FrameOutcome {
        let started = Instant::now();
        let calibration = self.feed_calibration(frame);

        let (previous, changed, current) = {
            let mut pipeline = lock(&self.pipeline);
            let previous = pipeline.hand_state();
            let changed = pipeline.process_frame(frame);
            (previous, changed, pipeline.hand_state())
        };

        let mut outcome = FrameOutcome {
            hand_state: current,
            intents: Vec::new(),
            calibration,
        };

        if let Some(state) = changed {
            outcome.intents = intents(&previous, &state);
            self.broadcasts.publish_hand_state(state);
            self.telemetry.record_hand_state(&state);
            self.effects.on_hand_state(&state);

            if outcome.intents.contains(&Intent::Reload) {
                self.dispatch(Action::ReloadStart);
            }
        }

        self.telemetry
            .record_frame_latency(started.elapsed().as_secs_f32() * 1_000.0);
        outcome
    }

    /// Drive `process_frame` from a detection source
    ///
    /// The callback holds a weak reference; frames arriving after the engine
    /// is dropped are ignored.
    pub fn start_detection(
        self: &Arc<Self>,
        source: &mut dyn DetectionSource,
    ) -> Result<DetectionHandle, SessionError> {
        let engine: Weak<EngineHandle> = Arc::downgrade(self);
        let handle = source
            .start_detection(Box::new(move |frame| {
                if let Some(engine) = engine.upgrade() {
                    engine.process_frame(&frame);
                }
            }))
            .inspect_err(|err| {
                log_session_error(err, "start_detection");
                self.telemetry
                    .record_error(DiagnosticError::DetectionFailed, err.to_string());
            })?;

        self.telemetry.record_lifecycle(LifecyclePhase::DetectionStarted);
        Ok(handle)
    }

    fn feed_calibration(&self, frame: &LandmarkFrame) -> Option<CalibrationProgress> {
        if !self.calibration.is_in_progress() {
            return None;
        }

        match self.calibration.add_frame(frame) {
            Ok(progress) => {
                if let Some(tx) = self.broadcasts.get_calibration_sender() {
                    let _ = tx.send(progress);
                }
                Some(progress)
            }
            Err(err) => {
                tracing::debug!("[EngineHandle] Calibration sample skipped: {}", err);
                None
            }
        }
    }

    pub fn hand_state(&self) -> HandState {
        lock(&self.pipeline).hand_state()
    }

    // ========================================================================
    // MATCH ACTIONS
    // ========================================================================

    /// Dispatch an action through store, effects and telemetry
    pub fn dispatch(&self, action: Action) -> Transition {
        let transition = self.store.dispatch(action);
        self.effects.on_transition(&transition);
        self.telemetry.record_transition(&transition);

        if transition.current.status == MatchStatus::GameOver
            && transition.previous.status != MatchStatus::GameOver
        {
            self.record_session(&transition.current);
        }
        transition
    }

    pub fn start_match(&self, difficulty: Option<Difficulty>) -> Transition {
        self.dispatch(Action::StartMatch {
            at: self.time_source.now_ms(),
            difficulty,
        })
    }

    /// Start a match at the difficulty recommended by session history
    pub fn start_match_with_recommendation(&self) -> Transition {
        let difficulty = self.insights().recommended_difficulty;
        self.start_match(Some(difficulty))
    }

    /// Back to the menu, pre-seeding the recommended difficulty
    pub fn return_to_menu(&self) -> Transition {
        let difficulty = self.insights().recommended_difficulty;
        self.dispatch(Action::ReturnMenu {
            difficulty: Some(difficulty),
        })
    }

    /// Renderer hit-test result for a `Fire` intent
    pub fn register_shot(&self, did_hit: bool) -> Transition {
        self.dispatch(Action::RegisterShot { did_hit })
    }

    pub fn report_enemy_defeated(&self, points: u64) -> Transition {
        self.dispatch(Action::EnemyDefeated { points })
    }

    pub fn report_damage(&self, amount: u32) -> Transition {
        self.dispatch(Action::TakeDamage {
            amount,
            at: self.time_source.now_ms(),
        })
    }

    pub fn set_wave(&self, wave: u32) -> Transition {
        self.dispatch(Action::SetWave { wave })
    }

    /// Apply a keyboard shortcut
    ///
    /// # Returns
    /// `None` when the shortcut means nothing in the current status
    pub fn handle_key(&self, command: KeyboardCommand) -> Option<Transition> {
        let status = self.store.state().status;
        match (command, status) {
            (KeyboardCommand::TogglePause, MatchStatus::Playing) => {
                Some(self.dispatch(Action::PauseMatch))
            }
            (KeyboardCommand::TogglePause, MatchStatus::Paused) => {
                Some(self.dispatch(Action::ResumeMatch))
            }
            (KeyboardCommand::ReturnToMenu, _) => Some(self.return_to_menu()),
            (KeyboardCommand::StartMatch, MatchStatus::Menu | MatchStatus::GameOver) => {
                Some(self.start_match_with_recommendation())
            }
            _ => None,
        }
    }

    pub fn game_state(&self) -> GameState {
        self.store.state()
    }

    pub fn session_generation(&self) -> u64 {
        self.store.generation()
    }

    /// Whether a reload timer is pending
    pub fn reload_pending(&self) -> bool {
        self.effects.reload_pending()
    }

    // ========================================================================
    // SESSION HISTORY
    // ========================================================================

    fn record_session(&self, state: &GameState) {
        let sequence = self.sessions_recorded.fetch_add(1, Ordering::SeqCst);
        let ended_at = state.stats.session_ended_at.unwrap_or_else(|| self.time_source.now_ms());
        let snapshot = SessionSnapshot::from_game_state(
            format!("session-{}-{}", ended_at, sequence),
            state,
        );
        self.telemetry.record_session_end(state);
        log::info!(
            "[EngineHandle] Session {} ended on {}: score {}, accuracy {:.1}%, wave {}",
            snapshot.id,
            snapshot.difficulty.display_name(),
            snapshot.score,
            snapshot.accuracy,
            snapshot.highest_wave
        );

        let mut history = lock(&self.history);
        *history = append_session_history(&history, snapshot, self.config.session.history_capacity);

        if let Some(history_store) = &self.history_store {
            if let Err(err) = history_store.save(&history) {
                log_session_error(&err, "save_history");
                self.telemetry
                    .record_error(DiagnosticError::HistorySave, err.to_string());
            }
        }
    }

    /// Retained snapshots, most recent first
    pub fn history(&self) -> Vec<SessionSnapshot> {
        lock(&self.history).clone()
    }

    pub fn insights(&self) -> SessionInsights {
        derive_session_insights(&lock(&self.history))
    }

    // ========================================================================
    // CALIBRATION METHODS
    // ========================================================================

    pub fn calibration_profile(&self) -> Result<CalibrationProfile, CalibrationError> {
        self.calibration.get_profile()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_in_progress()
    }

    /// Begin collecting neutral-pose frames from `process_frame`
    pub fn start_calibration(&self) -> Result<CalibrationProgress, CalibrationError> {
        let progress = self.calibration.start()?;
        if let Some(tx) = self.broadcasts.get_calibration_sender() {
            log::info!(
                "[EngineHandle] Emitting initial calibration progress: {:?}",
                progress
            );
            let _ = tx.send(progress);
        }
        self.telemetry
            .record_lifecycle(LifecyclePhase::CalibrationStarted);
        Ok(progress)
    }

    /// Finish calibration, install and persist the new profile
    pub fn finish_calibration(&self) -> Result<CalibrationProfile, CalibrationError> {
        let profile = self.calibration.finish().inspect_err(|err| {
            self.telemetry
                .record_error(DiagnosticError::CalibrationRejected, err.to_string());
        })?;
        self.telemetry
            .record_lifecycle(LifecyclePhase::CalibrationFinished);
        self.after_profile_change(&profile);
        Ok(profile)
    }

    pub fn cancel_calibration(&self) -> Result<(), CalibrationError> {
        self.calibration.cancel()
    }

    /// Replace the profile; an invalid one is rejected and the old one kept
    pub fn update_calibration(&self, profile: CalibrationProfile) -> Result<(), CalibrationError> {
        self.calibration.update(profile).inspect_err(|err| {
            self.telemetry
                .record_error(DiagnosticError::CalibrationRejected, err.to_string());
        })?;
        self.after_profile_change(&profile);
        Ok(())
    }

    fn after_profile_change(&self, profile: &CalibrationProfile) {
        self.telemetry.record_calibration(profile);
        if let Some(path) = &self.config.storage.calibration_path {
            if let Err(err) = storage::save_profile(path, profile) {
                log_calibration_error(&err, "save_profile");
            }
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Cancel every timer; the engine ignores timers from here on
    pub fn shutdown(&self) {
        self.effects.shutdown();
        self.telemetry.record_lifecycle(LifecyclePhase::EngineStopped);
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.effects.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
