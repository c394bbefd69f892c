// Smoothing - temporal debounce for per-frame gesture classification
//
// Raw per-frame classifications flicker: a hand occluded for one frame drops
// to STOP/IDLE, a finger crossing a threshold toggles AIM/FIRE. This layer
// turns that stream into a stable HandState.
//
// Policy: N consecutive identical frames. Each channel (movement gesture,
// combat gesture, movement-hand presence, combat-hand presence) keeps its
// own candidate and only adopts it after N identical observations in a row,
// N = CalibrationProfile::smoothing_frames. A single dissenting frame resets
// the candidate's streak, so latency for a genuine change is exactly N frames
// and a one-frame glitch never propagates.
//
// A HandState is emitted only when the composed stable state differs by
// value from the last emitted one.

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{CombatGesture, FrameClassification, MovementGesture};
use crate::calibration::state::{MAX_SMOOTHING_FRAMES, MIN_SMOOTHING_FRAMES};

/// Stable, debounced view of both hands
///
/// Immutable value; replaced wholesale on every accepted change.
/// `left_hand_present` refers to the screen-left (movement) hand and
/// `right_hand_present` to the screen-right (combat) hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandState {
    pub movement: MovementGesture,
    pub combat: CombatGesture,
    pub left_hand_present: bool,
    pub right_hand_present: bool,
}

/// Single-channel "N consecutive identical samples" debouncer
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    stable: T,
    candidate: T,
    streak: u8,
    required: u8,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    pub fn new(initial: T, required: u8) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            streak: 0,
            required: required.clamp(MIN_SMOOTHING_FRAMES, MAX_SMOOTHING_FRAMES),
        }
    }

    /// Feed one observation and return the (possibly unchanged) stable value
    pub fn observe(&mut self, value: T) -> T {
        if value == self.stable {
            self.candidate = value;
            self.streak = 0;
            return self.stable;
        }

        if value == self.candidate {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.candidate = value;
            self.streak = 1;
        }

        if self.streak >= self.required {
            self.stable = value;
            self.streak = 0;
        }
        self.stable
    }

    pub fn stable(&self) -> T {
        self.stable
    }

    pub fn set_required(&mut self, required: u8) {
        self.required = required.clamp(MIN_SMOOTHING_FRAMES, MAX_SMOOTHING_FRAMES);
    }
}

/// GestureSmoother debounces every HandState channel independently
#[derive(Debug, Clone)]
pub struct GestureSmoother {
    movement: Debouncer<MovementGesture>,
    combat: Debouncer<CombatGesture>,
    movement_present: Debouncer<bool>,
    combat_present: Debouncer<bool>,
    last_emitted: HandState,
}

impl GestureSmoother {
    /// Create a smoother requiring `smoothing_frames` consecutive frames
    ///
    /// Values outside 1..=10 are clamped.
    pub fn new(smoothing_frames: u8) -> Self {
        let initial = HandState::default();
        Self {
            movement: Debouncer::new(initial.movement, smoothing_frames),
            combat: Debouncer::new(initial.combat, smoothing_frames),
            movement_present: Debouncer::new(initial.left_hand_present, smoothing_frames),
            combat_present: Debouncer::new(initial.right_hand_present, smoothing_frames),
            last_emitted: initial,
        }
    }

    /// Apply a new window size without discarding the stable state
    pub fn set_smoothing_frames(&mut self, smoothing_frames: u8) {
        self.movement.set_required(smoothing_frames);
        self.combat.set_required(smoothing_frames);
        self.movement_present.set_required(smoothing_frames);
        self.combat_present.set_required(smoothing_frames);
    }

    /// Feed one raw classification
    ///
    /// # Returns
    /// * `Some(HandState)` - the stable state changed; propagate it
    /// * `None` - nothing downstream needs to react
    pub fn push(&mut self, raw: FrameClassification) -> Option<HandState> {
        let next = HandState {
            movement: self.movement.observe(raw.movement),
            combat: self.combat.observe(raw.combat),
            left_hand_present: self.movement_present.observe(raw.movement_present),
            right_hand_present: self.combat_present.observe(raw.combat_present),
        };

        if next == self.last_emitted {
            None
        } else {
            self.last_emitted = next;
            Some(next)
        }
    }

    /// Last propagated HandState
    pub fn current(&self) -> HandState {
        self.last_emitted
    }
}
