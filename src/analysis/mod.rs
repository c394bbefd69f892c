// Analysis module - landmark pipeline for gesture classification
//
// This module turns detector output into stable hand states for the match
// and the renderer.
//
// Architecture:
// - Pipeline: role assignment → GestureClassifier → GestureSmoother
// - Output: HandState, emitted only on change, plus edge-triggered intents
//
// Processing is synchronous: a frame is fully classified and smoothed before
// the next one is accepted, so there is never an overlapping pass over a
// stale frame.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod detection;
pub mod landmarks;
pub mod smoothing;

use classifier::{classify_hands, CombatGesture, GestureClassifier, MovementGesture};
use detection::LandmarkFrame;
use smoothing::{GestureSmoother, HandState};

use crate::calibration::CalibrationProfile;

/// Discrete command derived from a HandState transition
///
/// Intents are edge-triggered: holding a FIRE pose yields one `Fire`, not
/// one per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "gesture", rename_all = "snake_case")]
pub enum Intent {
    Fire,
    Reload,
    Movement(MovementGesture),
}

/// Intents produced by moving from `previous` to `next`
pub fn intents(previous: &HandState, next: &HandState) -> Vec<Intent> {
    let mut out = Vec::new();

    if next.movement != previous.movement {
        out.push(Intent::Movement(next.movement));
    }

    if next.combat != previous.combat {
        match next.combat {
            CombatGesture::Fire => out.push(Intent::Fire),
            CombatGesture::Reload => out.push(Intent::Reload),
            _ => {}
        }
    }

    out
}

/// GesturePipeline owns the classifier and the smoothing layer
///
/// The smoothing window follows the live calibration profile: a calibration
/// update that changes `smoothing_frames` applies from the next frame on.
pub struct GesturePipeline {
    classifier: GestureClassifier,
    smoother: GestureSmoother,
    frames_processed: u64,
}

impl GesturePipeline {
    pub fn new(calibration: Arc<RwLock<CalibrationProfile>>) -> Self {
        let classifier = GestureClassifier::new(calibration);
        let smoothing_frames = classifier
            .profile()
            .map(|profile| profile.smoothing_frames)
            .unwrap_or_else(|| CalibrationProfile::new_default().smoothing_frames);

        Self {
            classifier,
            smoother: GestureSmoother::new(smoothing_frames),
            frames_processed: 0,
        }
    }

    /// Classify and smooth one detector frame
    ///
    /// # Returns
    /// * `Some(HandState)` - the stable state changed
    /// * `None` - nothing changed downstream
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> Option<HandState> {
        self.frames_processed += 1;

        let raw = match self.classifier.profile() {
            Some(profile) => {
                self.smoother.set_smoothing_frames(profile.smoothing_frames);
                classify_hands(&frame.hands, &profile)
            }
            None => self.classifier.classify_frame(&frame.hands),
        };

        tracing::trace!(
            "[GesturePipeline] frame {} raw {:?}/{:?}",
            frame.timestamp_ms,
            raw.movement,
            raw.combat
        );

        let changed = self.smoother.push(raw);
        if let Some(state) = changed {
            tracing::debug!(
                "[GesturePipeline] HandState -> {:?}/{:?} (hands: {}/{})",
                state.movement,
                state.combat,
                state.left_hand_present,
                state.right_hand_present
            );
        }
        changed
    }

    /// Last emitted HandState
    pub fn hand_state(&self) -> HandState {
        self.smoother.current()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}
