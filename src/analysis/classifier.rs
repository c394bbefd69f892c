// Classifier - rule-based hand gesture classification
//
// This module maps the 21 landmarks of one hand to a discrete gesture:
//
// Movement hand: fist = STOP, otherwise wrist offset from the calibrated
//                centre (vertical zones win over horizontal ones)
// Combat hand:   open hand = RELOAD, otherwise the "gun" pose family
//                (AIM / IRON_SIGHT / FIRE), anything else IDLE
//
// Thresholds come from the shared CalibrationProfile, which is read-only
// here. Role assignment (which hand moves, which fights) is fixed by wrist
// position relative to the frame midpoint.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::analysis::detection::DetectedHand;
use crate::analysis::landmarks::{
    HandLandmarks, INDEX_MCP, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST,
};
use crate::calibration::state::CalibrationProfile;

/// Horizontal midpoint of the camera frame used for role assignment
pub const FRAME_MIDPOINT_X: f32 = 0.5;

/// Movement intent of the movement hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementGesture {
    #[default]
    Stop,
    Forward,
    Backward,
    Left,
    Right,
}

/// Combat intent of the combat hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatGesture {
    #[default]
    Idle,
    Aim,
    IronSight,
    Fire,
    Reload,
}

/// Role a detected hand plays for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandRole {
    Movement,
    Combat,
}

/// Hands of one frame split by role
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAssignment<'a> {
    pub movement: Option<&'a DetectedHand>,
    pub combat: Option<&'a DetectedHand>,
}

/// Assign movement/combat roles to the hands of a frame
///
/// The hand whose wrist lies left of the frame midpoint moves, the other
/// fights. With both wrists on the same side the leftmost one moves. Hands
/// beyond the first two are ignored.
///
/// The camera preview is mirrored, so the screen-left hand is the user's
/// right hand when the camera faces them.
pub fn assign_roles(hands: &[DetectedHand]) -> RoleAssignment<'_> {
    let mut ordered: Vec<&DetectedHand> = hands.iter().take(2).collect();
    ordered.sort_by(|a, b| a.wrist_x().total_cmp(&b.wrist_x()));

    match ordered.as_slice() {
        [] => RoleAssignment::default(),
        [only] => {
            if role_for_wrist_x(only.wrist_x()) == HandRole::Movement {
                RoleAssignment {
                    movement: Some(*only),
                    combat: None,
                }
            } else {
                RoleAssignment {
                    movement: None,
                    combat: Some(*only),
                }
            }
        }
        [left, right, ..] => RoleAssignment {
            movement: Some(*left),
            combat: Some(*right),
        },
    }
}

/// Role of a lone hand given its wrist x
pub fn role_for_wrist_x(x: f32) -> HandRole {
    if x < FRAME_MIDPOINT_X {
        HandRole::Movement
    } else {
        HandRole::Combat
    }
}

/// Classify the movement hand against a profile
///
/// Decision order:
/// 1. IF all four fingertip-to-wrist distances < fist threshold THEN STOP
/// 2. ELSE IF wrist above centre beyond deadzone THEN FORWARD
/// 3. ELSE IF wrist below centre beyond deadzone THEN BACKWARD
/// 4. ELSE IF wrist right of centre (camera space) THEN LEFT (mirrored)
/// 5. ELSE IF wrist left of centre (camera space) THEN RIGHT (mirrored)
/// 6. ELSE STOP
pub fn classify_movement(hand: &HandLandmarks, profile: &CalibrationProfile) -> MovementGesture {
    if !hand.is_finite() {
        return MovementGesture::Stop;
    }

    let is_fist = hand
        .fingertip_distances()
        .iter()
        .all(|distance| *distance < profile.fist_stop_threshold);
    if is_fist {
        return MovementGesture::Stop;
    }

    let wrist = hand.wrist();
    let dx = wrist.x - profile.movement_center_x;
    let dy = wrist.y - profile.movement_center_y;
    let deadzone = profile.movement_deadzone;

    if dy < -deadzone {
        MovementGesture::Forward
    } else if dy > deadzone {
        MovementGesture::Backward
    } else if dx > deadzone {
        MovementGesture::Left
    } else if dx < -deadzone {
        MovementGesture::Right
    } else {
        MovementGesture::Stop
    }
}

/// Classify the combat hand against a profile
///
/// Decision order:
/// 1. IF all four fingertip-to-wrist distances > open threshold THEN RELOAD
/// 2. ELSE IF gun pose (index extended, thumb above index base, ring and
///    pinky curled):
///    a. index tip near its base (trigger pulled) THEN FIRE
///    b. middle finger extended too THEN IRON_SIGHT
///    c. ELSE AIM
/// 3. ELSE IDLE
///
/// Ring and pinky count as curled below the fist threshold.
pub fn classify_combat(hand: &HandLandmarks, profile: &CalibrationProfile) -> CombatGesture {
    if !hand.is_finite() {
        return CombatGesture::Idle;
    }

    let is_open = hand
        .fingertip_distances()
        .iter()
        .all(|distance| *distance > profile.open_hand_threshold);
    if is_open {
        return CombatGesture::Reload;
    }

    let index_extended = hand.distance(INDEX_TIP, WRIST) > profile.index_extended_threshold;
    let thumb_up = hand.get(THUMB_TIP).y < hand.get(INDEX_MCP).y;
    let ring_curled = hand.distance(RING_TIP, WRIST) < profile.fist_stop_threshold;
    let pinky_curled = hand.distance(PINKY_TIP, WRIST) < profile.fist_stop_threshold;

    if !(index_extended && thumb_up && ring_curled && pinky_curled) {
        return CombatGesture::Idle;
    }

    if hand.distance(INDEX_TIP, INDEX_MCP) < profile.fire_curl_threshold {
        CombatGesture::Fire
    } else if hand.distance(MIDDLE_TIP, WRIST) > profile.index_extended_threshold {
        CombatGesture::IronSight
    } else {
        CombatGesture::Aim
    }
}

/// GestureClassifier applies the rules above with the shared profile
///
/// Holds the calibration profile behind an `Arc<RwLock<_>>`; the classifier
/// only ever reads it.
pub struct GestureClassifier {
    calibration: Arc<RwLock<CalibrationProfile>>,
}

impl GestureClassifier {
    /// Create a new GestureClassifier with a calibration profile reference
    pub fn new(calibration: Arc<RwLock<CalibrationProfile>>) -> Self {
        Self { calibration }
    }

    /// Snapshot of the current profile, `None` if the lock is poisoned
    pub fn profile(&self) -> Option<CalibrationProfile> {
        match self.calibration.read() {
            Ok(guard) => Some(*guard),
            Err(_) => {
                log::error!("Calibration profile lock poisoned in GestureClassifier");
                None
            }
        }
    }

    /// Classify the movement hand; STOP when the profile is unavailable
    pub fn movement(&self, hand: &HandLandmarks) -> MovementGesture {
        self.profile()
            .map(|profile| classify_movement(hand, &profile))
            .unwrap_or_default()
    }

    /// Classify the combat hand; IDLE when the profile is unavailable
    pub fn combat(&self, hand: &HandLandmarks) -> CombatGesture {
        self.profile()
            .map(|profile| classify_combat(hand, &profile))
            .unwrap_or_default()
    }

    /// Classify both roles of a frame with a single profile snapshot
    ///
    /// Missing hands yield STOP / IDLE.
    pub fn classify_frame(&self, hands: &[DetectedHand]) -> FrameClassification {
        match self.profile() {
            Some(profile) => classify_hands(hands, &profile),
            None => {
                let roles = assign_roles(hands);
                FrameClassification {
                    movement_present: roles.movement.is_some(),
                    combat_present: roles.combat.is_some(),
                    ..FrameClassification::default()
                }
            }
        }
    }
}

/// Assign roles and classify both hands against `profile`
pub fn classify_hands(hands: &[DetectedHand], profile: &CalibrationProfile) -> FrameClassification {
    let roles = assign_roles(hands);
    FrameClassification {
        movement: roles
            .movement
            .map(|hand| classify_movement(&hand.landmarks, profile))
            .unwrap_or_default(),
        combat: roles
            .combat
            .map(|hand| classify_combat(&hand.landmarks, profile))
            .unwrap_or_default(),
        movement_present: roles.movement.is_some(),
        combat_present: roles.combat.is_some(),
    }
}

/// Raw (unsmoothed) per-frame classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameClassification {
    pub movement: MovementGesture,
    pub combat: CombatGesture,
    pub movement_present: bool,
    pub combat_present: bool,
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
