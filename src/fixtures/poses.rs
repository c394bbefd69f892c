//! Synthetic hand poses.
//!
//! Builds 21-point hands whose geometry lands clearly inside the default
//! calibration thresholds, so fixtures, the CLI simulator and tests can drive
//! the classifier without a camera. Offsets are relative to the wrist in
//! normalized camera units (negative y = up).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{CombatGesture, MovementGesture};
use crate::analysis::detection::{DetectedHand, Handedness};
use crate::analysis::landmarks::*;
use crate::calibration::CalibrationProfile;

/// Recognizable hand shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPose {
    /// All fingers folded onto the palm
    Fist,
    /// Fingers half bent, thumb low; neither fist nor open
    Relaxed,
    /// All fingers spread
    Open,
    /// Index out, thumb up, other fingers curled
    Gun,
    /// Gun pose with the middle finger extended alongside
    IronSight,
    /// Gun pose with the index finger hooked towards its base
    Trigger,
}

impl SyntheticPose {
    /// Pose that the default profile classifies as `gesture`
    pub fn for_combat(gesture: CombatGesture) -> Self {
        match gesture {
            CombatGesture::Idle => SyntheticPose::Relaxed,
            CombatGesture::Aim => SyntheticPose::Gun,
            CombatGesture::IronSight => SyntheticPose::IronSight,
            CombatGesture::Fire => SyntheticPose::Trigger,
            CombatGesture::Reload => SyntheticPose::Open,
        }
    }

    /// (index, middle, ring, pinky) tip offsets followed by the thumb tip
    fn tip_offsets(self) -> ([(f32, f32); 4], (f32, f32)) {
        const CURLED_MIDDLE: (f32, f32) = (0.0, -0.06);
        const CURLED_RING: (f32, f32) = (0.02, -0.055);
        const CURLED_PINKY: (f32, f32) = (0.035, -0.05);
        const THUMB_UP: (f32, f32) = (-0.06, -0.13);

        match self {
            SyntheticPose::Fist => (
                [(-0.02, -0.06), CURLED_MIDDLE, CURLED_RING, CURLED_PINKY],
                (-0.03, -0.05),
            ),
            SyntheticPose::Relaxed => (
                [(-0.03, -0.14), (0.0, -0.15), (0.03, -0.14), (0.05, -0.12)],
                (-0.08, -0.06),
            ),
            SyntheticPose::Open => (
                [(-0.05, -0.19), (0.0, -0.2), (0.05, -0.19), (0.09, -0.16)],
                (-0.12, -0.1),
            ),
            SyntheticPose::Gun => (
                [(-0.02, -0.19), CURLED_MIDDLE, CURLED_RING, CURLED_PINKY],
                THUMB_UP,
            ),
            SyntheticPose::IronSight => (
                [(-0.02, -0.19), (0.01, -0.19), CURLED_RING, CURLED_PINKY],
                THUMB_UP,
            ),
            SyntheticPose::Trigger => (
                [(-0.02, -0.135), CURLED_MIDDLE, CURLED_RING, CURLED_PINKY],
                THUMB_UP,
            ),
        }
    }
}

const THUMB_BASE: [(f32, f32); 3] = [(-0.03, -0.03), (-0.05, -0.05), (-0.06, -0.07)];
const FINGER_MCPS: [(f32, f32); 4] = [(-0.02, -0.09), (0.0, -0.095), (0.02, -0.09), (0.04, -0.08)];

/// Build a hand in `pose` with its wrist at (`wrist_x`, `wrist_y`)
pub fn synthetic_hand(pose: SyntheticPose, wrist_x: f32, wrist_y: f32) -> HandLandmarks {
    let (tips, thumb_tip) = pose.tip_offsets();
    let at = |(dx, dy): (f32, f32)| HandLandmark::new(wrist_x + dx, wrist_y + dy);
    let lerp = |a: (f32, f32), b: (f32, f32), t: f32| (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);

    let mut points = [HandLandmark::new(wrist_x, wrist_y); LANDMARK_COUNT];
    points[THUMB_CMC] = at(THUMB_BASE[0]);
    points[THUMB_MCP] = at(THUMB_BASE[1]);
    points[THUMB_IP] = at(THUMB_BASE[2]);
    points[THUMB_TIP] = at(thumb_tip);

    let fingers = [
        [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
        [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
        [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
        [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
    ];
    for (finger, (mcp, tip)) in fingers.iter().zip(FINGER_MCPS.iter().zip(tips.iter())) {
        points[finger[0]] = at(*mcp);
        points[finger[1]] = at(lerp(*mcp, *tip, 1.0 / 3.0));
        points[finger[2]] = at(lerp(*mcp, *tip, 2.0 / 3.0));
        points[finger[3]] = at(*tip);
    }

    HandLandmarks::new(points)
}

/// Same as [`synthetic_hand`] with uniform per-point noise of +/- `amplitude`
pub fn jittered_hand<R: Rng>(
    pose: SyntheticPose,
    wrist_x: f32,
    wrist_y: f32,
    amplitude: f32,
    rng: &mut R,
) -> HandLandmarks {
    let mut points = *synthetic_hand(pose, wrist_x, wrist_y).points();
    if amplitude > 0.0 {
        for point in points.iter_mut() {
            point.x += rng.gen_range(-amplitude..amplitude);
            point.y += rng.gen_range(-amplitude..amplitude);
        }
    }
    HandLandmarks::new(points)
}

/// Wrist position that `profile` classifies as `gesture` for an open-ish hand
pub fn movement_wrist(gesture: MovementGesture, profile: &CalibrationProfile) -> (f32, f32) {
    let step = profile.movement_deadzone + 0.04;
    let (cx, cy) = (profile.movement_center_x, profile.movement_center_y);
    match gesture {
        MovementGesture::Stop => (cx, cy),
        MovementGesture::Forward => (cx, cy - step),
        MovementGesture::Backward => (cx, cy + step),
        // Mirrored preview: moving the wrist right in camera space reads as LEFT
        MovementGesture::Left => (cx + step, cy),
        MovementGesture::Right => (cx - step, cy),
    }
}

/// Movement hand placed for `gesture` under `profile`
pub fn movement_hand(gesture: MovementGesture, profile: &CalibrationProfile) -> DetectedHand {
    let (x, y) = movement_wrist(gesture, profile);
    DetectedHand {
        handedness: Handedness::Left,
        landmarks: synthetic_hand(SyntheticPose::Relaxed, x, y),
    }
}

/// Default wrist position of the combat hand (right half of the frame)
pub const COMBAT_WRIST: (f32, f32) = (0.75, 0.55);

/// Combat hand posed for `gesture`
pub fn combat_hand(gesture: CombatGesture) -> DetectedHand {
    DetectedHand {
        handedness: Handedness::Right,
        landmarks: synthetic_hand(
            SyntheticPose::for_combat(gesture),
            COMBAT_WRIST.0,
            COMBAT_WRIST.1,
        ),
    }
}
