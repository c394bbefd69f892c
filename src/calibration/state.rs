// CalibrationProfile - threshold storage for gesture classification
//
// This module stores the values the GestureClassifier reads on every frame:
// the movement deadzone centre, the finger distance thresholds and the
// smoothing window. Profiles are either defaults or produced by an explicit
// calibration update, and are validated before they can reach the classifier.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Smallest accepted smoothing window
pub const MIN_SMOOTHING_FRAMES: u8 = 1;
/// Largest accepted smoothing window
pub const MAX_SMOOTHING_FRAMES: u8 = 10;

/// CalibrationProfile parameterizes the gesture classifier
///
/// Field names are serialized in camelCase so profiles written by the
/// browser client load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProfile {
    /// Neutral wrist X for the movement hand (raw camera space)
    pub movement_center_x: f32,
    /// Neutral wrist Y for the movement hand (raw camera space)
    pub movement_center_y: f32,
    /// Tolerance around the centre that still counts as STOP
    pub movement_deadzone: f32,
    /// All fingertips closer to the wrist than this = fist
    pub fist_stop_threshold: f32,
    /// Index fingertip farther from the wrist than this = extended
    pub index_extended_threshold: f32,
    /// Index tip closer to its base than this = trigger pulled
    pub fire_curl_threshold: f32,
    /// All fingertips farther from the wrist than this = open hand
    pub open_hand_threshold: f32,
    /// Frames a gesture must persist before it is accepted
    #[serde(default = "default_smoothing_frames")]
    pub smoothing_frames: u8,
}

fn default_smoothing_frames() -> u8 {
    3
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::new_default()
    }
}

impl CalibrationProfile {
    /// Create the default profile
    ///
    /// The movement centre sits in the middle of the left half of the frame,
    /// where the movement hand rests. Distance thresholds assume a hand that
    /// spans roughly a fifth of the frame height.
    pub fn new_default() -> Self {
        Self {
            movement_center_x: 0.25,
            movement_center_y: 0.5,
            movement_deadzone: 0.08,
            fist_stop_threshold: 0.1,
            index_extended_threshold: 0.12,
            fire_curl_threshold: 0.06,
            open_hand_threshold: 0.16,
            smoothing_frames: default_smoothing_frames(),
        }
    }

    /// Validate every bound of the profile
    ///
    /// # Returns
    /// * `Ok(())` - profile may be handed to the classifier
    /// * `Err(CalibrationError::OutOfRange)` - first offending field
    ///
    /// # Validation
    /// - All float fields must be finite and within [0.0, 1.0]
    /// - `smoothing_frames` must be within [1, 10]
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let unit_fields = [
            ("movementCenterX", self.movement_center_x),
            ("movementCenterY", self.movement_center_y),
            ("movementDeadzone", self.movement_deadzone),
            ("fistStopThreshold", self.fist_stop_threshold),
            ("indexExtendedThreshold", self.index_extended_threshold),
            ("fireCurlThreshold", self.fire_curl_threshold),
            ("openHandThreshold", self.open_hand_threshold),
        ];

        for (field, value) in unit_fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(CalibrationError::OutOfRange {
                    field,
                    value: value as f64,
                });
            }
        }

        if !(MIN_SMOOTHING_FRAMES..=MAX_SMOOTHING_FRAMES).contains(&self.smoothing_frames) {
            return Err(CalibrationError::OutOfRange {
                field: "smoothingFrames",
                value: self.smoothing_frames as f64,
            });
        }

        Ok(())
    }

    /// Copy of this profile with a new movement centre
    pub fn with_movement_center(self, x: f32, y: f32) -> Self {
        Self {
            movement_center_x: x,
            movement_center_y: y,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_default_is_valid() {
        let profile = CalibrationProfile::new_default();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.smoothing_frames, 3);
        assert_eq!(profile.movement_center_x, 0.25);
    }

    #[test]
    fn test_validate_rejects_out_of_unit_range() {
        let profile = CalibrationProfile {
            movement_deadzone: 1.2,
            ..CalibrationProfile::new_default()
        };
        match profile.validate() {
            Err(CalibrationError::OutOfRange { field, .. }) => {
                assert_eq!(field, "movementDeadzone")
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }

        let profile = CalibrationProfile {
            fire_curl_threshold: -0.01,
            ..CalibrationProfile::new_default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let profile = CalibrationProfile {
            open_hand_threshold: f32::NAN,
            ..CalibrationProfile::new_default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_smoothing_bounds() {
        for frames in [0u8, 11, 200] {
            let profile = CalibrationProfile {
                smoothing_frames: frames,
                ..CalibrationProfile::new_default()
            };
            match profile.validate() {
                Err(CalibrationError::OutOfRange { field, value }) => {
                    assert_eq!(field, "smoothingFrames");
                    assert_eq!(value, frames as f64);
                }
                other => panic!("Expected OutOfRange for {}, got {:?}", frames, other),
            }
        }

        for frames in [1u8, 10] {
            let profile = CalibrationProfile {
                smoothing_frames: frames,
                ..CalibrationProfile::new_default()
            };
            assert!(profile.validate().is_ok());
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let profile = CalibrationProfile {
            movement_center_x: 0.0,
            movement_center_y: 1.0,
            ..CalibrationProfile::new_default()
        };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&CalibrationProfile::new_default()).unwrap();
        assert!(json.contains("movementCenterX"), "{}", json);
        assert!(json.contains("smoothingFrames"), "{}", json);
    }

    #[test]
    fn test_deserialization_without_smoothing_uses_default() {
        let json = r#"{
            "movementCenterX": 0.3,
            "movementCenterY": 0.45,
            "movementDeadzone": 0.1,
            "fistStopThreshold": 0.09,
            "indexExtendedThreshold": 0.13,
            "fireCurlThreshold": 0.05,
            "openHandThreshold": 0.17
        }"#;

        let profile: CalibrationProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.smoothing_frames, 3);
        assert!((profile.movement_center_x - 0.3).abs() < 1e-6);
    }
}
