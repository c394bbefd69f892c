// CalibrationProcedure - neutral pose capture workflow
//
// This module manages the calibration workflow for the movement hand. The
// player holds the movement hand relaxed and upright in the left half of
// the frame while the procedure collects wrist positions:
// 1. Collect N valid neutral-pose samples (default: 30, about one second)
// 2. Finalize to a CalibrationProfile centred on the mean wrist position
//
// Each sample is validated before acceptance so a stray frame (hand out of
// view, fist, tilted hand) cannot drag the deadzone centre.

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::assign_roles;
use crate::analysis::detection::LandmarkFrame;
use crate::analysis::landmarks::{angle_at, HandLandmark, HandLandmarks, MIDDLE_MCP, WRIST};
use crate::calibration::state::CalibrationProfile;
use crate::error::CalibrationError;

/// Default number of neutral-pose samples
pub const DEFAULT_SAMPLES_NEEDED: u8 = 30;

/// Largest accepted tilt of the wrist→middle-base axis away from vertical
pub const MAX_HAND_TILT_RADIANS: f32 = 1.0;

/// Progress information for the running calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProgress {
    /// Number of samples accepted so far
    pub samples_collected: u8,
    /// Total samples needed
    pub samples_needed: u8,
}

impl CalibrationProgress {
    /// Check if enough samples were collected
    pub fn is_complete(&self) -> bool {
        self.samples_collected >= self.samples_needed
    }
}

/// CalibrationProcedure collects neutral wrist positions
pub struct CalibrationProcedure {
    /// Accepted wrist positions
    samples: Vec<HandLandmark>,
    /// Samples needed before finalize succeeds
    samples_needed: u8,
    /// Profile whose thresholds are carried over into the result
    base: CalibrationProfile,
}

impl CalibrationProcedure {
    /// Create a new calibration procedure
    ///
    /// # Arguments
    /// * `samples_needed` - Number of samples to collect (at least 1)
    /// * `base` - Profile providing every field except the movement centre
    pub fn new(samples_needed: u8, base: CalibrationProfile) -> Self {
        Self {
            samples: Vec::with_capacity(samples_needed as usize),
            samples_needed: samples_needed.max(1),
            base,
        }
    }

    /// Create with default configuration on top of the default profile
    pub fn new_default() -> Self {
        Self::new(DEFAULT_SAMPLES_NEEDED, CalibrationProfile::new_default())
    }

    /// Add the movement hand of a detector frame
    ///
    /// The movement hand is picked with the same role assignment the
    /// classifier uses.
    pub fn add_frame(&mut self, frame: &LandmarkFrame) -> Result<CalibrationProgress, CalibrationError> {
        match assign_roles(&frame.hands).movement {
            Some(hand) => self.add_sample(&hand.landmarks),
            None => Err(CalibrationError::InvalidSample {
                reason: "movement hand not in view".to_string(),
            }),
        }
    }

    /// Add a neutral-pose sample
    ///
    /// # Returns
    /// * `Ok(CalibrationProgress)` - Sample accepted
    /// * `Err(CalibrationError::InvalidSample)` - Sample rejected, try again
    pub fn add_sample(&mut self, hand: &HandLandmarks) -> Result<CalibrationProgress, CalibrationError> {
        if self.get_progress().is_complete() {
            return Err(CalibrationError::InvalidSample {
                reason: "calibration samples already complete".to_string(),
            });
        }

        self.validate_sample(hand)?;
        self.samples.push(hand.wrist());
        Ok(self.get_progress())
    }

    /// Validate a single sample
    fn validate_sample(&self, hand: &HandLandmarks) -> Result<(), CalibrationError> {
        if !hand.is_finite() {
            return Err(CalibrationError::InvalidSample {
                reason: "non-finite landmark coordinates".to_string(),
            });
        }

        let wrist = hand.wrist();
        if !(0.0..=1.0).contains(&wrist.x) || !(0.0..=1.0).contains(&wrist.y) {
            return Err(CalibrationError::InvalidSample {
                reason: format!("wrist ({:.3}, {:.3}) outside the frame", wrist.x, wrist.y),
            });
        }

        if wrist.x >= 0.5 {
            return Err(CalibrationError::InvalidSample {
                reason: format!("wrist x {:.3} is not in the movement half", wrist.x),
            });
        }

        let closed = hand
            .fingertip_distances()
            .iter()
            .all(|distance| *distance < self.base.fist_stop_threshold);
        if closed {
            return Err(CalibrationError::InvalidSample {
                reason: "hand is closed; relax the hand".to_string(),
            });
        }

        let above_wrist = HandLandmark::new(wrist.x, wrist.y - 1.0);
        let tilt = angle_at(above_wrist, hand.get(WRIST), hand.get(MIDDLE_MCP));
        if tilt > MAX_HAND_TILT_RADIANS {
            return Err(CalibrationError::InvalidSample {
                reason: format!("hand tilted by {:.2} rad; hold it upright", tilt),
            });
        }

        Ok(())
    }

    /// Get current calibration progress
    pub fn get_progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            samples_collected: self.samples.len().min(u8::MAX as usize) as u8,
            samples_needed: self.samples_needed,
        }
    }

    /// Check if enough samples were collected
    pub fn is_complete(&self) -> bool {
        self.get_progress().is_complete()
    }

    /// Compute the calibrated profile
    ///
    /// # Returns
    /// * `Ok(CalibrationProfile)` - base profile re-centred on the mean wrist
    /// * `Err(CalibrationError::InsufficientSamples)` - finalized too early
    pub fn finalize(&self) -> Result<CalibrationProfile, CalibrationError> {
        if !self.is_complete() {
            return Err(CalibrationError::InsufficientSamples {
                required: self.samples_needed as usize,
                collected: self.samples.len(),
            });
        }

        let count = self.samples.len() as f32;
        let (sum_x, sum_y) = self
            .samples
            .iter()
            .fold((0.0_f32, 0.0_f32), |(sx, sy), p| (sx + p.x, sy + p.y));

        let profile = self.base.with_movement_center(sum_x / count, sum_y / count);
        profile.validate()?;

        log::info!(
            "[CalibrationProcedure] Movement centre calibrated to ({:.3}, {:.3}) from {} samples",
            profile.movement_center_x,
            profile.movement_center_y,
            self.samples.len()
        );
        Ok(profile)
    }

    /// Discard collected samples
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
