// Calibration module - gesture thresholds and the neutral pose workflow
//
// This module provides three main components:
// 1. CalibrationProfile: threshold values read by the gesture classifier
// 2. CalibrationProcedure: collects neutral-pose samples of the movement hand
// 3. storage: validated JSON persistence of the profile
//
// The calibration workflow:
// 1. Create CalibrationProcedure on top of the current profile
// 2. Collect N samples of the relaxed movement hand
// 3. Finalize to a re-centred CalibrationProfile and hand it to the manager

pub mod procedure;
pub mod state;
pub mod storage;

pub use procedure::{CalibrationProcedure, CalibrationProgress};
pub use state::CalibrationProfile;
