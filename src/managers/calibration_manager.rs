// CalibrationManager: Focused manager for the calibration profile
//
// Single Responsibility: profile ownership, validated updates and the
// neutral-pose calibration workflow

use std::sync::{Arc, Mutex, RwLock};

use crate::analysis::detection::LandmarkFrame;
use crate::calibration::{CalibrationProcedure, CalibrationProfile, CalibrationProgress};
use crate::error::{log_calibration_error, CalibrationError};

/// Manages the shared calibration profile
///
/// This manager handles:
/// - Validated, atomic profile replacement (the only write path)
/// - Starting/finishing the neutral-pose calibration procedure
/// - Sharing the profile with the gesture pipeline
/// - Thread-safe lock management
///
/// # Example
/// ```ignore
/// let manager = CalibrationManager::new(CalibrationProfile::new_default(), 30);
/// manager.start()?;
/// // ... feed detector frames via add_frame ...
/// let profile = manager.finish()?;
/// ```
pub struct CalibrationManager {
    procedure: Arc<Mutex<Option<CalibrationProcedure>>>,
    profile: Arc<RwLock<CalibrationProfile>>,
    samples_needed: u8,
}

impl CalibrationManager {
    /// Create a new CalibrationManager
    ///
    /// An invalid initial profile is replaced by the default one.
    pub fn new(initial: CalibrationProfile, samples_needed: u8) -> Self {
        let initial = match initial.validate() {
            Ok(()) => initial,
            Err(err) => {
                log_calibration_error(&err, "init_calibration_manager");
                CalibrationProfile::new_default()
            }
        };

        Self {
            procedure: Arc::new(Mutex::new(None)),
            profile: Arc::new(RwLock::new(initial)),
            samples_needed,
        }
    }

    /// Replace the profile after validation
    ///
    /// # Returns
    /// * `Ok(())` - profile replaced; the classifier sees it from the next frame
    /// * `Err(CalibrationError)` - rejected, previous profile kept
    pub fn update(&self, profile: CalibrationProfile) -> Result<(), CalibrationError> {
        if let Err(err) = profile.validate() {
            log_calibration_error(&err, "update_profile");
            log::warn!("[CalibrationManager] Rejected profile update, keeping previous profile");
            return Err(err);
        }

        let mut guard = self.write_profile().inspect_err(|err| {
            log_calibration_error(err, "update_profile");
        })?;
        *guard = profile;
        log::info!(
            "[CalibrationManager] Profile updated (centre {:.3}, {:.3}, smoothing {})",
            profile.movement_center_x,
            profile.movement_center_y,
            profile.smoothing_frames
        );
        Ok(())
    }

    /// Current profile
    pub fn get_profile(&self) -> Result<CalibrationProfile, CalibrationError> {
        let guard = self.read_profile().inspect_err(|err| {
            log_calibration_error(err, "get_profile");
        })?;
        Ok(*guard)
    }

    /// Shared handle read by the gesture pipeline
    pub fn get_profile_arc(&self) -> Arc<RwLock<CalibrationProfile>> {
        Arc::clone(&self.profile)
    }

    /// Start the neutral-pose calibration workflow
    ///
    /// # Errors
    /// - Calibration already in progress
    /// - Lock poisoning on profile or procedure state
    pub fn start(&self) -> Result<CalibrationProgress, CalibrationError> {
        let base = self.get_profile()?;
        let mut procedure_guard = self.lock_procedure()?;

        if procedure_guard.is_some() {
            let err = CalibrationError::AlreadyInProgress;
            log_calibration_error(&err, "start_calibration");
            return Err(err);
        }

        let procedure = CalibrationProcedure::new(self.samples_needed, base);
        let progress = procedure.get_progress();
        *procedure_guard = Some(procedure);
        Ok(progress)
    }

    /// Feed one detector frame into the running procedure
    pub fn add_frame(&self, frame: &LandmarkFrame) -> Result<CalibrationProgress, CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;
        match procedure_guard.as_mut() {
            Some(procedure) => procedure.add_frame(frame),
            None => Err(CalibrationError::NotInProgress),
        }
    }

    /// Finish calibration and install the resulting profile
    ///
    /// On `InsufficientSamples` the procedure keeps running so more frames
    /// can be collected.
    pub fn finish(&self) -> Result<CalibrationProfile, CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;

        let profile = match procedure_guard.as_ref() {
            Some(procedure) => procedure.finalize().inspect_err(|err| {
                log_calibration_error(err, "finish_calibration");
            })?,
            None => {
                let err = CalibrationError::NotInProgress;
                log_calibration_error(&err, "finish_calibration");
                return Err(err);
            }
        };

        self.update(profile)?;
        *procedure_guard = None;
        Ok(profile)
    }

    /// Abandon a running calibration; the profile is left untouched
    pub fn cancel(&self) -> Result<(), CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;
        *procedure_guard = None;
        Ok(())
    }

    pub fn is_in_progress(&self) -> bool {
        self.procedure
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    // ========================================================================
    // HELPER METHODS - Lock management
    // ========================================================================

    fn lock_procedure(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<CalibrationProcedure>>, CalibrationError> {
        self.procedure
            .lock()
            .map_err(|_| CalibrationError::StatePoisoned)
    }

    fn read_profile(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, CalibrationProfile>, CalibrationError> {
        self.profile
            .read()
            .map_err(|_| CalibrationError::StatePoisoned)
    }

    fn write_profile(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, CalibrationProfile>, CalibrationError> {
        self.profile
            .write()
            .map_err(|_| CalibrationError::StatePoisoned)
    }
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(
            CalibrationProfile::new_default(),
            crate::calibration::procedure::DEFAULT_SAMPLES_NEEDED,
        )
    }
}
