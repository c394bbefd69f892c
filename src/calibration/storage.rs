// Calibration storage - JSON persistence for CalibrationProfile
//
// Persisted profiles are untrusted: a profile only reaches the classifier
// after it parsed and passed validate(). Anything else falls back to the
// default profile with a warning.

use std::fs;
use std::path::Path;

use crate::calibration::state::CalibrationProfile;
use crate::error::{log_calibration_error, CalibrationError};

/// Parse and validate a profile from JSON text
pub fn parse_profile(json: &str) -> Result<CalibrationProfile, CalibrationError> {
    let profile: CalibrationProfile = serde_json::from_str(json)?;
    profile.validate()?;
    Ok(profile)
}

/// Load a validated profile from `path`
///
/// # Returns
/// * `Ok(CalibrationProfile)` - parsed and within bounds
/// * `Err(CalibrationError)` - missing, malformed or out-of-range data
pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<CalibrationProfile, CalibrationError> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_profile(&contents)
}

/// Load a profile, falling back to defaults on any failure
pub fn load_profile_or_default<P: AsRef<Path>>(path: P) -> CalibrationProfile {
    match load_profile(path.as_ref()) {
        Ok(profile) => {
            log::info!("[Calibration] Loaded profile from {:?}", path.as_ref());
            profile
        }
        Err(err) => {
            log_calibration_error(&err, "load_profile");
            log::warn!(
                "[Calibration] Using default profile instead of {:?}",
                path.as_ref()
            );
            CalibrationProfile::new_default()
        }
    }
}

/// Save a profile as pretty JSON, creating parent directories
///
/// Invalid profiles are refused so a later load never sees them.
pub fn save_profile<P: AsRef<Path>>(
    path: P,
    profile: &CalibrationProfile,
) -> Result<(), CalibrationError> {
    profile.validate()?;

    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(profile)?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}
