//! Integration tests for the calibration workflow
//!
//! These tests validate the complete calibration workflow across the engine:
//! - Neutral-pose capture from detector frames
//! - Rejection of unusable samples and early finish
//! - Profile persistence across engine instances
//! - Live smoothing window changes reaching the pipeline

use std::path::PathBuf;

use gesture_strike::analysis::classifier::{CombatGesture, MovementGesture};
use gesture_strike::analysis::detection::{DetectedHand, Handedness, LandmarkFrame};
use gesture_strike::calibration::{storage, CalibrationProfile};
use gesture_strike::config::AppConfig;
use gesture_strike::engine::{EngineHandle, EngineOptions};
use gesture_strike::error::CalibrationError;
use gesture_strike::fixtures::poses::{combat_hand, movement_hand, synthetic_hand, SyntheticPose};
use gesture_strike::telemetry::{LifecyclePhase, MetricEvent, TelemetryHub};
use std::sync::Arc;

fn temp_dir(test: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "gesture_strike_calibration_it_{}_{}",
        std::process::id(),
        test
    ))
}

fn engine(config: AppConfig) -> (EngineHandle, Arc<TelemetryHub>) {
    let telemetry = Arc::new(TelemetryHub::new(64, 256, 8));
    let engine = EngineHandle::with_options(
        config,
        EngineOptions {
            telemetry: Arc::clone(&telemetry),
            ..EngineOptions::default()
        },
    )
    .expect("engine should build");
    (engine, telemetry)
}

fn config_with_samples(samples: u8) -> AppConfig {
    let mut config = AppConfig::default().in_memory();
    config.gesture.calibration_samples = samples;
    config
}

fn neutral_frame(x: f32, y: f32) -> LandmarkFrame {
    LandmarkFrame::new(
        0,
        vec![DetectedHand {
            handedness: Handedness::Left,
            landmarks: synthetic_hand(SyntheticPose::Relaxed, x, y),
        }],
    )
}

/// Test full calibration workflow through detector frames
///
/// Test steps:
/// 1. Start calibration
/// 2. Feed a rejected sample (fist) and accepted neutral samples
/// 3. Finish and verify the new centre reaches the engine
#[tokio::test]
async fn test_full_calibration_workflow() {
    let (engine, telemetry) = engine(config_with_samples(3));

    let progress = engine.start_calibration().expect("start should succeed");
    assert_eq!(progress.samples_collected, 0);
    assert_eq!(progress.samples_needed, 3);

    let fist = LandmarkFrame::new(
        0,
        vec![DetectedHand {
            handedness: Handedness::Left,
            landmarks: synthetic_hand(SyntheticPose::Fist, 0.2, 0.4),
        }],
    );
    assert!(
        engine.process_frame(&fist).calibration.is_none(),
        "a closed hand must not count as a neutral sample"
    );

    for (x, y) in [(0.18, 0.42), (0.22, 0.38), (0.20, 0.40)] {
        let outcome = engine.process_frame(&neutral_frame(x, y));
        assert!(outcome.calibration.is_some());
    }

    let profile = engine.finish_calibration().expect("finish should succeed");
    assert!((profile.movement_center_x - 0.20).abs() < 1e-5);
    assert!((profile.movement_center_y - 0.40).abs() < 1e-5);
    assert_eq!(
        profile.movement_deadzone,
        CalibrationProfile::new_default().movement_deadzone,
        "thresholds other than the centre are carried over"
    );

    let phases: Vec<LifecyclePhase> = telemetry
        .snapshot()
        .recent
        .iter()
        .filter_map(|event| match event {
            MetricEvent::Lifecycle { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert!(phases.contains(&LifecyclePhase::CalibrationStarted));
    assert!(phases.contains(&LifecyclePhase::CalibrationFinished));
}

/// Test that calibration cannot be started twice
#[tokio::test]
async fn test_double_start_rejected() {
    let (engine, _) = engine(config_with_samples(3));

    assert!(engine.start_calibration().is_ok());
    match engine.start_calibration() {
        Err(CalibrationError::AlreadyInProgress) => {}
        other => panic!("expected AlreadyInProgress, got {:?}", other),
    }
}

/// Test early finish keeps collecting
#[tokio::test]
async fn test_finish_before_enough_samples() {
    let (engine, _) = engine(config_with_samples(4));
    let before = engine.calibration_profile().unwrap();

    engine.start_calibration().unwrap();
    engine.process_frame(&neutral_frame(0.3, 0.5));

    match engine.finish_calibration() {
        Err(CalibrationError::InsufficientSamples {
            required,
            collected,
        }) => {
            assert_eq!(required, 4);
            assert_eq!(collected, 1);
        }
        other => panic!("expected InsufficientSamples, got {:?}", other),
    }
    assert!(engine.is_calibrating(), "procedure stays open after an early finish");
    assert_eq!(engine.calibration_profile().unwrap(), before);

    engine.cancel_calibration().unwrap();
    assert!(!engine.is_calibrating());
    assert!(matches!(
        engine.finish_calibration(),
        Err(CalibrationError::NotInProgress)
    ));
}

/// Test that a calibrated profile survives an engine restart
#[tokio::test]
async fn test_profile_persists_between_engines() {
    let dir = temp_dir("persist");
    let path = dir.join("calibration.json");
    let _ = std::fs::remove_file(&path);

    let mut config = config_with_samples(2);
    config.storage.calibration_path = Some(path.clone());

    {
        let (first, _) = engine(config.clone());
        first.start_calibration().unwrap();
        first.process_frame(&neutral_frame(0.3, 0.55));
        first.process_frame(&neutral_frame(0.3, 0.55));
        first.finish_calibration().unwrap();
    }

    let stored = storage::load_profile(&path).expect("profile written to disk");
    assert!((stored.movement_center_x - 0.3).abs() < 1e-5);

    let (second, _) = engine(config);
    assert_eq!(second.calibration_profile().unwrap(), stored);

    let _ = std::fs::remove_dir_all(&dir);
}

/// Test that a corrupt profile file falls back to defaults
#[tokio::test]
async fn test_corrupt_profile_file_uses_defaults() {
    let dir = temp_dir("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("calibration.json");
    std::fs::write(&path, r#"{"movementCenterX": 7.5}"#).unwrap();

    let mut config = config_with_samples(2);
    config.storage.calibration_path = Some(path);

    let (engine, _) = engine(config);
    assert_eq!(
        engine.calibration_profile().unwrap(),
        CalibrationProfile::new_default()
    );

    let _ = std::fs::remove_dir_all(&dir);
}

/// Test that the smoothing window follows the live profile
#[tokio::test]
async fn test_smoothing_update_applies_to_next_frame() {
    let (engine, _) = engine(config_with_samples(2));
    let profile = engine.calibration_profile().unwrap();

    engine
        .update_calibration(CalibrationProfile {
            smoothing_frames: 1,
            ..profile
        })
        .expect("valid update");

    let frame = LandmarkFrame::new(
        0,
        vec![
            movement_hand(MovementGesture::Backward, &profile),
            combat_hand(CombatGesture::IronSight),
        ],
    );
    let outcome = engine.process_frame(&frame);
    assert_eq!(outcome.hand_state.movement, MovementGesture::Backward);
    assert_eq!(outcome.hand_state.combat, CombatGesture::IronSight);
}
