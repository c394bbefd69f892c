//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers landmark fixtures, renders their pose scripts into
//! detector frames, parses optional expectation JSON, and runs the gesture
//! pipeline against a calibration profile. It is desktop-focused to support
//! CI and QA workflows.
//!
//! A fixture is `<name>.landmarks.json`, holding recorded frames and/or
//! scripted pose segments, with an optional `<name>.expect.json` listing
//! the hand states the pipeline must emit, in order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{CombatGesture, MovementGesture};
use crate::analysis::detection::{DetectedHand, Handedness, LandmarkFrame};
use crate::analysis::smoothing::HandState;
use crate::analysis::{intents, GesturePipeline, Intent};
use crate::calibration::CalibrationProfile;

pub mod poses;

use poses::{jittered_hand, movement_wrist, SyntheticPose, COMBAT_WRIST};

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const LANDMARKS_SUFFIX: &str = ".landmarks.json";
const EXPECT_SUFFIX: &str = ".expect.json";

/// Metadata describing an available fixture.
#[derive(Clone, Debug, Serialize)]
pub struct FixtureMetadata {
    pub name: String,
    pub landmarks_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// One scripted run of identical poses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSegment {
    pub frames: u32,
    /// `None` = movement hand out of view
    #[serde(default)]
    pub movement: Option<MovementGesture>,
    /// `None` = combat hand out of view
    #[serde(default)]
    pub combat: Option<CombatGesture>,
    #[serde(default = "default_movement_pose")]
    pub movement_pose: SyntheticPose,
}

fn default_movement_pose() -> SyntheticPose {
    SyntheticPose::Relaxed
}

/// On-disk fixture schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFile {
    pub fixture: String,
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    /// Profile to classify with; the default profile when absent
    #[serde(default)]
    pub profile: Option<CalibrationProfile>,
    #[serde(default)]
    pub seed: u64,
    /// Uniform landmark noise applied to scripted segments
    #[serde(default)]
    pub jitter: f32,
    /// Recorded frames, played before the scripted segments
    #[serde(default)]
    pub frames: Vec<LandmarkFrame>,
    #[serde(default)]
    pub segments: Vec<PoseSegment>,
}

fn default_frame_interval() -> u64 {
    33
}

impl FixtureFile {
    pub fn profile(&self) -> CalibrationProfile {
        self.profile.unwrap_or_default()
    }

    /// Expand recorded frames and segments into a timestamped frame list
    pub fn render(&self) -> Vec<LandmarkFrame> {
        let profile = self.profile();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut frames = self.frames.clone();

        for segment in &self.segments {
            for _ in 0..segment.frames {
                frames.push(render_segment_frame(segment, &profile, self.jitter, &mut rng));
            }
        }

        for (idx, frame) in frames.iter_mut().enumerate() {
            frame.timestamp_ms = idx as u64 * self.frame_interval_ms;
        }
        frames
    }
}

fn render_segment_frame<R: Rng>(
    segment: &PoseSegment,
    profile: &CalibrationProfile,
    jitter: f32,
    rng: &mut R,
) -> LandmarkFrame {
    let mut hands = Vec::with_capacity(2);
    if let Some(movement) = segment.movement {
        let (x, y) = movement_wrist(movement, profile);
        hands.push(DetectedHand {
            handedness: Handedness::Left,
            landmarks: jittered_hand(segment.movement_pose, x, y, jitter, rng),
        });
    }
    if let Some(combat) = segment.combat {
        hands.push(DetectedHand {
            handedness: Handedness::Right,
            landmarks: jittered_hand(
                SyntheticPose::for_combat(combat),
                COMBAT_WRIST.0,
                COMBAT_WRIST.1,
                jitter,
                rng,
            ),
        });
    }
    LandmarkFrame::new(0, hands)
}

/// Loaded fixture with rendered frames.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub file: FixtureFile,
    pub frames: Vec<LandmarkFrame>,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub states: Vec<ExpectedState>,
}

/// Expected emitted hand state; presence flags are checked only when given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedState {
    pub movement: MovementGesture,
    pub combat: CombatGesture,
    #[serde(default)]
    pub left_hand_present: Option<bool>,
    #[serde(default)]
    pub right_hand_present: Option<bool>,
}

impl ExpectedState {
    fn matches(&self, state: &HandState) -> bool {
        self.movement == state.movement
            && self.combat == state.combat
            && self
                .left_hand_present
                .map_or(true, |present| present == state.left_hand_present)
            && self
                .right_hand_present
                .map_or(true, |present| present == state.right_hand_present)
    }
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &[EmittedState]) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for (idx, expected) in self.states.iter().enumerate() {
            match actual.get(idx) {
                Some(emitted) if expected.matches(&emitted.state) => {}
                other => failures.push(ExpectationFailure {
                    index: idx,
                    expected: Some(expected.clone()),
                    actual: other.cloned(),
                }),
            }
        }

        for (idx, emitted) in actual.iter().enumerate().skip(self.states.len()) {
            failures.push(ExpectationFailure {
                index: idx,
                expected: None,
                actual: Some(emitted.clone()),
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "index": failure.index,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub index: usize,
    /// `None` for an unexpected extra state
    pub expected: Option<ExpectedState>,
    /// `None` for a missing state
    pub actual: Option<EmittedState>,
}

/// Hand state emitted while running a fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedState {
    pub frame_index: usize,
    pub timestamp_ms: u64,
    pub state: HandState,
    pub intents: Vec<Intent>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if fixture_name(&path).is_some() {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load and render a fixture plus expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let landmarks_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&landmarks_path)?;

        let json = fs::read_to_string(&landmarks_path)
            .with_context(|| format!("reading fixture {}", landmarks_path.display()))?;
        let file: FixtureFile = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", landmarks_path.display()))?;
        if let Some(profile) = &file.profile {
            profile
                .validate()
                .with_context(|| format!("profile in {}", landmarks_path.display()))?;
        }

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        let frames = file.render();
        Ok(FixtureData {
            metadata,
            file,
            frames,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}{LANDMARKS_SUFFIX}"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, landmarks_path: &Path) -> Result<FixtureMetadata> {
        let name = fixture_name(landmarks_path)
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", landmarks_path.display()))?;
        let expect_path = landmarks_path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            landmarks_path: landmarks_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn fixture_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(LANDMARKS_SUFFIX))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Runs fixture frames through the gesture pipeline.
pub struct FixtureProcessor {
    calibration: Arc<RwLock<CalibrationProfile>>,
}

impl FixtureProcessor {
    pub fn new(calibration: Arc<RwLock<CalibrationProfile>>) -> Self {
        Self { calibration }
    }

    /// Processor bound to the fixture's own profile
    pub fn for_fixture(data: &FixtureData) -> Self {
        Self::new(Arc::new(RwLock::new(data.file.profile())))
    }

    pub fn run(&self, frames: &[LandmarkFrame]) -> Vec<EmittedState> {
        let mut pipeline = GesturePipeline::new(Arc::clone(&self.calibration));
        let mut emitted = Vec::new();

        for (frame_index, frame) in frames.iter().enumerate() {
            let previous = pipeline.hand_state();
            if let Some(state) = pipeline.process_frame(frame) {
                emitted.push(EmittedState {
                    frame_index,
                    timestamp_ms: frame.timestamp_ms,
                    state,
                    intents: intents(&previous, &state),
                });
            }
        }

        emitted
    }
}

// ============================================================================
// SYNTHETIC SESSIONS
// ============================================================================

/// Random but reproducible gesture script for the CLI simulator.
///
/// Segments last 4..=15 frames; hands drop out of view now and then.
pub fn synthetic_segments(total_frames: u32, seed: u64) -> Vec<PoseSegment> {
    const MOVEMENTS: [MovementGesture; 5] = [
        MovementGesture::Stop,
        MovementGesture::Forward,
        MovementGesture::Backward,
        MovementGesture::Left,
        MovementGesture::Right,
    ];
    const COMBAT: [CombatGesture; 5] = [
        CombatGesture::Idle,
        CombatGesture::Aim,
        CombatGesture::IronSight,
        CombatGesture::Fire,
        CombatGesture::Reload,
    ];

    let mut rng = StdRng::seed_from_u64(seed);
    let mut segments = Vec::new();
    let mut remaining = total_frames;

    while remaining > 0 {
        let frames = rng.gen_range(4..=15).min(remaining);
        let movement = (!rng.gen_bool(0.05)).then(|| MOVEMENTS[rng.gen_range(0..MOVEMENTS.len())]);
        let combat = (!rng.gen_bool(0.05)).then(|| COMBAT[rng.gen_range(0..COMBAT.len())]);
        segments.push(PoseSegment {
            frames,
            movement,
            combat,
            movement_pose: SyntheticPose::Relaxed,
        });
        remaining -= frames;
    }

    segments
}

/// Render a synthetic session straight into frames
pub fn synthetic_frames(
    total_frames: u32,
    seed: u64,
    frame_interval_ms: u64,
    profile: Option<CalibrationProfile>,
) -> Vec<LandmarkFrame> {
    FixtureFile {
        fixture: format!("synthetic-{seed}"),
        frame_interval_ms,
        profile,
        seed,
        jitter: 0.003,
        frames: Vec::new(),
        segments: synthetic_segments(total_frames, seed),
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(frames: u32, movement: MovementGesture, combat: CombatGesture) -> PoseSegment {
        PoseSegment {
            frames,
            movement: Some(movement),
            combat: Some(combat),
            movement_pose: SyntheticPose::Relaxed,
        }
    }

    fn script(segments: Vec<PoseSegment>) -> FixtureFile {
        FixtureFile {
            fixture: "inline".to_string(),
            frame_interval_ms: 33,
            profile: None,
            seed: 1,
            jitter: 0.002,
            frames: Vec::new(),
            segments,
        }
    }

    fn run(file: &FixtureFile) -> Vec<EmittedState> {
        FixtureProcessor::new(Arc::new(RwLock::new(file.profile()))).run(&file.render())
    }

    #[test]
    fn test_render_timestamps_frames() {
        let file = script(vec![segment(3, MovementGesture::Stop, CombatGesture::Idle)]);
        let frames = file.render();
        let stamps: Vec<u64> = frames.iter().map(|f| f.timestamp_ms).collect();
        assert_eq!(stamps, vec![0, 33, 66]);
        assert!(frames.iter().all(|f| f.hands.len() == 2));
    }

    #[test]
    fn test_script_emits_expected_states() {
        let file = script(vec![
            segment(4, MovementGesture::Forward, CombatGesture::Aim),
            segment(4, MovementGesture::Forward, CombatGesture::Fire),
            segment(4, MovementGesture::Right, CombatGesture::Reload),
        ]);
        let emitted = run(&file);

        let states: Vec<(MovementGesture, CombatGesture)> = emitted
            .iter()
            .map(|e| (e.state.movement, e.state.combat))
            .collect();
        assert_eq!(
            states,
            vec![
                (MovementGesture::Forward, CombatGesture::Aim),
                (MovementGesture::Forward, CombatGesture::Fire),
                (MovementGesture::Right, CombatGesture::Reload),
            ]
        );
        assert_eq!(emitted[0].frame_index, 2);
        assert_eq!(emitted[1].intents, vec![Intent::Fire]);
        assert_eq!(
            emitted[2].intents,
            vec![Intent::Movement(MovementGesture::Right), Intent::Reload]
        );
    }

    #[test]
    fn test_verify_reports_missing_and_extra_states() {
        let expectations = FixtureExpectations {
            fixture: "inline".to_string(),
            notes: None,
            states: vec![
                ExpectedState {
                    movement: MovementGesture::Forward,
                    combat: CombatGesture::Aim,
                    left_hand_present: Some(true),
                    right_hand_present: None,
                },
                ExpectedState {
                    movement: MovementGesture::Stop,
                    combat: CombatGesture::Idle,
                    left_hand_present: None,
                    right_hand_present: None,
                },
            ],
        };

        let emitted = run(&script(vec![segment(4, MovementGesture::Forward, CombatGesture::Aim)]));
        let diff = expectations.verify(&emitted).unwrap_err();
        assert_eq!(diff.failures.len(), 1);
        assert_eq!(diff.failures[0].index, 1);
        assert!(diff.failures[0].actual.is_none());

        let emitted = run(&script(vec![
            segment(4, MovementGesture::Forward, CombatGesture::Aim),
            segment(4, MovementGesture::Stop, CombatGesture::Idle),
            segment(4, MovementGesture::Left, CombatGesture::Idle),
        ]));
        let diff = expectations.verify(&emitted).unwrap_err();
        assert_eq!(diff.failures.len(), 1);
        assert!(diff.failures[0].expected.is_none());
        assert_eq!(diff.to_json()["failures"][0]["index"], 2);
    }

    #[test]
    fn test_synthetic_frames_are_reproducible() {
        let a = synthetic_frames(120, 42, 33, None);
        let b = synthetic_frames(120, 42, 33, None);
        assert_eq!(a.len(), 120);
        assert_eq!(a, b);
        assert_ne!(a, synthetic_frames(120, 43, 33, None));
    }

    #[test]
    fn test_fixture_name_parsing() {
        assert_eq!(
            fixture_name(Path::new("/tmp/walk.landmarks.json")),
            Some("walk".to_string())
        );
        assert_eq!(fixture_name(Path::new("/tmp/walk.expect.json")), None);
        assert_eq!(fixture_name(Path::new("/tmp/.landmarks.json")), None);
    }

    #[test]
    fn test_bundled_fixtures_match_expectations() {
        let catalog = FixtureCatalog::default();
        let fixtures = catalog.discover().unwrap();
        assert!(!fixtures.is_empty());

        for metadata in fixtures {
            let data = catalog.load(&metadata.name, None).unwrap();
            let emitted = FixtureProcessor::for_fixture(&data).run(&data.frames);
            if let Some(expectations) = &data.expectations {
                if let Err(diff) = expectations.verify(&emitted) {
                    panic!("{} diverged: {}", metadata.name, diff.to_json());
                }
            }
        }
    }
}
