//! Detection capability boundary.
//!
//! The hand landmark detector (camera + model) is an external collaborator.
//! The core only sees it through [`DetectionSource`]: start a stream of
//! [`LandmarkFrame`]s and get back a handle that cancels it. This keeps the
//! classifier testable with synthetic or recorded frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::analysis::landmarks::HandLandmarks;
use crate::error::SessionError;

/// Maximum number of hands the detector reports per frame
pub const MAX_HANDS: usize = 2;

/// Handedness label as reported by the detector
///
/// The detector labels hands as seen in the unmirrored camera image, so the
/// label names the opposite physical hand of a user facing the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One hand reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedHand {
    pub handedness: Handedness,
    pub landmarks: HandLandmarks,
}

impl DetectedHand {
    pub fn wrist_x(&self) -> f32 {
        self.landmarks.wrist().x
    }
}

/// Detector output for one processed camera frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub timestamp_ms: u64,
    #[serde(default)]
    pub hands: Vec<DetectedHand>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: u64, hands: Vec<DetectedHand>) -> Self {
        Self {
            timestamp_ms,
            hands,
        }
    }

    /// Frame with no hands in view
    pub fn empty(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, Vec::new())
    }
}

/// Callback invoked once per detected frame
pub type FrameCallback = Box<dyn FnMut(LandmarkFrame) + Send + 'static>;

/// Narrow capability interface over the camera + landmark detector
pub trait DetectionSource {
    /// Start delivering frames to `on_frame`
    ///
    /// # Returns
    /// * `Ok(DetectionHandle)` - stream running; cancel or drop the handle to stop
    /// * `Err(SessionError::DetectionFailed)` - camera or detector unavailable
    fn start_detection(&mut self, on_frame: FrameCallback)
        -> Result<DetectionHandle, SessionError>;
}

/// Cancellation handle for a running detection stream
///
/// After `cancel()` returns no further frame callbacks run. Dropping the
/// handle cancels as well.
pub struct DetectionHandle {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl DetectionHandle {
    pub fn new(active: Arc<AtomicBool>, task: JoinHandle<()>) -> Self {
        Self {
            active,
            task: Some(task),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait until the stream ends on its own (replays) or is cancelled
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for DetectionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Replays recorded frames at a fixed cadence on the tokio runtime
///
/// Stand-in for the live detector in the CLI harness and tests.
pub struct ReplayDetectionSource {
    frames: Vec<LandmarkFrame>,
    frame_interval: Duration,
}

impl ReplayDetectionSource {
    pub fn new(frames: Vec<LandmarkFrame>, frame_interval: Duration) -> Self {
        Self {
            frames,
            frame_interval,
        }
    }
}

impl DetectionSource for ReplayDetectionSource {
    fn start_detection(
        &mut self,
        mut on_frame: FrameCallback,
    ) -> Result<DetectionHandle, SessionError> {
        if self.frame_interval.is_zero() {
            return Err(SessionError::DetectionFailed {
                reason: "frame interval must be non-zero".to_string(),
            });
        }

        let frames = std::mem::take(&mut self.frames);
        let interval = self.frame_interval;
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for frame in frames {
                ticker.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    return;
                }
                on_frame(frame);
            }
            flag.store(false, Ordering::SeqCst);
        });

        tracing::debug!("[Detection] Replay started at {:?} per frame", interval);
        Ok(DetectionHandle::new(active, task))
    }
}
