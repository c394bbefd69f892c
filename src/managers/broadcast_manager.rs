// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::analysis::smoothing::HandState;
use crate::calibration::CalibrationProgress;

/// Buffer for hand state updates (a few seconds of changes at 30 fps)
const HAND_STATE_BUFFER: usize = 100;
/// Buffer for calibration progress (one message per accepted sample)
const CALIBRATION_BUFFER: usize = 50;

/// Manages all tokio broadcast channels
///
/// # Channel Types
/// - Hand state: stable HandState values from the gesture pipeline
/// - Calibration: progress updates during neutral-pose calibration
pub struct BroadcastChannelManager {
    hand_state: Arc<Mutex<Option<broadcast::Sender<HandState>>>>,
    calibration: Arc<Mutex<Option<broadcast::Sender<CalibrationProgress>>>>,
}

fn lock_slot<T>(slot: &Mutex<Option<broadcast::Sender<T>>>) -> MutexGuard<'_, Option<broadcast::Sender<T>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with all channels uninitialized
    ///
    /// Channels must be explicitly initialized via init_* methods before use.
    pub fn new() -> Self {
        Self {
            hand_state: Arc::new(Mutex::new(None)),
            calibration: Arc::new(Mutex::new(None)),
        }
    }

    // ========================================================================
    // HAND STATE CHANNEL
    // ========================================================================

    /// Initialize the hand state channel, returning the publishing side
    ///
    /// Calling it again replaces the channel; existing subscribers see it close.
    pub fn init_hand_state(&self) -> broadcast::Sender<HandState> {
        let (tx, _) = broadcast::channel(HAND_STATE_BUFFER);
        *lock_slot(&self.hand_state) = Some(tx.clone());
        tx
    }

    /// Subscribe to hand state changes
    ///
    /// # Returns
    /// `None` if init_hand_state() was not called yet
    pub fn subscribe_hand_state(&self) -> Option<broadcast::Receiver<HandState>> {
        lock_slot(&self.hand_state).as_ref().map(|tx| tx.subscribe())
    }

    /// Publish a hand state if the channel exists
    pub fn publish_hand_state(&self, state: HandState) {
        if let Some(tx) = lock_slot(&self.hand_state).as_ref() {
            // No subscribers is fine
            let _ = tx.send(state);
        }
    }

    // ========================================================================
    // CALIBRATION CHANNEL
    // ========================================================================

    pub fn init_calibration(&self) -> broadcast::Sender<CalibrationProgress> {
        let (tx, _) = broadcast::channel(CALIBRATION_BUFFER);
        *lock_slot(&self.calibration) = Some(tx.clone());
        tx
    }

    pub fn subscribe_calibration(&self) -> Option<broadcast::Receiver<CalibrationProgress>> {
        lock_slot(&self.calibration).as_ref().map(|tx| tx.subscribe())
    }

    /// Get the calibration sender, if initialized
    pub fn get_calibration_sender(&self) -> Option<broadcast::Sender<CalibrationProgress>> {
        lock_slot(&self.calibration).clone()
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
