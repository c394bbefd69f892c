use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream, WatchStream};

use crate::analysis::smoothing::HandState;
use crate::calibration::CalibrationProgress;
use crate::session::GameState;
use crate::telemetry::{MetricEvent, TelemetrySnapshot};

use super::EngineHandle;

impl EngineHandle {
    // ========================================================================
    // STREAM SUBSCRIPTIONS
    // ========================================================================

    /// Stable hand states, emitted on change
    pub fn subscribe_hand_state(&self) -> broadcast::Receiver<HandState> {
        self.broadcasts
            .subscribe_hand_state()
            .unwrap_or_else(|| self.broadcasts.init_hand_state().subscribe())
    }

    /// Calibration progress, one message per accepted sample
    pub fn subscribe_calibration(&self) -> broadcast::Receiver<CalibrationProgress> {
        self.broadcasts
            .subscribe_calibration()
            .unwrap_or_else(|| self.broadcasts.init_calibration().subscribe())
    }

    /// Latest game state; HUD observers only need the newest value
    pub fn subscribe_game_state(&self) -> watch::Receiver<GameState> {
        self.store.subscribe()
    }

    pub fn telemetry_receiver(&self) -> broadcast::Receiver<MetricEvent> {
        self.telemetry.collector().subscribe()
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    // ========================================================================
    // ASYNC STREAM ADAPTERS
    // ========================================================================

    /// Hand states as a stream; lagged items are skipped
    pub async fn hand_state_stream(&self) -> impl Stream<Item = HandState> + Unpin {
        BroadcastStream::new(self.subscribe_hand_state())
            .filter_map(|item| futures::future::ready(item.ok()))
    }

    pub async fn game_state_stream(&self) -> impl Stream<Item = GameState> + Unpin {
        WatchStream::new(self.subscribe_game_state())
    }

    pub async fn telemetry_stream(&self) -> impl Stream<Item = MetricEvent> + Unpin {
        UnboundedReceiverStream::new(self.telemetry.collector().subscribe_unbounded())
    }
}
