// Gesture Strike Core - webcam hand gestures driving an FPS match
// Landmark classification, smoothing, pure match reducer and timed effects

// Module declarations
pub mod analysis;
pub mod analytics;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod managers;
pub mod session;
pub mod telemetry;

use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;

static LOGGING: Once = Once::new();

/// Install the fmt subscriber for `tracing` and `log` records
///
/// Safe to call repeatedly; only the first call configures anything, and an
/// already-installed global subscriber is left in place.
pub fn init_logging(level: LevelFilter) {
    LOGGING.call_once(|| {
        let result = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        if result.is_ok() {
            log::info!("Logging initialized at {}", level);
        }
    });
}
