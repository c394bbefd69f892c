// Managers Module
//
// Focused manager classes used by EngineHandle.
//
// Each manager handles one specific concern:
// - CalibrationManager: Calibration profile ownership and workflow
// - BroadcastChannelManager: Tokio broadcast channel management

pub mod broadcast_manager;
pub mod calibration_manager;

pub use broadcast_manager::BroadcastChannelManager;
pub use calibration_manager::CalibrationManager;
