use splitflap_firmware::system::LoopAction;

/// Errors that can occur during simulator operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Unit not found: {0}")]
    UnitNotFound(u8),

    #[error("Invalid drum configuration: {0}")]
    InvalidConfig(String),

    #[error("Bench has {bench} drums, system expects {system}")]
    UnitCountMismatch { bench: usize, system: usize },

    #[error("Firmware setup failed: {0}")]
    Setup(String),

    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    #[error("Control loop stopped: {0:?}")]
    LoopStopped(LoopAction),
}
