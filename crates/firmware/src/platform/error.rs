//! Platform error types

use core::fmt;

use splitflap_core::parameters::ParameterError;
use splitflap_core::resume::ResumeError;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All platform implementations map their HAL-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// Flash operation failed
    Flash(FlashError),
    /// I2C operation failed
    I2c(I2cError),
    /// Stored resume blob is unreadable
    Resume(ResumeError),
    /// Invalid configuration provided
    InvalidConfig,
}

/// I2C-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cError {
    /// Bus error occurred
    BusError,
    /// No acknowledgment received
    Nack,
    /// Arbitration lost
    ArbitrationLost,
}

/// Flash-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// Erase operation failed
    EraseFailed,
    /// Write operation failed
    WriteFailed,
    /// Read operation failed
    ReadFailed,
    /// Invalid address (out of bounds or misaligned)
    InvalidAddress,
    /// Verify failed (data mismatch after write)
    VerifyFailed,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Flash(e) => write!(f, "Flash error: {:?}", e),
            PlatformError::I2c(e) => write!(f, "I2C error: {:?}", e),
            PlatformError::Resume(e) => write!(f, "Resume error: {}", e),
            PlatformError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

impl From<FlashError> for PlatformError {
    fn from(error: FlashError) -> Self {
        PlatformError::Flash(error)
    }
}

impl From<I2cError> for PlatformError {
    fn from(error: I2cError) -> Self {
        PlatformError::I2c(error)
    }
}

impl From<ResumeError> for PlatformError {
    fn from(error: ResumeError) -> Self {
        PlatformError::Resume(error)
    }
}

impl From<ParameterError> for PlatformError {
    fn from(_: ParameterError) -> Self {
        PlatformError::InvalidConfig
    }
}
