//! Faults that escalate to a system restart
//!
//! Local problems (sensor glitches) are recovered inside the fleet and never
//! surface here. A [`Fault`] means the motor driver state can no longer be
//! trusted and the firmware should persist its frame and restart.

use core::fmt;

/// Escalated fault raised by the fleet or the display supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A unit searched for its home marker longer than the calibration timeout
    CalibrationTimeout {
        /// Unit that gave up
        unit: u8,
        /// Time spent searching (ms)
        elapsed_ms: u64,
    },
    /// The display kept moving longer than the stall timeout
    Stalled {
        /// Time since the fleet was last fully idle (ms)
        moving_ms: u64,
    },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::CalibrationTimeout { unit, elapsed_ms } => {
                write!(
                    f,
                    "unit {} calibration timed out after {} ms",
                    unit, elapsed_ms
                )
            }
            Fault::Stalled { moving_ms } => {
                write!(f, "display moving for {} ms without settling", moving_ms)
            }
        }
    }
}
