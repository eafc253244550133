//! Sensor port expander trait
//!
//! The hall sensors of all drums sit on the two 8-bit ports of one I/O
//! expander. Reading both ports at once gives a consistent snapshot of every
//! sensor.

use crate::platform::Result;

/// Two-port sensor expander
pub trait SensorPorts {
    /// Read ports A and B (in that order)
    ///
    /// Reading also clears the expander's pending interrupt.
    fn read_ports(&mut self) -> Result<[u8; 2]>;
}
