//! Mock sensor expander

use splitflap_core::traits::HallLevel;

use crate::platform::expander::{Port, SensorBit};
use crate::platform::{error::I2cError, traits::SensorPorts, Result};

/// Mock two-port expander
///
/// Ports idle high (every sensor clear). Reads are counted.
#[derive(Debug, Clone)]
pub struct MockPorts {
    ports: [u8; 2],
    failing: bool,
    reads: u32,
}

impl MockPorts {
    /// All sensors clear
    pub fn new() -> Self {
        Self::with_ports([0xFF; 2])
    }

    /// Start from explicit port values (A, B)
    pub fn with_ports(ports: [u8; 2]) -> Self {
        Self {
            ports,
            failing: false,
            reads: 0,
        }
    }

    /// Drive one sensor to `level`
    pub fn set_level(&mut self, bit: SensorBit, level: HallLevel) {
        let port = match bit.port {
            Port::A => &mut self.ports[0],
            Port::B => &mut self.ports[1],
        };
        if level.is_detected() {
            *port &= !bit.mask;
        } else {
            *port |= bit.mask;
        }
    }

    /// Make reads fail with a NACK
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Read attempts so far
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Default for MockPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPorts for MockPorts {
    fn read_ports(&mut self) -> Result<[u8; 2]> {
        self.reads += 1;
        if self.failing {
            return Err(I2cError::Nack.into());
        }
        Ok(self.ports)
    }
}
