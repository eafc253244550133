//! Hall sensors behind a two-port I/O expander
//!
//! The expander's interrupt line fires on any sensor change. The interrupt
//! side only raises an [`EdgeLatch`](splitflap_core::traits::EdgeLatch); the
//! control loop then calls [`HallSensor::refresh`] to read both ports in one
//! transfer and decodes each unit's bit from that snapshot.
//!
//! Sensors are active low: a clear bit means the marker is in front of the
//! sensor.

use splitflap_core::traits::{HallLevel, HallSensor};

use super::traits::SensorPorts;

/// Expander port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// Port A (GPIOA)
    A,
    /// Port B (GPIOB)
    B,
}

/// Location of one unit's sensor on the expander
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorBit {
    /// Port the sensor is wired to
    pub port: Port,
    /// Single-bit mask within the port
    pub mask: u8,
}

impl SensorBit {
    /// Sensor on `port` at bit mask `mask`
    pub const fn new(port: Port, mask: u8) -> Self {
        Self { port, mask }
    }
}

/// Sensor wiring of the reference controller board, units left to right.
pub const REFERENCE_SENSOR_MAP: [SensorBit; 12] = [
    SensorBit::new(Port::A, 0b0000_1000),
    SensorBit::new(Port::A, 0b0000_0100),
    SensorBit::new(Port::A, 0b0000_0010),
    SensorBit::new(Port::A, 0b0000_0001),
    SensorBit::new(Port::B, 0b0000_0010),
    SensorBit::new(Port::B, 0b0000_0001),
    SensorBit::new(Port::A, 0b0010_0000),
    SensorBit::new(Port::A, 0b0001_0000),
    SensorBit::new(Port::B, 0b0010_0000),
    SensorBit::new(Port::B, 0b0001_0000),
    SensorBit::new(Port::B, 0b0000_1000),
    SensorBit::new(Port::B, 0b0000_0100),
];

/// [`HallSensor`] decoding a port snapshot for `N` units
pub struct ExpanderHall<P: SensorPorts, const N: usize> {
    ports: P,
    map: [SensorBit; N],
    snapshot: [u8; 2],
    read_errors: u32,
}

impl<P: SensorPorts, const N: usize> ExpanderHall<P, N> {
    /// Decode `ports` using `map`. Every sensor reads clear until the first refresh.
    pub fn new(ports: P, map: [SensorBit; N]) -> Self {
        Self {
            ports,
            map,
            snapshot: [0xFF; 2],
            read_errors: 0,
        }
    }

    /// Last port snapshot (A, B)
    pub fn snapshot(&self) -> [u8; 2] {
        self.snapshot
    }

    /// Failed port reads since construction
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    /// Borrow the port reader
    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }
}

impl<P: SensorPorts, const N: usize> HallSensor for ExpanderHall<P, N> {
    fn refresh(&mut self) {
        match self.ports.read_ports() {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(_) => {
                // Keep the previous snapshot; the next edge retries.
                self.read_errors = self.read_errors.wrapping_add(1);
                crate::log_warn!("Sensor port read failed ({} total)", self.read_errors);
            }
        }
    }

    fn read(&mut self, unit: u8) -> HallLevel {
        let Some(bit) = self.map.get(usize::from(unit)) else {
            return HallLevel::Clear;
        };
        let port = match bit.port {
            Port::A => self.snapshot[0],
            Port::B => self.snapshot[1],
        };
        HallLevel::from_raw(u8::from(port & bit.mask != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPorts;

    #[test]
    fn test_all_clear_before_refresh() {
        let mut hall = ExpanderHall::new(MockPorts::new(), REFERENCE_SENSOR_MAP);
        for unit in 0..12 {
            assert_eq!(hall.read(unit), HallLevel::Clear);
        }
    }

    #[test]
    fn test_decodes_active_low_bits() {
        let mut ports = MockPorts::new();
        ports.set_level(REFERENCE_SENSOR_MAP[4], HallLevel::Detected);
        ports.set_level(REFERENCE_SENSOR_MAP[7], HallLevel::Detected);

        let mut hall = ExpanderHall::new(ports, REFERENCE_SENSOR_MAP);
        hall.refresh();

        assert_eq!(hall.snapshot(), [0b1110_1111, 0b1111_1101]);
        for unit in 0..12u8 {
            let expected = if unit == 4 || unit == 7 {
                HallLevel::Detected
            } else {
                HallLevel::Clear
            };
            assert_eq!(hall.read(unit), expected, "unit {}", unit);
        }
    }

    #[test]
    fn test_read_only_changes_on_refresh() {
        let mut hall = ExpanderHall::new(MockPorts::new(), REFERENCE_SENSOR_MAP);
        hall.refresh();
        hall.ports_mut()
            .set_level(REFERENCE_SENSOR_MAP[0], HallLevel::Detected);

        assert_eq!(hall.read(0), HallLevel::Clear);
        hall.refresh();
        assert_eq!(hall.read(0), HallLevel::Detected);
        assert_eq!(hall.ports_mut().reads(), 2);
    }

    #[test]
    fn test_failed_read_keeps_snapshot() {
        let mut hall = ExpanderHall::new(MockPorts::new(), REFERENCE_SENSOR_MAP);
        hall.ports_mut()
            .set_level(REFERENCE_SENSOR_MAP[2], HallLevel::Detected);
        hall.refresh();

        hall.ports_mut().set_failing(true);
        hall.ports_mut()
            .set_level(REFERENCE_SENSOR_MAP[2], HallLevel::Clear);
        hall.refresh();

        assert_eq!(hall.read(2), HallLevel::Detected);
        assert_eq!(hall.read_errors(), 1);
    }

    #[test]
    fn test_unmapped_unit_reads_clear() {
        let mut hall = ExpanderHall::new(MockPorts::with_ports([0, 0]), [REFERENCE_SENSOR_MAP[0]]);
        hall.refresh();
        assert_eq!(hall.read(0), HallLevel::Detected);
        assert_eq!(hall.read(5), HallLevel::Clear);
    }
}
