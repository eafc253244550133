//! MCP23017 sensor expander on I2C
//!
//! The hall sensors sit on ports A and B of an MCP23017 at address 0x21.
//! Bit 7 of each port is left unused (GPA7/GPB7 cannot be inputs on current
//! silicon). Both port interrupts are mirrored onto one open line that fires
//! on any change; reading GPIOA/GPIOB clears it.

use embassy_rp::i2c::{Blocking, I2c, Instance};

use crate::platform::{error::I2cError, traits::SensorPorts, Result};

/// Default I2C address of the sensor expander
pub const SENSOR_EXPANDER_ADDRESS: u8 = 0x21;

/// Input pins on each port (bit 7 unused)
const INPUT_MASK: u8 = 0b0111_1111;

// Register addresses with IOCON.BANK = 0
const IODIRA: u8 = 0x00;
const IPOLA: u8 = 0x02;
const GPINTENA: u8 = 0x04;
const INTCONA: u8 = 0x08;
const IOCON: u8 = 0x0A;
const GPIOA: u8 = 0x12;

/// IOCON.MIRROR: INTA and INTB are OR-ed together
const IOCON_MIRROR: u8 = 0x40;

/// [`SensorPorts`] over a blocking embassy-rp I2C bus
pub struct Mcp23017Ports<'d, T: Instance> {
    i2c: I2c<'d, T, Blocking>,
    address: u8,
}

impl<'d, T: Instance> Mcp23017Ports<'d, T> {
    /// Expander at `address` on `i2c`; call [`configure`](Self::configure) before use
    pub fn new(i2c: I2c<'d, T, Blocking>, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Set inputs, enable change interrupts on every sensor pin and clear
    /// anything already pending.
    pub fn configure(&mut self) -> Result<()> {
        self.write_pair(IODIRA, [INPUT_MASK, INPUT_MASK])?;
        self.write_pair(IPOLA, [0x00, 0x00])?;
        // Compare against previous value: interrupt on any change.
        self.write_pair(INTCONA, [0x00, 0x00])?;
        self.write(IOCON, IOCON_MIRROR)?;
        self.write_pair(GPINTENA, [INPUT_MASK, INPUT_MASK])?;
        self.read_ports().map(|_| ())
    }

    fn write(&mut self, register: u8, value: u8) -> Result<()> {
        self.i2c
            .blocking_write(self.address, &[register, value])
            .map_err(map_error)
    }

    fn write_pair(&mut self, register: u8, values: [u8; 2]) -> Result<()> {
        self.i2c
            .blocking_write(self.address, &[register, values[0], values[1]])
            .map_err(map_error)
    }
}

impl<T: Instance> SensorPorts for Mcp23017Ports<'_, T> {
    fn read_ports(&mut self) -> Result<[u8; 2]> {
        let mut ports = [0u8; 2];
        self.i2c
            .blocking_write_read(self.address, &[GPIOA], &mut ports)
            .map_err(map_error)?;
        Ok(ports)
    }
}

fn map_error(error: embassy_rp::i2c::Error) -> crate::platform::PlatformError {
    use embassy_rp::i2c::{AbortReason, Error};

    match error {
        Error::Abort(AbortReason::NoAcknowledge) => I2cError::Nack.into(),
        Error::Abort(AbortReason::ArbitrationLoss) => I2cError::ArbitrationLost.into(),
        _ => I2cError::BusError.into(),
    }
}

/// Default I2C address of the stepper-enable expander
pub const ENABLE_EXPANDER_ADDRESS: u8 = 0x20;

/// Enable every stepper driver.
///
/// The driver enable lines sit on a second MCP23017 and are active low; the
/// drums stay enabled for the whole run.
pub fn enable_stepper_drivers<T: Instance>(i2c: &mut I2c<'_, T, Blocking>, address: u8) -> Result<()> {
    i2c.blocking_write(address, &[IODIRA, 0x00, 0x00])
        .and_then(|()| i2c.blocking_write(address, &[GPIOA, 0x00, 0x00]))
        .map_err(map_error)
}
