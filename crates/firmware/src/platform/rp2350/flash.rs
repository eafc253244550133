//! RP2350 flash
//!
//! # Flash Layout
//!
//! ```text
//! [Firmware]       0x000000 - 0x040000 (256 KB) - PROTECTED
//! [Resume Block]   0x040000 - 0x041000 (4 KB)
//! [Unused]         0x041000 - 0x400000
//! ```
//!
//! Erase and program run through the `embassy-rp` blocking flash driver,
//! which parks XIP for the duration. Both take milliseconds, which is fine
//! for the single write made just before a restart.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;

use crate::platform::{error::FlashError, traits::FlashInterface, Result};

/// Total flash capacity of the Pico 2 W
pub const FLASH_CAPACITY: usize = 4 * 1024 * 1024;

/// Firmware region, never written
const FIRMWARE_SIZE: u32 = 0x40000;

/// Minimum erase unit
const BLOCK_SIZE: u32 = ERASE_SIZE as u32;

/// [`FlashInterface`] over the embassy-rp blocking driver
pub struct Rp2350Flash<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_CAPACITY>,
}

impl<'d> Rp2350Flash<'d> {
    /// Wrap an initialised flash driver
    pub fn new(flash: Flash<'d, FLASH, Blocking, FLASH_CAPACITY>) -> Self {
        Self { flash }
    }

    fn check_range(address: u32, len: usize, writable: bool) -> Result<()> {
        let end = (address as usize).checked_add(len);
        let in_bounds = end.is_some_and(|end| end <= FLASH_CAPACITY);
        if !in_bounds || (writable && address < FIRMWARE_SIZE) {
            return Err(FlashError::InvalidAddress.into());
        }
        Ok(())
    }
}

impl FlashInterface for Rp2350Flash<'_> {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        Self::check_range(address, buf.len(), false)?;
        self.flash
            .blocking_read(address, buf)
            .map_err(|_| FlashError::ReadFailed.into())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        Self::check_range(address, data.len(), true)?;
        self.flash
            .blocking_write(address, data)
            .map_err(|_| FlashError::WriteFailed.into())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        Self::check_range(address, size as usize, true)?;
        if address % BLOCK_SIZE != 0 || size % BLOCK_SIZE != 0 {
            return Err(FlashError::InvalidAddress.into());
        }
        self.flash
            .blocking_erase(address, address + size)
            .map_err(|_| FlashError::EraseFailed.into())
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }
}
