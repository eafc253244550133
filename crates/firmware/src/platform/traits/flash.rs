//! Flash interface trait
//!
//! Flash holds the resume blob that carries the in-flight frame across a
//! fault-triggered restart.

use crate::platform::Result;

/// Flash interface trait
///
/// # Flash Characteristics
///
/// - Flash is organized in blocks (4 KB on RP2350)
/// - Erase operations set all bytes to 0xFF
/// - Write operations can only change bits from 1 to 0 (erase first)
/// - Operations are blocking
///
/// # Memory Layout (RP2350)
///
/// ```text
/// [Firmware]       0x000000 - 0x040000 (256 KB) - DO NOT WRITE
/// [Resume Block]   0x040000 - 0x041000 (4 KB)
/// ```
pub trait FlashInterface {
    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if the range is out of bounds,
    /// `FlashError::ReadFailed` if the read fails.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `address`
    ///
    /// The region must have been erased first.
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if the range is outside the writable region,
    /// `FlashError::WriteFailed` if the write fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `address` (both block aligned)
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if misaligned or outside the writable region,
    /// `FlashError::EraseFailed` if the erase fails.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Minimum erasable unit in bytes
    fn block_size(&self) -> u32;
}
