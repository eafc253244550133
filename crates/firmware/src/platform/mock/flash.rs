//! Mock Flash implementation
//!
//! In-memory flash window for tests. Writes follow NOR semantics (bits only
//! go from 1 to 0), so a missing erase shows up as corrupted data.

use crate::platform::{error::FlashError, traits::FlashInterface, Result};

/// Block size (4 KB, same as RP2350)
pub const MOCK_FLASH_BLOCK_SIZE: u32 = 4096;

/// Number of blocks in the mock window
const BLOCKS: usize = 4;

/// Size of the mock window in bytes
pub const MOCK_FLASH_SIZE: usize = BLOCKS * MOCK_FLASH_BLOCK_SIZE as usize;

/// First address of the mock window (end of the protected firmware region)
pub const MOCK_FLASH_BASE: u32 = 0x040000;

/// Mock Flash implementation
///
/// # Example
///
/// ```
/// use splitflap_firmware::platform::mock::{MockFlash, MOCK_FLASH_BASE};
/// use splitflap_firmware::platform::FlashInterface;
///
/// let mut flash = MockFlash::new();
/// flash.erase(MOCK_FLASH_BASE, 4096).unwrap();
/// flash.write(MOCK_FLASH_BASE, &[1, 2, 3]).unwrap();
///
/// let mut buf = [0u8; 3];
/// flash.read(MOCK_FLASH_BASE, &mut buf).unwrap();
/// assert_eq!(buf, [1, 2, 3]);
/// assert_eq!(flash.erase_count(MOCK_FLASH_BASE), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockFlash {
    storage: [u8; MOCK_FLASH_SIZE],
    erase_counts: [u32; BLOCKS],
    fail_writes: bool,
}

impl MockFlash {
    /// Fully erased flash
    pub fn new() -> Self {
        Self {
            storage: [0xFF; MOCK_FLASH_SIZE],
            erase_counts: [0; BLOCKS],
            fail_writes: false,
        }
    }

    /// Raw contents (for test verification)
    ///
    /// Returns an empty slice when the range is outside the window.
    pub fn contents(&self, address: u32, len: usize) -> &[u8] {
        self.range(address, len)
            .map_or(&[][..], |range| &self.storage[range])
    }

    /// Overwrite bytes with a corrupt pattern
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        if let Some(range) = self.range(address, len) {
            self.storage[range].fill(0xAA);
        }
    }

    /// Times the block containing `address` has been erased
    pub fn erase_count(&self, address: u32) -> u32 {
        address
            .checked_sub(MOCK_FLASH_BASE)
            .and_then(|offset| self.erase_counts.get((offset / MOCK_FLASH_BLOCK_SIZE) as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Make every following write fail
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn range(&self, address: u32, len: usize) -> Option<core::ops::Range<usize>> {
        let start = address.checked_sub(MOCK_FLASH_BASE)? as usize;
        let end = start.checked_add(len)?;
        (end <= MOCK_FLASH_SIZE).then_some(start..end)
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        let range = self
            .range(address, buf.len())
            .ok_or(FlashError::InvalidAddress)?;
        buf.copy_from_slice(&self.storage[range]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let range = self
            .range(address, data.len())
            .ok_or(FlashError::InvalidAddress)?;
        if self.fail_writes {
            return Err(FlashError::WriteFailed.into());
        }
        for (cell, byte) in self.storage[range].iter_mut().zip(data) {
            *cell &= *byte;
        }
        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if address % MOCK_FLASH_BLOCK_SIZE != 0 || size % MOCK_FLASH_BLOCK_SIZE != 0 {
            return Err(FlashError::InvalidAddress.into());
        }
        let range = self
            .range(address, size as usize)
            .ok_or(FlashError::InvalidAddress)?;

        let first_block = range.start / MOCK_FLASH_BLOCK_SIZE as usize;
        let blocks = range.len() / MOCK_FLASH_BLOCK_SIZE as usize;
        self.storage[range].fill(0xFF);
        for count in &mut self.erase_counts[first_block..first_block + blocks] {
            *count += 1;
        }
        Ok(())
    }

    fn block_size(&self) -> u32 {
        MOCK_FLASH_BLOCK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    #[test]
    fn test_starts_erased() {
        let flash = MockFlash::new();
        assert!(flash.contents(MOCK_FLASH_BASE, 64).iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_write_without_erase_only_clears_bits() {
        let mut flash = MockFlash::new();
        flash.write(MOCK_FLASH_BASE, &[0x0F]).unwrap();
        flash.write(MOCK_FLASH_BASE, &[0xF1]).unwrap();
        assert_eq!(flash.contents(MOCK_FLASH_BASE, 1), &[0x01]);

        flash.erase(MOCK_FLASH_BASE, MOCK_FLASH_BLOCK_SIZE).unwrap();
        flash.write(MOCK_FLASH_BASE, &[0xF1]).unwrap();
        assert_eq!(flash.contents(MOCK_FLASH_BASE, 1), &[0xF1]);
    }

    #[test]
    fn test_firmware_region_protected() {
        let mut flash = MockFlash::new();
        assert_eq!(
            flash.write(0x1000, &[0]),
            Err(PlatformError::Flash(FlashError::InvalidAddress))
        );
        assert!(flash.erase(0, MOCK_FLASH_BLOCK_SIZE).is_err());
    }

    #[test]
    fn test_misaligned_erase_rejected() {
        let mut flash = MockFlash::new();
        assert!(flash.erase(MOCK_FLASH_BASE + 16, MOCK_FLASH_BLOCK_SIZE).is_err());
        assert!(flash.erase(MOCK_FLASH_BASE, 100).is_err());
    }

    #[test]
    fn test_erase_counts_per_block() {
        let mut flash = MockFlash::new();
        flash
            .erase(MOCK_FLASH_BASE + MOCK_FLASH_BLOCK_SIZE, 2 * MOCK_FLASH_BLOCK_SIZE)
            .unwrap();
        assert_eq!(flash.erase_count(MOCK_FLASH_BASE), 0);
        assert_eq!(flash.erase_count(MOCK_FLASH_BASE + MOCK_FLASH_BLOCK_SIZE), 1);
        assert_eq!(flash.erase_count(MOCK_FLASH_BASE + 2 * MOCK_FLASH_BLOCK_SIZE), 1);
    }

    #[test]
    fn test_failing_writes() {
        let mut flash = MockFlash::new();
        flash.set_fail_writes(true);
        assert_eq!(
            flash.write(MOCK_FLASH_BASE, &[0]),
            Err(PlatformError::Flash(FlashError::WriteFailed))
        );
    }
}
