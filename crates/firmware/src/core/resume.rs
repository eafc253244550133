//! Flash-backed resume storage
//!
//! One reserved flash block holds the [`ResumeRecord`] written just before a
//! fault-triggered restart. Boot reads it once and then erases it, so a later
//! power cycle starts clean.

use splitflap_core::resume::{ResumeError, ResumeRecord, RESUME_BLOB_LEN};

use crate::platform::{error::FlashError, FlashInterface, PlatformError, Result};

/// Flash address of the resume block (first block after the firmware region)
pub const RESUME_BLOCK_ADDRESS: u32 = 0x040000;

/// Resume blob storage in one flash block
///
/// # Example
///
/// ```
/// use splitflap_core::resume::ResumeRecord;
/// use splitflap_firmware::core::{ResumeStore, RESUME_BLOCK_ADDRESS};
/// use splitflap_firmware::platform::mock::MockFlash;
///
/// let mut store = ResumeStore::new(MockFlash::new(), RESUME_BLOCK_ADDRESS).unwrap();
/// store.save(&ResumeRecord::new("HELLO", 1).unwrap()).unwrap();
///
/// let record = store.load().unwrap().unwrap();
/// assert_eq!(record.text(), "HELLO");
/// ```
pub struct ResumeStore<F: FlashInterface> {
    flash: F,
    address: u32,
}

impl<F: FlashInterface> ResumeStore<F> {
    /// Use the block at `address`, which must be block aligned.
    pub fn new(flash: F, address: u32) -> Result<Self> {
        if address % flash.block_size() != 0 {
            return Err(PlatformError::InvalidConfig);
        }
        Ok(Self { flash, address })
    }

    /// Persist `record`, replacing any previous one.
    ///
    /// The block is read back after writing.
    pub fn save(&mut self, record: &ResumeRecord) -> Result<()> {
        let blob = record.to_bytes();
        self.flash.erase(self.address, self.flash.block_size())?;
        self.flash.write(self.address, &blob)?;

        let mut check = [0u8; RESUME_BLOB_LEN];
        self.flash.read(self.address, &mut check)?;
        if check != blob {
            return Err(FlashError::VerifyFailed.into());
        }
        Ok(())
    }

    /// Read the stored record.
    ///
    /// An erased block (or any foreign data) is `Ok(None)`. A block that
    /// carries the magic but fails validation is an error.
    pub fn load(&mut self) -> Result<Option<ResumeRecord>> {
        let mut blob = [0u8; RESUME_BLOB_LEN];
        self.flash.read(self.address, &mut blob)?;
        match ResumeRecord::from_bytes(&blob) {
            Ok(record) => Ok(Some(record)),
            Err(ResumeError::BadMagic { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Erase the stored record.
    pub fn clear(&mut self) -> Result<()> {
        self.flash.erase(self.address, self.flash.block_size())
    }

    /// Borrow the flash device
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Mutably borrow the flash device
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }
}
