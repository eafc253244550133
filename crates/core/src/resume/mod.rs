//! Restart-surviving display state
//!
//! Before a fault-triggered restart the firmware persists the frame that was
//! on its way to the drums together with a reboot counter. On the next boot
//! the record is handed back so the frame can be redisplayed, and the
//! counter lets [`RestartPolicy`] stop a restart loop.
//!
//! # Blob format
//!
//! Little-endian, [`RESUME_BLOB_LEN`] bytes:
//!
//! | Offset | Size | Field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 4    | magic `0x76B78EC4`                     |
//! | 4      | 1    | reboot count                           |
//! | 5      | 1    | text length                            |
//! | 6      | 16   | text, ASCII, space padded              |
//! | 22     | 4    | CRC-32 of bytes 0..22                  |

pub mod crc;

use core::fmt;

use heapless::String;

use crate::MAX_UNITS;

/// Marks a valid blob. Erased flash never matches.
pub const RESUME_MAGIC: u32 = 0x76B7_8EC4;

/// Encoded size of a [`ResumeRecord`].
pub const RESUME_BLOB_LEN: usize = 4 + 1 + 1 + MAX_UNITS + 4;

/// Default number of consecutive redisplays allowed before halting.
pub const DEFAULT_MAX_REBOOTS: u8 = 3;

const COUNT_OFFSET: usize = 4;
const LEN_OFFSET: usize = 5;
const TEXT_OFFSET: usize = 6;
const CRC_OFFSET: usize = TEXT_OFFSET + MAX_UNITS;

/// Resume blob errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeError {
    /// Fewer bytes than a full blob
    TooShort {
        /// Bytes available
        len: usize,
    },
    /// Magic does not match (erased or foreign data)
    BadMagic {
        /// Magic found
        found: u32,
    },
    /// Stored checksum does not match the content
    BadChecksum {
        /// Checksum computed over the content
        expected: u32,
        /// Checksum stored in the blob
        found: u32,
    },
    /// Text length larger than a frame
    TextTooLong {
        /// Offending length
        len: usize,
    },
    /// Text contains non-ASCII bytes
    InvalidText,
}

impl fmt::Display for ResumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeError::TooShort { len } => {
                write!(f, "resume blob too short ({} of {} bytes)", len, RESUME_BLOB_LEN)
            }
            ResumeError::BadMagic { found } => write!(f, "resume blob magic mismatch ({:#010x})", found),
            ResumeError::BadChecksum { expected, found } => write!(
                f,
                "resume blob checksum mismatch (expected {:#010x}, found {:#010x})",
                expected, found
            ),
            ResumeError::TextTooLong { len } => {
                write!(f, "resume text too long ({} > {})", len, MAX_UNITS)
            }
            ResumeError::InvalidText => write!(f, "resume text is not ASCII"),
        }
    }
}

/// Frame and reboot counter carried across a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRecord {
    text: String<MAX_UNITS>,
    reboot_count: u8,
}

impl ResumeRecord {
    /// Build a record. `text` must be ASCII and at most [`MAX_UNITS`] bytes.
    pub fn new(text: &str, reboot_count: u8) -> Result<Self, ResumeError> {
        if !text.is_ascii() {
            return Err(ResumeError::InvalidText);
        }
        let text = String::try_from(text).map_err(|_| ResumeError::TextTooLong { len: text.len() })?;
        Ok(Self { text, reboot_count })
    }

    /// Persisted frame.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Restarts since the frame was last requested externally.
    pub fn reboot_count(&self) -> u8 {
        self.reboot_count
    }

    /// Encode to the blob format.
    pub fn to_bytes(&self) -> [u8; RESUME_BLOB_LEN] {
        let mut out = [b' '; RESUME_BLOB_LEN];
        out[..COUNT_OFFSET].copy_from_slice(&RESUME_MAGIC.to_le_bytes());
        out[COUNT_OFFSET] = self.reboot_count;
        out[LEN_OFFSET] = self.text.len() as u8;
        out[TEXT_OFFSET..TEXT_OFFSET + self.text.len()].copy_from_slice(self.text.as_bytes());
        let crc = crc::checksum(&out[..CRC_OFFSET]);
        out[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        out
    }

    /// Decode and validate a blob. Trailing bytes beyond the blob are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResumeError> {
        let blob = bytes
            .get(..RESUME_BLOB_LEN)
            .ok_or(ResumeError::TooShort { len: bytes.len() })?;

        let magic = read_u32(&blob[..COUNT_OFFSET]);
        if magic != RESUME_MAGIC {
            return Err(ResumeError::BadMagic { found: magic });
        }

        let expected = crc::checksum(&blob[..CRC_OFFSET]);
        let found = read_u32(&blob[CRC_OFFSET..]);
        if expected != found {
            return Err(ResumeError::BadChecksum { expected, found });
        }

        let len = usize::from(blob[LEN_OFFSET]);
        if len > MAX_UNITS {
            return Err(ResumeError::TextTooLong { len });
        }
        let text = core::str::from_utf8(&blob[TEXT_OFFSET..TEXT_OFFSET + len])
            .map_err(|_| ResumeError::InvalidText)?;

        Self::new(text, blob[COUNT_OFFSET])
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(word)
}

/// What to do with a recovered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Show it again; persist `reboot_count` with it on the next fault
    Redisplay {
        /// Counter after this redisplay
        reboot_count: u8,
    },
    /// Too many restarts in a row; stop restarting
    Halt {
        /// Counter that exceeded the limit
        reboot_count: u8,
    },
}

/// Runaway-restart guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    max_reboots: u8,
}

impl RestartPolicy {
    /// Allow up to `max_reboots` consecutive redisplays of the same frame.
    pub const fn new(max_reboots: u8) -> Self {
        Self { max_reboots }
    }

    /// Decide on a recovered frame that has been redisplayed `reboot_count` times.
    pub fn decide(&self, reboot_count: u8) -> RestartDecision {
        if reboot_count > self.max_reboots {
            RestartDecision::Halt { reboot_count }
        } else {
            RestartDecision::Redisplay {
                reboot_count: reboot_count.saturating_add(1),
            }
        }
    }

    /// Configured limit.
    pub fn max_reboots(&self) -> u8 {
        self.max_reboots
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REBOOTS)
    }
}
