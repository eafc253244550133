//! CRC32 for the resume blob

use crc::{Crc, CRC_32_ISO_HDLC};

/// CRC-32/ISO-HDLC (the Ethernet/ZIP polynomial)
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Checksum of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
        assert_eq!(checksum(b""), 0);
    }

    #[test]
    fn test_single_bit_flip_changes_checksum() {
        let data = *b"SPLIT FLAP";
        let reference = checksum(&data);
        for byte in 0..data.len() {
            let mut flipped = data;
            flipped[byte] ^= 0x01;
            assert_ne!(checksum(&flipped), reference);
        }
    }
}
