use crc::{Crc, CRC_16_XMODEM};

const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC-16/XMODEM (poly `0x1021`, init `0`, no reflection, no final xor).
///
/// This is the checksum the VESC firmware computes over a frame payload.
pub fn crc16(bytes: &[u8]) -> u16 {
    XMODEM.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(crc16(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_empty_and_zero() {
        assert_eq!(crc16(&[]), 0x0000);
        assert_eq!(crc16(&[0x00]), 0x0000);
    }

    #[test]
    fn test_single_type_byte() {
        // COMM_GET_VALUES request payload.
        assert_eq!(crc16(&[0x04]), 0x4084);
    }

    #[test]
    fn test_detects_single_bit_flip() {
        let payload = [0x05, 0x00, 0x00, 0xC3, 0x50];
        let reference = crc16(&payload);
        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut flipped = payload;
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc16(&flipped), reference, "byte {byte} bit {bit}");
            }
        }
    }
}
