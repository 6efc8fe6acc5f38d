//! CRC-16 used by RED RCP frames.
//!
//! Polynomial 0x1021, initial value 0xFFFF, MSB first, no reflection and no
//! final XOR (the CRC-16/CCITT-FALSE parameter set).

const POLYNOMIAL: u16 = 0x1021;
const INITIAL: u16 = 0xFFFF;

/// Compute the frame CRC over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(INITIAL, |crc, &byte| update(crc, byte))
}

fn update(mut crc: u16, byte: u8) -> u16 {
    crc ^= u16::from(byte) << 8;
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ POLYNOMIAL
        } else {
            crc << 1
        };
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn empty_input_is_initial_value() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn firmware_version_request() {
        // Type..EndMark of GetReaderInformation(FwVersion).
        assert_eq!(crc16(&[0x00, 0x03, 0x00, 0x01, 0x01, 0x7E]), 0x7B9A);
    }

    #[test]
    fn command_failure_response() {
        assert_eq!(crc16(&[0x01, 0xFF, 0x00, 0x02, 0x36, 0x02, 0x7E]), 0x7E46);
    }
}
