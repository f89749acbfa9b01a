//! Sense data decoding
//!
//! When a device answers CHECK CONDITION, the sense buffer carries the
//! diagnostic triple (sense key, additional sense code, qualifier).
//! Two encodings exist in the wild: fixed format (response codes
//! 0x70/0x71, the triple at bytes 2/12/13) and descriptor format
//! (0x72/0x73, the triple at bytes 1/2/3). UASP bridges mostly report
//! fixed format; NVMe-behind-UAS enclosures tend to report descriptor.

use std::fmt;

/// Decoded sense triple from a CHECK CONDITION response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    /// Sense key (low nibble)
    pub key: u8,
    /// Additional sense code
    pub asc: u8,
    /// Additional sense code qualifier
    pub ascq: u8,
}

impl SenseData {
    /// Parse a raw sense buffer in either fixed or descriptor format
    ///
    /// Returns `None` for truncated buffers or unrecognized response codes
    /// (including an all-zero buffer, which means no sense was reported).
    pub fn parse(buf: &[u8]) -> Option<SenseData> {
        let response_code = buf.first()? & 0x7F;
        match response_code {
            // Fixed format, current (0x70) or deferred (0x71)
            0x70 | 0x71 => {
                if buf.len() < 14 {
                    return None;
                }
                Some(SenseData {
                    key: buf[2] & 0x0F,
                    asc: buf[12],
                    ascq: buf[13],
                })
            }
            // Descriptor format, current (0x72) or deferred (0x73)
            0x72 | 0x73 => {
                if buf.len() < 4 {
                    return None;
                }
                Some(SenseData {
                    key: buf[1] & 0x0F,
                    asc: buf[2],
                    ascq: buf[3],
                })
            }
            _ => None,
        }
    }

    /// Standard name for the sense key
    pub const fn key_name(&self) -> &'static str {
        match self.key {
            0x0 => "NO SENSE",
            0x1 => "RECOVERED ERROR",
            0x2 => "NOT READY",
            0x3 => "MEDIUM ERROR",
            0x4 => "HARDWARE ERROR",
            0x5 => "ILLEGAL REQUEST",
            0x6 => "UNIT ATTENTION",
            0x7 => "DATA PROTECT",
            0x8 => "BLANK CHECK",
            0x9 => "VENDOR SPECIFIC",
            0xA => "COPY ABORTED",
            0xB => "ABORTED COMMAND",
            0xD => "VOLUME OVERFLOW",
            0xE => "MISCOMPARE",
            _ => "RESERVED",
        }
    }
}

impl fmt::Display for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sense key {:#04x} ({}), asc {:#04x}, ascq {:#04x}",
            self.key,
            self.key_name(),
            self.asc,
            self.ascq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed_format() {
        let mut buf = [0u8; 18];
        buf[0] = 0x70;
        buf[2] = 0x05; // ILLEGAL REQUEST
        buf[12] = 0x20; // INVALID COMMAND OPERATION CODE
        buf[13] = 0x00;
        let sense = SenseData::parse(&buf).unwrap();
        assert_eq!(sense.key, 0x05);
        assert_eq!(sense.asc, 0x20);
        assert_eq!(sense.ascq, 0x00);
        assert_eq!(sense.key_name(), "ILLEGAL REQUEST");
    }

    #[test]
    fn test_parse_descriptor_format() {
        let mut buf = [0u8; 8];
        buf[0] = 0x72;
        buf[1] = 0x0B; // ABORTED COMMAND
        buf[2] = 0x4B;
        buf[3] = 0x03;
        let sense = SenseData::parse(&buf).unwrap();
        assert_eq!(sense.key, 0x0B);
        assert_eq!(sense.asc, 0x4B);
        assert_eq!(sense.ascq, 0x03);
    }

    #[test]
    fn test_parse_masks_valid_bit() {
        let mut buf = [0u8; 18];
        buf[0] = 0xF0; // fixed format with VALID bit set
        buf[2] = 0x03;
        buf[12] = 0x11;
        assert_eq!(
            SenseData::parse(&buf),
            Some(SenseData {
                key: 0x03,
                asc: 0x11,
                ascq: 0x00
            })
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_short() {
        assert_eq!(SenseData::parse(&[]), None);
        assert_eq!(SenseData::parse(&[0u8; 32]), None); // zeroed buffer
        let mut short = [0u8; 8];
        short[0] = 0x70;
        assert_eq!(SenseData::parse(&short), None);
    }
}
