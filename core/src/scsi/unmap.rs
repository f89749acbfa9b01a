//! UNMAP command builder
//!
//! Packs one logical block range into the two buffers a pass-through
//! submission needs: the 10-byte CDB and the 24-byte parameter list
//! holding a single block descriptor.
//!
//! # Parameter list layout
//!
//! ```text
//! offset  size  field
//!      0     2  unmap data length (22 = 6 + descriptor bytes)
//!      2     2  unmap block descriptor data length (16)
//!      4     4  reserved
//!      8     8  starting LBA
//!     16     4  number of logical blocks
//!     20     4  reserved
//! ```
//!
//! One descriptor per command. Devices advertise multi-descriptor limits
//! through the block limits VPD page, but a single descriptor is accepted
//! universally, which matters more here than batching.

/// UNMAP operation code
pub const UNMAP_OPCODE: u8 = 0x42;

/// CDB length for UNMAP (10-byte CDB group)
pub const UNMAP_CDB_LEN: usize = 10;

/// One block descriptor: 8-byte LBA + 4-byte count + 4 reserved
pub const UNMAP_BLOCK_DESCRIPTOR_LEN: usize = 16;

/// 8-byte parameter list header + one block descriptor
pub const UNMAP_PARAMETER_LIST_LEN: usize = 8 + UNMAP_BLOCK_DESCRIPTOR_LEN;

/// Value of the "unmap data length" header field: the number of bytes
/// following that field itself
const UNMAP_DATA_LEN: u16 = 6 + UNMAP_BLOCK_DESCRIPTOR_LEN as u16;

/// A fully encoded UNMAP request for one contiguous block range
///
/// Stateless and deterministic: the same `(start_lba, block_count)` pair
/// always produces the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmapCommand {
    cdb: [u8; UNMAP_CDB_LEN],
    parameter_list: [u8; UNMAP_PARAMETER_LIST_LEN],
}

impl UnmapCommand {
    /// Encode an UNMAP for `block_count` blocks starting at `start_lba`
    pub fn new(start_lba: u64, block_count: u32) -> Self {
        let mut cdb = [0u8; UNMAP_CDB_LEN];
        cdb[0] = UNMAP_OPCODE;
        // cdb[1] bit 0 is ANCHOR; anchored unmaps are not supported here
        // cdb[6] is the group number, left at 0
        cdb[7..9].copy_from_slice(&(UNMAP_PARAMETER_LIST_LEN as u16).to_be_bytes());
        // cdb[9] is CONTROL, left at 0

        let mut parameter_list = [0u8; UNMAP_PARAMETER_LIST_LEN];
        parameter_list[0..2].copy_from_slice(&UNMAP_DATA_LEN.to_be_bytes());
        parameter_list[2..4].copy_from_slice(&(UNMAP_BLOCK_DESCRIPTOR_LEN as u16).to_be_bytes());
        // bytes 4..8 reserved
        parameter_list[8..16].copy_from_slice(&start_lba.to_be_bytes());
        parameter_list[16..20].copy_from_slice(&block_count.to_be_bytes());
        // bytes 20..24 reserved

        Self {
            cdb,
            parameter_list,
        }
    }

    /// The 10-byte command descriptor block
    pub fn cdb(&self) -> &[u8; UNMAP_CDB_LEN] {
        &self.cdb
    }

    /// The 24-byte parameter list (data-out buffer)
    pub fn parameter_list(&self) -> &[u8; UNMAP_PARAMETER_LIST_LEN] {
        &self.parameter_list
    }
}

/// Decode a single-descriptor UNMAP parameter list back into
/// `(start_lba, block_count)`
///
/// Returns `None` when the buffer is short or the header fields do not
/// describe exactly one block descriptor. Inverse of [`UnmapCommand::new`]
/// over the parameter list.
pub fn decode_parameter_list(data: &[u8]) -> Option<(u64, u32)> {
    if data.len() < UNMAP_PARAMETER_LIST_LEN {
        return None;
    }

    let data_len = u16::from_be_bytes(data[0..2].try_into().ok()?);
    let descriptor_len = u16::from_be_bytes(data[2..4].try_into().ok()?);
    if data_len != UNMAP_DATA_LEN || descriptor_len != UNMAP_BLOCK_DESCRIPTOR_LEN as u16 {
        return None;
    }

    let start_lba = u64::from_be_bytes(data[8..16].try_into().ok()?);
    let block_count = u32::from_be_bytes(data[16..20].try_into().ok()?);
    Some((start_lba, block_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_bytes() {
        let cmd = UnmapCommand::new(0, 1);
        let cdb = cmd.cdb();
        assert_eq!(cdb[0], 0x42);
        assert_eq!(cdb[1] & 0x01, 0, "anchor bit must stay clear");
        assert_eq!(cdb[6], 0);
        assert_eq!(u16::from_be_bytes([cdb[7], cdb[8]]), 24);
        assert_eq!(cdb[9], 0);
    }

    #[test]
    fn test_parameter_list_fields() {
        let cmd = UnmapCommand::new(0x1122_3344_5566_7788, 0xAABB_CCDD);
        let p = cmd.parameter_list();
        assert_eq!(&p[0..2], &22u16.to_be_bytes());
        assert_eq!(&p[2..4], &16u16.to_be_bytes());
        assert_eq!(&p[4..8], &[0u8; 4]);
        assert_eq!(&p[8..16], &0x1122_3344_5566_7788u64.to_be_bytes());
        assert_eq!(&p[16..20], &0xAABB_CCDDu32.to_be_bytes());
        assert_eq!(&p[20..24], &[0u8; 4]);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let cmd = UnmapCommand::new(7, 4096);
        assert_eq!(decode_parameter_list(cmd.parameter_list()), Some((7, 4096)));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(decode_parameter_list(&[0u8; 8]), None);
        assert_eq!(decode_parameter_list(&[0u8; 24]), None); // zeroed header
    }
}
