//! SCSI Command Encoding
//!
//! Wire-exact encoding for the UNMAP command and decoding for the sense
//! data that comes back when a device rejects one. Everything here is pure
//! byte manipulation; submission lives behind the `host` traits.
//!
//! # Flow
//!
//! ```text
//! ┌────────────┐   UnmapCommand    ┌─────────────┐   pass-through   ┌────────┐
//! │ dispatcher │ ────────────────► │ host device │ ───────────────► │ device │
//! │            │ ◄──────────────── │   handle    │ ◄─────────────── │  f/w   │
//! └────────────┘   CommandStatus   └─────────────┘   status+sense   └────────┘
//! ```
//!
//! All multi-byte protocol fields are big-endian, per SCSI convention.

mod sense;
mod unmap;

pub use sense::SenseData;
pub use unmap::{
    decode_parameter_list, UnmapCommand, UNMAP_BLOCK_DESCRIPTOR_LEN, UNMAP_CDB_LEN, UNMAP_OPCODE,
    UNMAP_PARAMETER_LIST_LEN,
};

/// Sense buffer size requested with every pass-through submission
pub const SENSE_BUFFER_LEN: usize = 32;

/// SCSI GOOD status
pub const STATUS_GOOD: u8 = 0x00;

/// SCSI CHECK CONDITION status (sense data describes the failure)
pub const STATUS_CHECK_CONDITION: u8 = 0x02;

/// Raw result of one pass-through submission
#[derive(Debug, Clone, Copy)]
pub struct CommandStatus {
    /// SCSI status byte reported by the device
    pub scsi_status: u8,
    /// Sense buffer as returned; only meaningful for non-good status
    pub sense: [u8; SENSE_BUFFER_LEN],
}

impl CommandStatus {
    /// Build a clean GOOD status (used by tests and mock transports)
    pub fn good() -> Self {
        Self {
            scsi_status: STATUS_GOOD,
            sense: [0u8; SENSE_BUFFER_LEN],
        }
    }

    /// Whether the device accepted the command
    pub fn is_good(&self) -> bool {
        self.scsi_status == STATUS_GOOD
    }

    /// Decode the sense buffer, if it holds a recognized format
    pub fn sense_data(&self) -> Option<SenseData> {
        SenseData::parse(&self.sense)
    }
}
