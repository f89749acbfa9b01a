//! Trim error types
//!
//! Fatal failures only. Best-effort steps (volume locking, dismounting,
//! the offline transition) report through `AccessWarning` instead and
//! never abort a run.

use std::io;

use thiserror::Error;

use crate::scsi::SenseData;

/// Errors that abort a full-device trim
#[derive(Debug, Error)]
pub enum TrimError {
    /// The target device itself could not be opened for command access.
    /// Volume locks taken before this point have already been released.
    #[error("could not open device {device_id} for command access: {source}")]
    DeviceOpen {
        device_id: u32,
        #[source]
        source: io::Error,
    },

    /// The pass-through submission itself failed (driver rejected the
    /// request, device vanished, or the command timed out)
    #[error("unmap submission failed at LBA {lba}: {source}")]
    CommandTransport {
        lba: u64,
        #[source]
        source: io::Error,
    },

    /// The device accepted the submission but returned a non-good SCSI
    /// status for the chunk starting at `lba`
    #[error("device rejected unmap at LBA {lba}: SCSI status {status:#04x}, {}", sense_summary(.sense))]
    CommandRejected {
        lba: u64,
        status: u8,
        sense: Option<SenseData>,
    },
}

/// Result type for trim operations
pub type Result<T> = std::result::Result<T, TrimError>;

fn sense_summary(sense: &Option<SenseData>) -> String {
    match sense {
        Some(s) => s.to_string(),
        None => "no sense data".into(),
    }
}
