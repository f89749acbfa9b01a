//! Full-trim orchestration
//!
//! One call does the whole dance for a device: acquire exclusive access,
//! resolve geometry, walk the chunk plan, release everything, and report
//! what happened as a value.

use crate::access::{self, AccessWarning};
use crate::error::Result;
use crate::host::{DeviceControl, StorageHost};
use crate::trim::dispatch::{TrimProgress, UnmapDispatcher};

/// Sector size assumed when the geometry query cannot say (bytes)
pub const FALLBACK_SECTOR_SIZE: u32 = 512;

/// Outcome of one full-device trim
///
/// Success and failure both come back through here; `result` is the
/// terminal dispatch outcome, `warnings` the soft failures collected on
/// the way in. Presentation is the caller's problem.
#[derive(Debug)]
pub struct TrimReport {
    /// Device the run targeted
    pub device_id: u32,
    /// Sector size used for block math
    pub sector_size: u32,
    /// Whole-device block count (0 when capacity was unreadable)
    pub total_blocks: u64,
    /// Blocks the device accepted deallocation for
    pub blocks_trimmed: u64,
    /// Commands the device accepted
    pub chunks_submitted: u64,
    /// Soft failures from the access path (locks, dismounts, offline)
    pub warnings: Vec<AccessWarning>,
    /// Terminal result
    pub result: Result<()>,
}

impl TrimReport {
    /// Whether every planned block was accepted for deallocation
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Deallocate every logical block of `device_id`
///
/// Destructive and unrecoverable on real hardware. All consent gathering
/// belongs to the caller; by the time this runs, the decision is made.
/// The progress observer fires after each accepted chunk when the device
/// needs more than one command.
pub fn run_full_trim<H, F>(host: &H, device_id: u32, progress: F) -> TrimReport
where
    H: StorageHost,
    F: FnMut(TrimProgress),
{
    let mut warnings = Vec::new();

    let mut session = match access::acquire(host, device_id, &mut warnings) {
        Ok(session) => session,
        Err(error) => {
            return TrimReport {
                device_id,
                sector_size: FALLBACK_SECTOR_SIZE,
                total_blocks: 0,
                blocks_trimmed: 0,
                chunks_submitted: 0,
                warnings,
                result: Err(error),
            };
        }
    };

    // Geometry comes from the session handle so the block math reflects
    // the device as locked, not as enumerated earlier.
    let (size_bytes, sector_size) = match session.device().geometry() {
        Ok(geometry) if geometry.bytes_per_sector > 0 => {
            (geometry.size_bytes, geometry.bytes_per_sector)
        }
        Ok(geometry) => (geometry.size_bytes, FALLBACK_SECTOR_SIZE),
        Err(error) => {
            log::warn!("geometry query failed on device {device_id}: {error}");
            (0, FALLBACK_SECTOR_SIZE)
        }
    };
    let total_blocks = size_bytes / sector_size as u64;

    let mut dispatcher = UnmapDispatcher::new(total_blocks);
    let result = dispatcher.run(session.device_mut(), progress);

    // Session drops here: restore online, unlock volumes, close handles.
    drop(session);

    TrimReport {
        device_id,
        sector_size,
        total_blocks,
        blocks_trimmed: dispatcher.blocks_trimmed(),
        chunks_submitted: dispatcher.chunks_done(),
        warnings,
        result,
    }
}
