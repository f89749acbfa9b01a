//! Full-Device Trim
//!
//! Covers the whole logical block range of one device with UNMAP commands.
//! Three layers: pure chunk arithmetic (`plan`), the stateful dispatcher
//! that walks the plan against a device handle (`dispatch`), and the
//! orchestration that wraps dispatch in exclusive access (`run`).
//!
//! # Architecture
//!
//! ```text
//! run_full_trim
//!   ├─ access::acquire          lock/dismount volumes, open device, offline
//!   ├─ DeviceControl::geometry  sector size + capacity → total blocks
//!   ├─ UnmapDispatcher::run     one UNMAP per chunk, ascending LBA
//!   │    └─ UnmapCommand::new   wire encoding per chunk
//!   └─ drop(AccessSession)      restore online, unlock, close
//! ```

mod dispatch;
mod plan;
mod run;

pub use dispatch::{DispatchState, TrimProgress, UnmapDispatcher};
pub use plan::{chunks_needed, BlockRange, ChunkPlan};
pub use run::{run_full_trim, TrimReport, FALLBACK_SECTOR_SIZE};

/// Most blocks one UNMAP block descriptor can express (32-bit count)
pub const MAX_BLOCKS_PER_UNMAP: u32 = 0xFFFF_FFFF;

/// Per-command timeout handed to the pass-through layer. Deallocating
/// billions of blocks in one command is legitimately slow on bridge
/// firmware, so this is generous.
pub const UNMAP_TIMEOUT_SECS: u32 = 300;
