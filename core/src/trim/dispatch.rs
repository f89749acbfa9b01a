//! Chunked UNMAP dispatch
//!
//! Stateful walker over the chunk plan: encodes one UNMAP per chunk,
//! submits it, and advances only on clean acceptance. The first failure
//! of any kind aborts the walk with the failed chunk still outstanding.
//!
//! # Usage
//!
//! ```ignore
//! let mut dispatcher = UnmapDispatcher::new(total_blocks);
//! dispatcher.run(&mut device, |p| eprint!("\r{:.1}%", p.percent()))?;
//! assert_eq!(dispatcher.state(), DispatchState::Completed);
//! ```

use crate::error::{Result, TrimError};
use crate::host::DeviceControl;
use crate::scsi::UnmapCommand;
use crate::trim::plan::{chunks_needed, ChunkPlan};
use crate::trim::{MAX_BLOCKS_PER_UNMAP, UNMAP_TIMEOUT_SECS};

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No command submitted yet
    Pending,
    /// Walking the chunk sequence
    Dispatching,
    /// Every chunk accepted by the device
    Completed,
    /// A chunk failed; the remainder of the range is untouched
    Aborted,
}

/// Progress snapshot handed to the observer after each accepted chunk
#[derive(Debug, Clone, Copy)]
pub struct TrimProgress {
    pub blocks_done: u64,
    pub total_blocks: u64,
    pub chunks_done: u64,
    pub chunk_count: u64,
}

impl TrimProgress {
    /// Fraction complete as a percentage (0-100)
    pub fn percent(&self) -> f64 {
        if self.total_blocks == 0 {
            return 100.0;
        }
        (self.blocks_done as f64 / self.total_blocks as f64) * 100.0
    }
}

/// Walks the chunk sequence for one device
pub struct UnmapDispatcher {
    /// Current state
    state: DispatchState,
    /// Next LBA to deallocate
    cursor: u64,
    /// Blocks not yet accepted by the device
    remaining: u64,
    /// Whole-range block count the dispatcher was built for
    total_blocks: u64,
    /// Per-command block ceiling
    chunk_limit: u32,
    /// Chunks accepted so far
    chunks_done: u64,
}

impl UnmapDispatcher {
    /// Dispatcher over `total_blocks` with the protocol ceiling per chunk
    pub fn new(total_blocks: u64) -> Self {
        Self::with_chunk_limit(total_blocks, MAX_BLOCKS_PER_UNMAP)
    }

    /// Dispatcher with a smaller per-command ceiling (must be non-zero)
    pub fn with_chunk_limit(total_blocks: u64, chunk_limit: u32) -> Self {
        debug_assert!(chunk_limit > 0);
        Self {
            state: DispatchState::Pending,
            cursor: 0,
            remaining: total_blocks,
            total_blocks,
            chunk_limit,
            chunks_done: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Blocks the device has accepted deallocation for
    pub fn blocks_trimmed(&self) -> u64 {
        self.total_blocks - self.remaining
    }

    /// Chunks accepted so far
    pub fn chunks_done(&self) -> u64 {
        self.chunks_done
    }

    /// Commands the whole range requires
    pub fn chunk_count(&self) -> u64 {
        chunks_needed(self.total_blocks, self.chunk_limit)
    }

    /// Plan over the blocks still outstanding
    pub fn plan(&self) -> ChunkPlan {
        ChunkPlan::resume(self.cursor, self.remaining, self.chunk_limit)
    }

    /// Drive the dispatch to a terminal state
    ///
    /// Chunks go out in strictly ascending LBA order, one at a time, each
    /// awaited to a terminal status before the next. The walk stops at the
    /// first transport failure or non-good status, leaving the failed
    /// chunk outstanding; a later `run` call retries from exactly there.
    /// The observer fires after each accepted chunk whenever the range
    /// needs more than one command.
    pub fn run<D, F>(&mut self, device: &mut D, mut progress: F) -> Result<()>
    where
        D: DeviceControl,
        F: FnMut(TrimProgress),
    {
        let chunk_count = self.chunk_count();
        self.state = DispatchState::Dispatching;

        while self.remaining > 0 {
            let this_chunk = self.remaining.min(self.chunk_limit as u64) as u32;
            let command = UnmapCommand::new(self.cursor, this_chunk);

            let status = match device.submit_unmap(&command, UNMAP_TIMEOUT_SECS) {
                Ok(status) => status,
                Err(source) => {
                    self.state = DispatchState::Aborted;
                    return Err(TrimError::CommandTransport {
                        lba: self.cursor,
                        source,
                    });
                }
            };
            if !status.is_good() {
                self.state = DispatchState::Aborted;
                return Err(TrimError::CommandRejected {
                    lba: self.cursor,
                    status: status.scsi_status,
                    sense: status.sense_data(),
                });
            }

            self.cursor += this_chunk as u64;
            self.remaining -= this_chunk as u64;
            self.chunks_done += 1;

            if chunk_count > 1 {
                progress(TrimProgress {
                    blocks_done: self.blocks_trimmed(),
                    total_blocks: self.total_blocks,
                    chunks_done: self.chunks_done,
                    chunk_count,
                });
            }
        }

        self.state = DispatchState::Completed;
        Ok(())
    }
}
