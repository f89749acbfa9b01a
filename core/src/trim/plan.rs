//! Chunk planning
//!
//! Pure arithmetic for splitting a device's block range into UNMAP-sized
//! chunks. The dispatcher tracks the same numbers statefully; this module
//! is the side-effect-free view of the walk.

use super::MAX_BLOCKS_PER_UNMAP;

/// One contiguous run of logical blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// First block of the run
    pub start_lba: u64,
    /// Blocks in the run; the field type enforces the per-command ceiling
    pub block_count: u32,
}

impl BlockRange {
    /// LBA one past the end of the run
    pub const fn end_lba(&self) -> u64 {
        self.start_lba + self.block_count as u64
    }
}

/// Number of UNMAP commands needed to cover `total_blocks`
///
/// `chunk_limit` must be non-zero; the count is defined for every
/// `total_blocks` up to `u64::MAX`.
pub const fn chunks_needed(total_blocks: u64, chunk_limit: u32) -> u64 {
    total_blocks.div_ceil(chunk_limit as u64)
}

/// Iterator over the ordered chunk sequence covering a block range
///
/// Chunks are contiguous, strictly ascending, and non-overlapping; every
/// chunk except possibly the last spans exactly `chunk_limit` blocks, and
/// the counts sum to the planned total.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    cursor: u64,
    remaining: u64,
    chunk_limit: u32,
}

impl ChunkPlan {
    /// Plan a whole device with the protocol ceiling per chunk
    pub fn new(total_blocks: u64) -> Self {
        Self::with_chunk_limit(total_blocks, MAX_BLOCKS_PER_UNMAP)
    }

    /// Plan with an explicit per-chunk ceiling (must be non-zero)
    pub fn with_chunk_limit(total_blocks: u64, chunk_limit: u32) -> Self {
        debug_assert!(chunk_limit > 0);
        Self {
            cursor: 0,
            remaining: total_blocks,
            chunk_limit,
        }
    }

    /// Plan starting mid-range (the dispatcher's view after a partial run)
    pub(crate) fn resume(cursor: u64, remaining: u64, chunk_limit: u32) -> Self {
        Self {
            cursor,
            remaining,
            chunk_limit,
        }
    }

    /// Chunks left to yield
    pub fn remaining_chunks(&self) -> u64 {
        chunks_needed(self.remaining, self.chunk_limit)
    }
}

impl Iterator for ChunkPlan {
    type Item = BlockRange;

    fn next(&mut self) -> Option<BlockRange> {
        if self.remaining == 0 {
            return None;
        }
        let block_count = self.remaining.min(self.chunk_limit as u64) as u32;
        let range = BlockRange {
            start_lba: self.cursor,
            block_count,
        };
        self.cursor += block_count as u64;
        self.remaining -= block_count as u64;
        Some(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_plan() {
        let chunks: Vec<_> = ChunkPlan::new(1_000_000).collect();
        assert_eq!(
            chunks,
            vec![BlockRange {
                start_lba: 0,
                block_count: 1_000_000
            }]
        );
    }

    #[test]
    fn test_multi_chunk_plan() {
        let chunks: Vec<_> = ChunkPlan::with_chunk_limit(2500, 1000).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_lba, 0);
        assert_eq!(chunks[1].start_lba, 1000);
        assert_eq!(chunks[2].start_lba, 2000);
        assert_eq!(chunks[2].block_count, 500);
    }

    #[test]
    fn test_empty_plan() {
        assert_eq!(ChunkPlan::new(0).next(), None);
        assert_eq!(chunks_needed(0, MAX_BLOCKS_PER_UNMAP), 0);
    }

    #[test]
    fn test_chunks_needed() {
        assert_eq!(chunks_needed(999, 1000), 1);
        assert_eq!(chunks_needed(1000, 1000), 1);
        assert_eq!(chunks_needed(1001, 1000), 2);
    }

    #[test]
    fn test_chunks_needed_at_the_top_of_the_address_space() {
        // 2^64 - 1 = (2^32 - 1) * (2^32 + 1), so the division is exact
        assert_eq!(chunks_needed(u64::MAX, MAX_BLOCKS_PER_UNMAP), 4_294_967_297);
        assert_eq!(chunks_needed(u64::MAX, 1), u64::MAX);
    }
}
