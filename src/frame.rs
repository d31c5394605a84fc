//! Data frame (C3): a contiguous run of equally sized blocks at a known
//! block offset, backed by a [`ZeroFilledBuffer`].

use std::sync::Arc;

use crate::buffer::ZeroFilledBuffer;
use crate::error::SignatureError;
use crate::pool::MemoryPool;

/// The recipe used to construct a [`DataFrame`]: where it starts, how big its
/// blocks are, and how many of them it holds.
#[derive(Clone)]
pub struct FrameConfig {
    pub first_block_idx: u64,
    pub block_size: usize,
    pub blocks_count: usize,
    pub pool: Option<Arc<MemoryPool>>,
}

impl PartialEq for FrameConfig {
    fn eq(&self, other: &Self) -> bool {
        self.first_block_idx == other.first_block_idx
            && self.block_size == other.block_size
            && self.blocks_count == other.blocks_count
    }
}

pub struct DataFrame {
    first_block_idx: u64,
    block_size: usize,
    blocks_count: usize,
    buffer: ZeroFilledBuffer,
}

/// Frames are ordered by `first_block_idx` alone. The pipeline never relies
/// on this ordering — queues deliver frames out of order by design — it
/// exists solely so tests can sort a drained queue back into file order.
impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.first_block_idx == other.first_block_idx
    }
}

impl Eq for DataFrame {}

impl PartialOrd for DataFrame {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataFrame {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.first_block_idx.cmp(&other.first_block_idx)
    }
}

impl DataFrame {
    pub fn new(config: &FrameConfig) -> Result<Self, SignatureError> {
        let capacity = config.block_size * config.blocks_count;
        let buffer = ZeroFilledBuffer::new(capacity, config.pool.clone())?;
        Ok(DataFrame {
            first_block_idx: config.first_block_idx,
            block_size: config.block_size,
            blocks_count: config.blocks_count,
            buffer,
        })
    }

    pub fn first_block_index(&self) -> u64 {
        self.first_block_idx
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn blocks_count(&self) -> usize {
        self.blocks_count
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn total_size_of_all_blocks(&self) -> usize {
        self.block_size * self.blocks_count
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.total_size_of_all_blocks()]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        let len = self.total_size_of_all_blocks();
        &mut self.buffer.as_mut_slice()[..len]
    }

    /// Returns the byte range of block `i` within this frame.
    pub fn block_as_range(&self, i: usize) -> &[u8] {
        assert!(i < self.blocks_count, "block index out of range");
        let start = i * self.block_size;
        &self.buffer.as_slice()[start..start + self.block_size]
    }

    pub fn block_as_range_mut(&mut self, i: usize) -> &mut [u8] {
        assert!(i < self.blocks_count, "block index out of range");
        let block_size = self.block_size;
        let start = i * block_size;
        &mut self.buffer.as_mut_slice()[start..start + block_size]
    }

    /// Reduces the reported block count without reallocating. Used by the
    /// reader when the final frame of a file is short. Fails if `k` would
    /// make the frame claim more bytes than its buffer actually holds.
    pub fn set_blocks_count(&mut self, k: usize) -> Result<(), SignatureError> {
        if k * self.block_size > self.buffer.len() {
            return Err(SignatureError::Programming(format!(
                "set_blocks_count({k}) exceeds frame capacity {}",
                self.buffer.len()
            )));
        }
        self.blocks_count = k;
        Ok(())
    }

    pub fn try_clone(&self) -> Result<Self, SignatureError> {
        Ok(DataFrame {
            first_block_idx: self.first_block_idx,
            block_size: self.block_size,
            blocks_count: self.blocks_count,
            buffer: self.buffer.try_clone()?,
        })
    }
}
