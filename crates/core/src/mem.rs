//! Flat main memory.
//!
//! A sparse, block-granular store shared by every cache. Blocks that have
//! never been written read as all zeroes; the simulator is timing-faithful
//! rather than data-faithful, so payloads only exist to keep block-size
//! bookkeeping honest. Latency is not modeled here; the bus charges it.

use std::collections::HashMap;

use crate::common::{Addr, SimError};

/// Sparse block store backing all four caches.
pub struct MainMemory {
    block_bytes: usize,
    blocks: HashMap<u32, Vec<u8>>,
    reads: u64,
    writes: u64,
}

impl MainMemory {
    /// Creates an empty memory serving blocks of `block_bytes` bytes.
    pub fn new(block_bytes: usize) -> Self {
        Self {
            block_bytes,
            blocks: HashMap::new(),
            reads: 0,
            writes: 0,
        }
    }

    /// Block size in bytes.
    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Reads the block at `block_addr`, materializing an all-zero block on
    /// first touch. Increments the read counter.
    pub fn read_block(&mut self, block_addr: Addr) -> &[u8] {
        self.reads += 1;
        self.blocks
            .entry(block_addr.val())
            .or_insert_with(|| vec![0u8; self.block_bytes])
    }

    /// Stores a block at `block_addr`. Increments the write counter.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BlockSizeMismatch`] and leaves memory untouched if
    /// the payload length differs from the configured block size.
    pub fn write_block(&mut self, block_addr: Addr, bytes: &[u8]) -> Result<(), SimError> {
        if bytes.len() != self.block_bytes {
            return Err(SimError::BlockSizeMismatch {
                expected: self.block_bytes,
                actual: bytes.len(),
            });
        }
        self.writes += 1;
        self.blocks.insert(block_addr.val(), bytes.to_vec());
        Ok(())
    }

    /// Number of block reads served.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of block writes accepted.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}
