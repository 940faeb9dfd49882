//! Block buffer configuration parameters.

use crate::error::BufferError;

/// Configuration for a [`BlockBuffer`](crate::BlockBuffer).
///
/// Validated at construction; all values are immutable for the lifetime
/// of the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    /// Size of each pool-allocated block in bytes.
    ///
    /// Default: 65_536. Must be non-zero.
    pub block_size: usize,

    /// Upper bound on the flush scratch chunk in bytes.
    ///
    /// The chunk size used by a flush is the sink's natural write size
    /// clamped to this value. Default: 1 GiB. Must be non-zero.
    pub max_chunk_size: usize,

    /// Blocks reserved (best effort) when the buffer is created.
    ///
    /// Default: 1.
    pub initial_blocks: usize,
}

impl BufferConfig {
    /// Default block size: 64 KiB.
    pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

    /// Default scratch ceiling: 1 GiB.
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024 * 1024;

    /// Default number of blocks reserved at construction.
    pub const DEFAULT_INITIAL_BLOCKS: usize = 1;

    /// Create a config with the given block size and defaults elsewhere.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            max_chunk_size: Self::DEFAULT_MAX_CHUNK_SIZE,
            initial_blocks: Self::DEFAULT_INITIAL_BLOCKS,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.block_size == 0 {
            return Err(BufferError::ZeroBlockSize);
        }
        if self.max_chunk_size == 0 {
            return Err(BufferError::InvalidConfig {
                reason: "max_chunk_size must be non-zero".into(),
            });
        }
        Ok(())
    }

    /// Bytes reserved at construction.
    pub fn initial_capacity(&self) -> usize {
        self.block_size.saturating_mul(self.initial_blocks)
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
