//! The growable block buffer.
//!
//! A [`BlockBuffer`] owns an ordered list of pool-allocated blocks, each
//! exactly `block_size` bytes. Capacity grows one whole block at a time
//! and never shrinks; the used size is the number of bytes considered
//! written. Blocks are released to the pool exactly once, on drop.

use std::fmt;
use std::sync::Arc;

use colstage_core::{IoMetrics, MemoryPool, OutputSink, PoolBlock};
use smallvec::SmallVec;

use crate::config::BufferConfig;
use crate::error::BufferError;
use crate::scratch::ScratchChunk;
use crate::view::{Block, BlockMut};

/// Growable, block-chunked staging buffer.
///
/// Intended to be driven by a single producer for its whole
/// fill-then-flush lifecycle. Independent buffers may live on different
/// threads and share a pool and a metrics sink.
pub struct BlockBuffer {
    pool: Arc<dyn MemoryPool>,
    /// Owned blocks in logical order.
    blocks: SmallVec<[PoolBlock; 4]>,
    block_size: usize,
    max_chunk_size: usize,
    /// Bytes considered written. Always `<= capacity`.
    used: usize,
    /// `blocks.len() * block_size`.
    capacity: usize,
}

impl BlockBuffer {
    /// Create a buffer with the given block size and default settings.
    ///
    /// Fails with [`BufferError::ZeroBlockSize`] if `block_size` is zero,
    /// in which case no block is allocated.
    pub fn new(pool: Arc<dyn MemoryPool>, block_size: usize) -> Result<Self, BufferError> {
        Self::with_config(pool, &BufferConfig::new(block_size))
    }

    /// Create a buffer from a validated [`BufferConfig`].
    ///
    /// The initial reservation is best effort, like [`reserve`](Self::reserve).
    pub fn with_config(
        pool: Arc<dyn MemoryPool>,
        config: &BufferConfig,
    ) -> Result<Self, BufferError> {
        config.validate()?;
        let mut buffer = Self {
            pool,
            blocks: SmallVec::new(),
            block_size: config.block_size,
            max_chunk_size: config.max_chunk_size,
            used: 0,
            capacity: 0,
        };
        buffer.reserve(config.initial_capacity());
        Ok(buffer)
    }

    /// Grow capacity until it reaches `target` or the pool refuses a block.
    ///
    /// A shortfall is not an error: capacity is left at whatever was
    /// achieved. Callers needing a guarantee check [`capacity`](Self::capacity)
    /// or use [`resize`](Self::resize).
    pub fn reserve(&mut self, target: usize) {
        while self.capacity < target {
            match self.pool.allocate(self.block_size) {
                Some(block) if block.len() >= self.block_size => {
                    self.blocks.push(block);
                    self.capacity += self.block_size;
                }
                Some(short) => {
                    tracing::debug!(
                        requested = self.block_size,
                        returned = short.len(),
                        "pool returned a short block during reserve"
                    );
                    self.pool.release(short);
                    break;
                }
                None => {
                    tracing::debug!(
                        target_capacity = target,
                        achieved = self.capacity,
                        block_size = self.block_size,
                        "block pool exhausted during reserve"
                    );
                    break;
                }
            }
        }
    }

    /// Set the used size to `size`, growing capacity first if needed.
    ///
    /// Fails with [`BufferError::InsufficientCapacity`] if the pool could
    /// not supply enough blocks; the used size is then left unchanged,
    /// although any blocks obtained on the way are kept.
    pub fn resize(&mut self, size: usize) -> Result<(), BufferError> {
        self.reserve(size);
        if self.capacity < size {
            return Err(BufferError::InsufficientCapacity {
                requested: size,
                achieved: self.capacity,
            });
        }
        self.used = size;
        Ok(())
    }

    /// View of the `index`-th logical block.
    ///
    /// Every block but the last is `block_size` bytes; the last holds the
    /// remainder of the used size.
    pub fn block(&self, index: usize) -> Result<Block<'_>, BufferError> {
        let block_count = self.block_count();
        if index >= block_count {
            return Err(BufferError::BlockOutOfRange { index, block_count });
        }
        Ok(self.used_block(index))
    }

    /// Used prefix of block `index`, which must be below `block_count`.
    fn used_block(&self, index: usize) -> Block<'_> {
        let len = (self.used - index * self.block_size).min(self.block_size);
        Block::new(&self.blocks[index].as_slice()[..len])
    }

    /// Acquire the next writable region and commit it as used.
    ///
    /// If the current block has free space, returns its whole free tail;
    /// otherwise grows by one block and returns all of it. Either way the
    /// used size advances to the end of the returned region, whether or
    /// not the caller fills it. The region never extends past the
    /// configured block size, even if the pool handed back a larger block.
    pub fn next_block(&mut self) -> Result<BlockMut<'_>, BufferError> {
        let index = self.used / self.block_size;
        let offset = self.used % self.block_size;
        if self.used < self.capacity {
            self.used = (index + 1) * self.block_size;
        } else {
            let grown = self.used.checked_add(self.block_size).ok_or(
                BufferError::CapacityOverflow {
                    size: self.used,
                    additional: self.block_size,
                },
            )?;
            self.resize(grown)?;
        }
        Ok(BlockMut::new(
            &mut self.blocks[index].as_mut_slice()[offset..self.block_size],
        ))
    }

    /// Flush every used byte to `sink`, then report the I/O count.
    ///
    /// Writes are batched to the sink's natural write size, clamped to the
    /// configured chunk ceiling. A buffer holding a single block that fits
    /// one chunk is written directly; anything larger is coalesced through
    /// a scratch chunk borrowed from the pool. Returns the number of
    /// physical writes issued. `metrics` is only updated on success.
    pub fn write_to(
        &self,
        sink: &mut dyn OutputSink,
        metrics: Option<&dyn IoMetrics>,
    ) -> Result<u64, BufferError> {
        if self.used == 0 {
            return Ok(0);
        }
        let natural = sink.natural_write_size();
        if natural == 0 {
            return Err(BufferError::ZeroNaturalWriteSize);
        }
        let chunk_size =
            usize::try_from(natural).map_or(self.max_chunk_size, |n| n.min(self.max_chunk_size));

        let io_count = if self.block_count() == 1 && self.used <= chunk_size {
            sink.write(self.used_block(0).data()).map_err(flush_failed)?;
            tracing::trace!(bytes = self.used, "flushed single block directly");
            1
        } else {
            let mut scratch = ScratchChunk::acquire(self.pool.as_ref(), chunk_size)
                .ok_or(BufferError::ScratchAllocation {
                    requested: chunk_size,
                })?;
            let io_count = self.write_chunked(sink, &mut scratch)?;
            tracing::trace!(
                bytes = self.used,
                chunk_size,
                io_count,
                "flushed blocks through scratch chunk"
            );
            io_count
        };

        if let Some(metrics) = metrics {
            metrics.add_io_count(io_count);
        }
        Ok(io_count)
    }

    fn write_chunked(
        &self,
        sink: &mut dyn OutputSink,
        scratch: &mut ScratchChunk<'_>,
    ) -> Result<u64, BufferError> {
        let mut io_count = 0;
        for block in self.blocks() {
            let mut rest = block.data();
            while !rest.is_empty() {
                let copied = scratch.fill(rest);
                rest = &rest[copied..];
                if scratch.is_full() {
                    sink.write(scratch.filled()).map_err(flush_failed)?;
                    scratch.reset();
                    io_count += 1;
                }
            }
        }
        if !scratch.is_empty() {
            sink.write(scratch.filled()).map_err(flush_failed)?;
            io_count += 1;
        }
        Ok(io_count)
    }

    /// Iterate over the logical blocks in order.
    pub fn blocks(&self) -> impl Iterator<Item = Block<'_>> + '_ {
        (0..self.block_count()).map(move |i| self.used_block(i))
    }

    /// Number of blocks currently holding data.
    pub fn block_count(&self) -> usize {
        self.used.div_ceil(self.block_size)
    }

    /// Number of blocks allocated, used or not.
    pub fn allocated_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes considered written.
    pub fn size(&self) -> usize {
        self.used
    }

    /// Whether no bytes are considered written.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Allocated capacity in bytes (a multiple of the block size).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of each block in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Copy every used byte into a freshly allocated `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.used);
        for block in self.blocks() {
            out.extend_from_slice(block.data());
        }
        out
    }
}

fn flush_failed(e: colstage_core::SinkError) -> BufferError {
    tracing::warn!(error = %e, "block buffer flush failed");
    BufferError::Sink(e)
}

impl Drop for BlockBuffer {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            self.pool.release(block);
        }
        self.used = 0;
        self.capacity = 0;
    }
}

impl fmt::Debug for BlockBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockBuffer")
            .field("block_size", &self.block_size)
            .field("size", &self.used)
            .field("capacity", &self.capacity)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstage_core::{BoundedPool, IoSink, SystemPool, WriterMetrics};
    use colstage_test_utils::{CountingPool, RecordingSink, RoundingPool};

    fn system_pool() -> Arc<SystemPool> {
        Arc::new(SystemPool::new())
    }

    #[test]
    fn construction_reserves_one_block() {
        let buf = BlockBuffer::new(system_pool(), 64).unwrap();
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.block_count(), 0);
    }

    #[test]
    fn zero_block_size_allocates_nothing() {
        let pool = system_pool();
        let result = BlockBuffer::new(pool.clone(), 0);
        assert!(matches!(result, Err(BufferError::ZeroBlockSize)));
        assert_eq!(pool.live_blocks(), 0);
    }

    #[test]
    fn reserve_grows_in_whole_blocks() {
        let mut buf = BlockBuffer::new(system_pool(), 64).unwrap();
        buf.reserve(65);
        assert_eq!(buf.capacity(), 128);
        buf.reserve(10);
        assert_eq!(buf.capacity(), 128);
    }

    #[test]
    fn reserve_stops_silently_on_exhaustion() {
        let pool = Arc::new(BoundedPool::new(192));
        let mut buf = BlockBuffer::new(pool, 64).unwrap();
        buf.reserve(1000);
        assert_eq!(buf.capacity(), 192);
        assert_eq!(buf.size(), 0);
    }

    #[test]
    fn resize_failure_leaves_size_unchanged() {
        let pool = Arc::new(BoundedPool::new(64 * 15));
        let mut buf = BlockBuffer::new(pool, 64).unwrap();
        buf.resize(100).unwrap();
        let err = buf.resize(1000).unwrap_err();
        assert!(matches!(
            err,
            BufferError::InsufficientCapacity {
                requested: 1000,
                achieved: 960
            }
        ));
        assert_eq!(buf.size(), 100);
        assert_eq!(buf.capacity(), 960);
    }

    #[test]
    fn resize_can_shrink_used_size() {
        let mut buf = BlockBuffer::new(system_pool(), 64).unwrap();
        buf.resize(200).unwrap();
        buf.resize(10).unwrap();
        assert_eq!(buf.size(), 10);
        assert_eq!(buf.capacity(), 256);
    }

    #[test]
    fn block_sizes_follow_used_size() {
        let mut buf = BlockBuffer::new(system_pool(), 64).unwrap();
        buf.resize(150).unwrap();
        assert_eq!(buf.block_count(), 3);
        assert_eq!(buf.block(0).unwrap().size(), 64);
        assert_eq!(buf.block(1).unwrap().size(), 64);
        assert_eq!(buf.block(2).unwrap().size(), 22);
        assert!(matches!(
            buf.block(3),
            Err(BufferError::BlockOutOfRange {
                index: 3,
                block_count: 3
            })
        ));
    }

    #[test]
    fn block_on_empty_buffer_is_out_of_range() {
        let buf = BlockBuffer::new(system_pool(), 64).unwrap();
        assert!(matches!(
            buf.block(0),
            Err(BufferError::BlockOutOfRange { .. })
        ));
    }

    #[test]
    fn next_block_returns_free_tail_and_commits_it() {
        let mut buf = BlockBuffer::new(system_pool(), 64).unwrap();
        buf.resize(10).unwrap();
        let region = buf.next_block().unwrap();
        assert_eq!(region.size(), 54);
        assert_eq!(buf.size(), 64);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn next_block_grows_when_full() {
        let mut buf = BlockBuffer::new(system_pool(), 64).unwrap();
        assert_eq!(buf.next_block().unwrap().size(), 64);
        assert_eq!(buf.next_block().unwrap().size(), 64);
        assert_eq!(buf.size(), 128);
        assert_eq!(buf.capacity(), 128);
        assert_eq!(buf.allocated_blocks(), 2);
    }

    #[test]
    fn next_block_on_boundary_uses_spare_capacity() {
        let pool = Arc::new(CountingPool::new());
        let mut buf = BlockBuffer::new(pool.clone(), 64).unwrap();
        buf.reserve(128);
        buf.resize(64).unwrap();
        assert_eq!(pool.allocations(), 2);

        let region = buf.next_block().unwrap();
        assert_eq!(region.size(), 64);
        assert_eq!(buf.size(), 128);
        assert_eq!(buf.capacity(), 128);
        assert_eq!(pool.allocations(), 2);
    }

    #[test]
    fn oversized_pool_blocks_are_cut_to_block_size() {
        let pool = Arc::new(RoundingPool::new());
        let mut buf = BlockBuffer::new(pool.clone(), 48).unwrap();
        assert_eq!(buf.next_block().unwrap().size(), 48);
        assert_eq!(buf.size(), 48);
        buf.resize(10).unwrap();
        assert_eq!(buf.next_block().unwrap().size(), 38);
        assert_eq!(buf.size(), 48);
        assert_eq!(buf.capacity(), 48);
    }

    #[test]
    fn short_pool_blocks_count_as_exhaustion() {
        let pool = Arc::new(RoundingPool::truncating());
        let mut buf = BlockBuffer::new(pool.clone(), 64).unwrap();
        assert_eq!(buf.capacity(), 0);
        assert!(matches!(
            buf.next_block(),
            Err(BufferError::InsufficientCapacity {
                requested: 64,
                achieved: 0
            })
        ));
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn flush_chunks_follow_natural_size_with_rounding_pool() {
        let pool = Arc::new(RoundingPool::new());
        let mut buf = BlockBuffer::new(pool.clone(), 64).unwrap();
        let payload: Vec<u8> = (0..192u8).collect();
        for chunk in payload.chunks(64) {
            buf.next_block().unwrap().copy_from_slice(chunk);
        }
        let mut sink = RecordingSink::new(100);
        assert_eq!(buf.write_to(&mut sink, None).unwrap(), 2);
        let sizes: Vec<usize> = sink.writes().iter().map(Vec::len).collect();
        assert_eq!(sizes, [100, 92]);
        assert_eq!(sink.bytes(), payload);
        drop(buf);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn next_block_reports_exhaustion() {
        let pool = Arc::new(BoundedPool::new(64));
        let mut buf = BlockBuffer::new(pool, 64).unwrap();
        buf.next_block().unwrap();
        assert!(matches!(
            buf.next_block(),
            Err(BufferError::InsufficientCapacity { .. })
        ));
        assert_eq!(buf.size(), 64);
    }

    #[test]
    fn written_bytes_are_readable_by_index() {
        let mut buf = BlockBuffer::new(system_pool(), 4).unwrap();
        buf.next_block().unwrap().copy_from_slice(b"abcd");
        buf.next_block().unwrap().copy_from_slice(b"efgh");
        assert_eq!(buf.block(1).unwrap().data(), b"efgh");
        assert_eq!(buf.to_vec(), b"abcdefgh");
    }

    #[test]
    fn empty_flush_is_a_no_op() {
        let buf = BlockBuffer::new(system_pool(), 64).unwrap();
        let metrics = WriterMetrics::new();
        let mut sink = IoSink::with_natural_write_size(Vec::<u8>::new(), 0);
        assert_eq!(buf.write_to(&mut sink, Some(&metrics)).unwrap(), 0);
        assert_eq!(metrics.io_count(), 0);
    }

    #[test]
    fn zero_natural_write_size_rejected() {
        let mut buf = BlockBuffer::new(system_pool(), 64).unwrap();
        buf.resize(10).unwrap();
        let mut sink = IoSink::with_natural_write_size(Vec::<u8>::new(), 0);
        assert!(matches!(
            buf.write_to(&mut sink, None),
            Err(BufferError::ZeroNaturalWriteSize)
        ));
        assert!(sink.get_ref().is_empty());
    }

    #[test]
    fn single_block_flush_skips_scratch() {
        // Pool sized for exactly one block: a scratch allocation would fail.
        let pool = Arc::new(BoundedPool::new(64));
        let mut buf = BlockBuffer::new(pool.clone(), 64).unwrap();
        buf.next_block().unwrap()[..3].copy_from_slice(b"abc");
        buf.resize(3).unwrap();
        let mut sink = IoSink::with_natural_write_size(Vec::<u8>::new(), 1024);
        assert_eq!(buf.write_to(&mut sink, None).unwrap(), 1);
        assert_eq!(sink.get_ref(), b"abc");
        assert_eq!(pool.failed_allocations(), 0);
    }

    #[test]
    fn scratch_allocation_failure_is_reported() {
        let pool = Arc::new(BoundedPool::new(128));
        let mut buf = BlockBuffer::new(pool, 64).unwrap();
        buf.resize(128).unwrap();
        let mut sink = IoSink::with_natural_write_size(Vec::<u8>::new(), 100);
        assert!(matches!(
            buf.write_to(&mut sink, None),
            Err(BufferError::ScratchAllocation { requested: 100 })
        ));
        assert!(sink.get_ref().is_empty());
    }

    #[test]
    fn chunk_size_is_clamped_to_ceiling() {
        let config = BufferConfig {
            max_chunk_size: 16,
            ..BufferConfig::new(64)
        };
        let mut buf = BlockBuffer::with_config(system_pool(), &config).unwrap();
        buf.resize(40).unwrap();
        let mut sink = IoSink::with_natural_write_size(Vec::<u8>::new(), u64::MAX);
        // 40 bytes through a 16-byte chunk: 16 + 16 + 8.
        assert_eq!(buf.write_to(&mut sink, None).unwrap(), 3);
        assert_eq!(sink.get_ref().len(), 40);
    }

    #[test]
    fn drop_releases_every_block() {
        let pool = system_pool();
        {
            let mut buf = BlockBuffer::new(pool.clone(), 64).unwrap();
            buf.reserve(300);
            buf.reserve(600);
            assert_eq!(pool.live_blocks(), 10);
        }
        assert_eq!(pool.live_blocks(), 0);
        assert_eq!(pool.allocated_bytes(), 0);
    }

    #[test]
    fn initial_blocks_reserved_from_config() {
        let config = BufferConfig {
            initial_blocks: 3,
            ..BufferConfig::new(32)
        };
        let buf = BlockBuffer::with_config(system_pool(), &config).unwrap();
        assert_eq!(buf.capacity(), 96);
        assert_eq!(buf.allocated_blocks(), 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn capacity_is_smallest_block_multiple(
                block_size in 1usize..256,
                acquisitions in 1usize..20,
            ) {
                let mut buf = BlockBuffer::new(system_pool(), block_size).unwrap();
                let mut acquired = 0;
                for _ in 0..acquisitions {
                    acquired += buf.next_block().unwrap().size();
                }
                prop_assert_eq!(buf.capacity(), acquired.div_ceil(block_size) * block_size);
                prop_assert_eq!(buf.capacity() % block_size, 0);
            }

            #[test]
            fn interior_blocks_are_full(
                block_size in 1usize..128,
                size in 0usize..4096,
            ) {
                let mut buf = BlockBuffer::new(system_pool(), block_size).unwrap();
                buf.resize(size).unwrap();
                let count = buf.block_count();
                prop_assert_eq!(count, size.div_ceil(block_size));
                for i in 0..count {
                    let expected = (size - i * block_size).min(block_size);
                    prop_assert_eq!(buf.block(i).unwrap().size(), expected);
                }
            }

            #[test]
            fn acquired_regions_are_contiguous(
                block_size in 1usize..64,
                start in 0usize..256,
                acquisitions in 1usize..10,
            ) {
                let mut buf = BlockBuffer::new(system_pool(), block_size).unwrap();
                buf.resize(start).unwrap();
                let mut expected_start = start;
                for _ in 0..acquisitions {
                    let before = buf.size();
                    prop_assert_eq!(before, expected_start);
                    let len = buf.next_block().unwrap().size();
                    prop_assert!(len > 0 && len <= block_size);
                    prop_assert_eq!(buf.size(), before + len);
                    prop_assert_eq!(buf.size() % block_size, 0);
                    expected_start += len;
                }
            }
        }
    }
}
