//! Memory pools that supply fixed-size blocks to staging buffers.
//!
//! A [`MemoryPool`] hands out owned [`PoolBlock`] handles and takes them
//! back through [`MemoryPool::release`]. Because release consumes the
//! handle, a block can never be returned twice.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// An owned, pool-allocated byte region.
///
/// The handle is opaque to the buffer that holds it: it is only read,
/// written, and eventually passed back to the pool that produced it.
pub struct PoolBlock {
    data: Box<[u8]>,
}

impl PoolBlock {
    /// Wrap backing storage produced by a pool implementation.
    pub fn new(data: Box<[u8]>) -> Self {
        Self { data }
    }

    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the region has zero length.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Shared view of the whole region.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view of the whole region.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Give up the handle, returning the backing storage.
    pub fn into_inner(self) -> Box<[u8]> {
        self.data
    }
}

impl fmt::Debug for PoolBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBlock").field("len", &self.data.len()).finish()
    }
}

/// Supplier of byte regions for block buffers and flush scratch space.
///
/// Implementations must be safe to share across threads: several buffers
/// (one per column) may draw from the same pool concurrently.
pub trait MemoryPool: Send + Sync {
    /// Allocate a region of exactly `size` bytes.
    ///
    /// Returns `None` when the pool cannot satisfy the request. Must not
    /// panic on exhaustion; callers treat `None` as the failure signal.
    fn allocate(&self, size: usize) -> Option<PoolBlock>;

    /// Return a region previously obtained from [`allocate`](Self::allocate).
    fn release(&self, block: PoolBlock);
}

/// Allocate a zeroed boxed slice, reporting exhaustion instead of aborting.
fn try_alloc_zeroed(size: usize) -> Option<Box<[u8]>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size).ok()?;
    data.resize(size, 0);
    Some(data.into_boxed_slice())
}

/// Heap-backed pool with live-allocation accounting.
///
/// Never refuses a request unless the global allocator itself cannot
/// reserve the memory.
#[derive(Debug, Default)]
pub struct SystemPool {
    allocated_bytes: AtomicUsize,
    live_blocks: AtomicUsize,
}

impl SystemPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently handed out and not yet released.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Number of regions currently handed out and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.load(Ordering::Relaxed)
    }
}

impl MemoryPool for SystemPool {
    fn allocate(&self, size: usize) -> Option<PoolBlock> {
        let data = try_alloc_zeroed(size)?;
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
        self.live_blocks.fetch_add(1, Ordering::Relaxed);
        Some(PoolBlock::new(data))
    }

    fn release(&self, block: PoolBlock) {
        self.allocated_bytes.fetch_sub(block.len(), Ordering::Relaxed);
        self.live_blocks.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Heap-backed pool that refuses to exceed a fixed byte budget.
///
/// Useful for capping the staging memory of a whole writer: once the
/// budget is spent, further allocations return `None` until regions are
/// released.
#[derive(Debug)]
pub struct BoundedPool {
    limit_bytes: usize,
    allocated_bytes: AtomicUsize,
    live_blocks: AtomicUsize,
    failed_allocations: AtomicU64,
}

impl BoundedPool {
    /// Create a pool that will never have more than `limit_bytes` outstanding.
    pub fn new(limit_bytes: usize) -> Self {
        Self {
            limit_bytes,
            allocated_bytes: AtomicUsize::new(0),
            live_blocks: AtomicUsize::new(0),
            failed_allocations: AtomicU64::new(0),
        }
    }

    /// The configured byte budget.
    pub fn limit_bytes(&self) -> usize {
        self.limit_bytes
    }

    /// Bytes currently handed out and not yet released.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Number of regions currently handed out and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.load(Ordering::Relaxed)
    }

    /// Number of requests refused so far.
    pub fn failed_allocations(&self) -> u64 {
        self.failed_allocations.load(Ordering::Relaxed)
    }

    fn refuse(&self, size: usize) -> Option<PoolBlock> {
        self.failed_allocations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            requested = size,
            allocated = self.allocated_bytes(),
            limit = self.limit_bytes,
            "bounded pool refused allocation"
        );
        None
    }
}

impl MemoryPool for BoundedPool {
    fn allocate(&self, size: usize) -> Option<PoolBlock> {
        let limit = self.limit_bytes;
        let reserved = self
            .allocated_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(size).filter(|&next| next <= limit)
            });
        if reserved.is_err() {
            return self.refuse(size);
        }
        match try_alloc_zeroed(size) {
            Some(data) => {
                self.live_blocks.fetch_add(1, Ordering::Relaxed);
                Some(PoolBlock::new(data))
            }
            None => {
                self.allocated_bytes.fetch_sub(size, Ordering::AcqRel);
                self.refuse(size)
            }
        }
    }

    fn release(&self, block: PoolBlock) {
        self.allocated_bytes.fetch_sub(block.len(), Ordering::AcqRel);
        self.live_blocks.fetch_sub(1, Ordering::Relaxed);
    }
}
