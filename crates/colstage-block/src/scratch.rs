//! Pool-backed staging space for coalescing blocks into sink-sized writes.
//!
//! [`ScratchChunk`] is a bump-filled byte region borrowed from a
//! [`MemoryPool`] for the duration of one flush. Dropping it returns the
//! region to the pool, so the chunk is released on every exit path,
//! including an early return from a failed sink write.

use colstage_core::{MemoryPool, PoolBlock};

/// A scoped, fixed-size staging region.
pub struct ScratchChunk<'p> {
    pool: &'p dyn MemoryPool,
    /// Always `Some` until `drop` hands it back.
    block: Option<PoolBlock>,
    /// Requested size; the pool may hand back more.
    size: usize,
    /// Number of bytes filled so far.
    cursor: usize,
}

impl<'p> ScratchChunk<'p> {
    /// Borrow a `size`-byte region from `pool`.
    ///
    /// Returns `None` if the pool cannot supply it. A block shorter than
    /// `size` is handed straight back and counts as a refusal.
    pub fn acquire(pool: &'p dyn MemoryPool, size: usize) -> Option<Self> {
        let block = pool.allocate(size)?;
        if block.len() < size {
            pool.release(block);
            return None;
        }
        Some(Self {
            pool,
            block: Some(block),
            size,
            cursor: 0,
        })
    }

    /// Copy as much of `src` as fits into the unfilled tail.
    ///
    /// Returns the number of bytes copied.
    pub fn fill(&mut self, src: &[u8]) -> usize {
        let Some(block) = self.block.as_mut() else {
            return 0;
        };
        let dst = &mut block.as_mut_slice()[self.cursor..self.size];
        let n = dst.len().min(src.len());
        dst[..n].copy_from_slice(&src[..n]);
        self.cursor += n;
        n
    }

    /// Whether the chunk is filled to capacity.
    pub fn is_full(&self) -> bool {
        self.cursor == self.capacity()
    }

    /// Whether nothing has been filled since the last reset.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// The filled prefix of the chunk.
    pub fn filled(&self) -> &[u8] {
        match &self.block {
            Some(block) => &block.as_slice()[..self.cursor],
            None => &[],
        }
    }

    /// Reset the fill cursor without touching the backing memory.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Usable size of the chunk in bytes.
    pub fn capacity(&self) -> usize {
        if self.block.is_some() {
            self.size
        } else {
            0
        }
    }
}

impl Drop for ScratchChunk<'_> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.release(block);
        }
    }
}
