//! Tracking adapter over a [`PooledInput`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ZeroCopyError;
use crate::input::{BufferPool, PooledInput, ReadOptions};

/// Identity of a buffer handed out by the host stream.
///
/// Derived from the address of the buffer's allocation. Stable for as
/// long as the reader keeps the buffer tracked, since tracking holds a
/// reference that keeps the allocation alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(usize);

impl BufferId {
    /// Identity of `buffer`.
    pub fn of(buffer: &Arc<[u8]>) -> Self {
        Self(Arc::as_ptr(buffer).cast::<u8>() as usize)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Reads buffers from a host stream and remembers them until released.
///
/// Every buffer returned by [`read_buffer`](Self::read_buffer) stays
/// tracked until [`release_all_buffers`](Self::release_all_buffers),
/// [`close`](Self::close), or drop hands it back to the stream.
pub struct ZeroCopyReader<I: PooledInput> {
    input: I,
    pool: Option<Arc<dyn BufferPool>>,
    /// Outstanding buffers in hand-out order.
    outstanding: IndexMap<BufferId, Arc<[u8]>>,
}

impl<I: PooledInput> ZeroCopyReader<I> {
    /// Wrap `input`, passing `pool` to every read when present.
    pub fn new(input: I, pool: Option<Arc<dyn BufferPool>>) -> Self {
        Self {
            input,
            pool,
            outstanding: IndexMap::new(),
        }
    }

    /// Read up to `max_len` bytes as a buffer owned by the host stream.
    ///
    /// Returns `Ok(None)` at end of stream. With `verify_checksums` off,
    /// the stream is asked to skip checksum verification.
    pub fn read_buffer(
        &mut self,
        max_len: usize,
        verify_checksums: bool,
    ) -> Result<Option<Arc<[u8]>>, ZeroCopyError> {
        let options = ReadOptions::verify(verify_checksums);
        let buffer = self
            .input
            .read_buffer(self.pool.as_deref(), max_len, options)
            .map_err(ZeroCopyError::Read)?;
        if let Some(buffer) = &buffer {
            self.outstanding
                .insert(BufferId::of(buffer), Arc::clone(buffer));
        }
        Ok(buffer)
    }

    /// Release a single buffer back to the stream.
    ///
    /// The buffer is also dropped from tracking so a later bulk release
    /// does not hand it back a second time.
    #[deprecated(note = "use `release_all_buffers` instead")]
    pub fn release_buffer(&mut self, buffer: Arc<[u8]>) {
        self.outstanding.shift_remove(&BufferId::of(&buffer));
        self.input.release_buffer(buffer);
    }

    /// Release every outstanding buffer back to the stream.
    ///
    /// Returns how many buffers were released.
    pub fn release_all_buffers(&mut self) -> usize {
        let released = self.outstanding.len();
        for (_, buffer) in self.outstanding.drain(..) {
            self.input.release_buffer(buffer);
        }
        if released > 0 {
            tracing::debug!(released, "released zero-copy read buffers");
        }
        released
    }

    /// Number of buffers handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Whether `buffer` is currently tracked.
    pub fn is_outstanding(&self, buffer: &Arc<[u8]>) -> bool {
        self.outstanding.contains_key(&BufferId::of(buffer))
    }

    /// Borrow the host stream.
    pub fn get_ref(&self) -> &I {
        &self.input
    }

    /// Release all outstanding buffers, then close the host stream.
    pub fn close(mut self) -> Result<(), ZeroCopyError> {
        self.release_all_buffers();
        self.input.close().map_err(ZeroCopyError::Close)
    }
}

impl<I: PooledInput> Drop for ZeroCopyReader<I> {
    fn drop(&mut self) {
        self.release_all_buffers();
    }
}

impl<I: PooledInput> fmt::Debug for ZeroCopyReader<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroCopyReader")
            .field("pooled", &self.pool.is_some())
            .field("outstanding", &self.outstanding.len())
            .finish()
    }
}
