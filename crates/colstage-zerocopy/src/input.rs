//! Contracts of the host stream and its optional buffer pool.

use std::io;
use std::sync::Arc;

/// Pool the host stream may draw read buffers from.
pub trait BufferPool: Send + Sync {
    /// Obtain a buffer of at least `len` bytes.
    ///
    /// `direct` asks for memory suitable for direct (unbuffered) I/O.
    fn get_buffer(&self, direct: bool, len: usize) -> Vec<u8>;

    /// Give a buffer back to the pool.
    fn put_buffer(&self, buffer: Vec<u8>);
}

/// Per-read options passed through to the host stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Skip checksum verification for this read.
    pub skip_checksums: bool,
}

impl ReadOptions {
    /// Options that keep checksum verification on.
    pub const VERIFY: Self = Self {
        skip_checksums: false,
    };

    /// Options that skip checksum verification.
    pub const SKIP_CHECKSUMS: Self = Self {
        skip_checksums: true,
    };

    /// Options for a read that does or does not verify checksums.
    pub fn verify(verify_checksums: bool) -> Self {
        if verify_checksums {
            Self::VERIFY
        } else {
            Self::SKIP_CHECKSUMS
        }
    }
}

/// A host input stream able to hand out buffers without copying.
pub trait PooledInput {
    /// Read up to `max_len` bytes into a buffer owned by the stream.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn read_buffer(
        &mut self,
        pool: Option<&dyn BufferPool>,
        max_len: usize,
        options: ReadOptions,
    ) -> io::Result<Option<Arc<[u8]>>>;

    /// Return a buffer previously produced by [`read_buffer`](Self::read_buffer).
    fn release_buffer(&mut self, buffer: Arc<[u8]>);

    /// Close the stream.
    fn close(&mut self) -> io::Result<()>;
}

impl<I: PooledInput + ?Sized> PooledInput for &mut I {
    fn read_buffer(
        &mut self,
        pool: Option<&dyn BufferPool>,
        max_len: usize,
        options: ReadOptions,
    ) -> io::Result<Option<Arc<[u8]>>> {
        (**self).read_buffer(pool, max_len, options)
    }

    fn release_buffer(&mut self, buffer: Arc<[u8]>) {
        (**self).release_buffer(buffer);
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_maps_to_checksum_flag() {
        assert!(!ReadOptions::verify(true).skip_checksums);
        assert!(ReadOptions::verify(false).skip_checksums);
        assert_eq!(ReadOptions::default(), ReadOptions::VERIFY);
    }
}
