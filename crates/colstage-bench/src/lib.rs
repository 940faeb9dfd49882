//! Benchmark profiles for the colstage staging buffers.
//!
//! - [`narrow_column`]: a few hundred bytes, the single-block flush path
//! - [`wide_stripe`]: several megabytes across many blocks
//! - [`fill`]: write a payload through write-acquisition

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use colstage_block::{BlockBuffer, BufferError};
use colstage_core::{MemoryPool, SystemPool};

/// Block size used by the profiles: 64 KiB.
pub const PROFILE_BLOCK_SIZE: usize = 64 * 1024;

/// Payload resembling a narrow column: 300 bytes.
pub fn narrow_column() -> Vec<u8> {
    payload(300)
}

/// Payload resembling a wide stripe: 8 MiB.
pub fn wide_stripe() -> Vec<u8> {
    payload(8 * 1024 * 1024)
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Shared heap pool for benchmarks.
pub fn pool() -> Arc<dyn MemoryPool> {
    Arc::new(SystemPool::new())
}

/// Stage `data` in a fresh buffer, copying region by region.
pub fn fill(pool: &Arc<dyn MemoryPool>, data: &[u8]) -> Result<BlockBuffer, BufferError> {
    let mut buf = BlockBuffer::new(Arc::clone(pool), PROFILE_BLOCK_SIZE)?;
    let mut rest = data;
    while !rest.is_empty() {
        let mut region = buf.next_block()?;
        let n = region.size().min(rest.len());
        region[..n].copy_from_slice(&rest[..n]);
        rest = &rest[n..];
    }
    buf.resize(data.len())?;
    Ok(buf)
}
