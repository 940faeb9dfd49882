//! Accumulate-only I/O counters shared across staging buffers.
//!
//! Several buffers (one per column) may flush concurrently on independent
//! threads while reporting into a single counter, so every update is an
//! atomic add.

use std::sync::atomic::{AtomicU64, Ordering};

/// Receiver for the number of physical I/O operations a flush issued.
pub trait IoMetrics: Send + Sync {
    /// Add `n` to the running I/O operation total.
    fn add_io_count(&self, n: u64);
}

/// Writer-level counters backed by atomics.
#[derive(Debug, Default)]
pub struct WriterMetrics {
    io_count: AtomicU64,
}

impl WriterMetrics {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total physical I/O operations recorded so far.
    pub fn io_count(&self) -> u64 {
        self.io_count.load(Ordering::Relaxed)
    }

    /// Reset the total to zero, returning the previous value.
    pub fn reset(&self) -> u64 {
        self.io_count.swap(0, Ordering::Relaxed)
    }
}

impl IoMetrics for WriterMetrics {
    fn add_io_count(&self, n: u64) {
        self.io_count.fetch_add(n, Ordering::Relaxed);
    }
}
