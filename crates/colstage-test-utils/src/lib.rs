//! Test utilities and mock collaborators for colstage development.
//!
//! Provides mock implementations of the core contracts
//! ([`MemoryPool`], [`OutputSink`], [`PooledInput`]) that record or inject
//! behaviour, so tests can assert on allocation counts, write boundaries,
//! buffer releases, and failure paths.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use colstage_core::{MemoryPool, OutputSink, PoolBlock, SinkError, SystemPool};
use colstage_zerocopy::{BufferId, BufferPool, PooledInput, ReadOptions};

/// Pool that counts every allocate/release call.
///
/// Backed by a [`SystemPool`]. Lets tests check that each block is
/// released exactly once.
#[derive(Debug, Default)]
pub struct CountingPool {
    inner: SystemPool,
    allocations: AtomicUsize,
    releases: AtomicUsize,
}

impl CountingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Releases so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Allocations not yet released.
    pub fn outstanding(&self) -> usize {
        self.allocations() - self.releases()
    }

    /// Bytes currently held by callers.
    pub fn allocated_bytes(&self) -> usize {
        self.inner.allocated_bytes()
    }
}

impl MemoryPool for CountingPool {
    fn allocate(&self, size: usize) -> Option<PoolBlock> {
        let block = self.inner.allocate(size)?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Some(block)
    }

    fn release(&self, block: PoolBlock) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release(block);
    }
}

/// Pool that succeeds `budget` times, then refuses every request.
#[derive(Debug)]
pub struct FailAfterPool {
    inner: CountingPool,
    budget: usize,
    attempts: AtomicUsize,
}

impl FailAfterPool {
    pub fn new(budget: usize) -> Self {
        Self {
            inner: CountingPool::new(),
            budget,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Allocate calls observed, including refused ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn allocations(&self) -> usize {
        self.inner.allocations()
    }

    pub fn releases(&self) -> usize {
        self.inner.releases()
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }
}

impl MemoryPool for FailAfterPool {
    fn allocate(&self, size: usize) -> Option<PoolBlock> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.budget {
            return None;
        }
        self.inner.allocate(size)
    }

    fn release(&self, block: PoolBlock) {
        self.inner.release(block);
    }
}

/// Pool whose blocks are not the size asked for.
///
/// [`RoundingPool::new`] rounds every request up to the next power of
/// two, like a size-class allocator. [`RoundingPool::truncating`] hands
/// back half the requested size.
#[derive(Debug)]
pub struct RoundingPool {
    inner: CountingPool,
    round_up: bool,
}

impl RoundingPool {
    pub fn new() -> Self {
        Self {
            inner: CountingPool::new(),
            round_up: true,
        }
    }

    pub fn truncating() -> Self {
        Self {
            inner: CountingPool::new(),
            round_up: false,
        }
    }

    pub fn allocations(&self) -> usize {
        self.inner.allocations()
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }
}

impl Default for RoundingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool for RoundingPool {
    fn allocate(&self, size: usize) -> Option<PoolBlock> {
        let actual = if self.round_up {
            size.checked_next_power_of_two()?
        } else {
            size / 2
        };
        self.inner.allocate(actual)
    }

    fn release(&self, block: PoolBlock) {
        self.inner.release(block);
    }
}

/// Sink that records every write call separately.
#[derive(Debug)]
pub struct RecordingSink {
    natural_write_size: u64,
    writes: Vec<Vec<u8>>,
}

impl RecordingSink {
    pub fn new(natural_write_size: u64) -> Self {
        Self {
            natural_write_size,
            writes: Vec::new(),
        }
    }

    /// Each write call's payload, in order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Number of write calls.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// All received bytes concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Total bytes received.
    pub fn total_len(&self) -> usize {
        self.writes.iter().map(Vec::len).sum()
    }
}

impl OutputSink for RecordingSink {
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn natural_write_size(&self) -> u64 {
        self.natural_write_size
    }
}

/// Sink that accepts `ok_writes` calls, then fails every subsequent one.
#[derive(Debug)]
pub struct FailingSink {
    inner: RecordingSink,
    ok_writes: usize,
    failed: usize,
}

impl FailingSink {
    pub fn new(natural_write_size: u64, ok_writes: usize) -> Self {
        Self {
            inner: RecordingSink::new(natural_write_size),
            ok_writes,
            failed: 0,
        }
    }

    /// Writes accepted before the failure point.
    pub fn accepted(&self) -> &RecordingSink {
        &self.inner
    }

    /// Number of write calls that failed.
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl OutputSink for FailingSink {
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        if self.inner.write_count() >= self.ok_writes {
            self.failed += 1;
            return Err(SinkError::new(
                "write",
                io::Error::new(io::ErrorKind::BrokenPipe, "injected sink failure"),
            ));
        }
        self.inner.write(data)
    }

    fn natural_write_size(&self) -> u64 {
        self.inner.natural_write_size()
    }
}

/// Sink that records into a shared `Mutex<Vec<u8>>`.
///
/// Handy when the recorded bytes must be inspected from another thread.
#[derive(Debug)]
pub struct SharedSink<'a> {
    natural_write_size: u64,
    out: &'a Mutex<Vec<u8>>,
}

impl<'a> SharedSink<'a> {
    pub fn new(natural_write_size: u64, out: &'a Mutex<Vec<u8>>) -> Self {
        Self {
            natural_write_size,
            out,
        }
    }
}

impl OutputSink for SharedSink<'_> {
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        self.out
            .lock()
            .map_err(|_| SinkError::new("write", io::Error::other("poisoned")))?
            .extend_from_slice(data);
        Ok(())
    }

    fn natural_write_size(&self) -> u64 {
        self.natural_write_size
    }
}

/// [`BufferPool`] that counts how often the host stream drew from it.
#[derive(Debug, Default)]
pub struct CountingBufferPool {
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl CountingBufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl BufferPool for CountingBufferPool {
    fn get_buffer(&self, _direct: bool, len: usize) -> Vec<u8> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        vec![0; len]
    }

    fn put_buffer(&self, _buffer: Vec<u8>) {
        self.puts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Host stream over an in-memory byte source.
///
/// Serves consecutive slices of `data`, copying each into a buffer drawn
/// from the pool when one is supplied. Records every read option,
/// released buffer identity, and close call.
#[derive(Debug)]
pub struct MockInput {
    data: Vec<u8>,
    position: usize,
    /// Options seen by each read, in order.
    pub options: Vec<ReadOptions>,
    /// Identities of released buffers, in release order.
    pub released: Vec<BufferId>,
    /// Number of `close` calls.
    pub closes: usize,
    fail_reads: bool,
}

impl MockInput {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            options: Vec::new(),
            released: Vec::new(),
            closes: 0,
            fail_reads: false,
        }
    }

    /// A stream whose every read fails.
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::new(Vec::new())
        }
    }
}

impl PooledInput for MockInput {
    fn read_buffer(
        &mut self,
        pool: Option<&dyn BufferPool>,
        max_len: usize,
        options: ReadOptions,
    ) -> io::Result<Option<Arc<[u8]>>> {
        self.options.push(options);
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "injected read failure"));
        }
        if self.position >= self.data.len() {
            return Ok(None);
        }
        let end = self.data.len().min(self.position + max_len);
        let src = &self.data[self.position..end];
        self.position = end;
        let buffer: Arc<[u8]> = match pool {
            Some(pool) => {
                let mut staged = pool.get_buffer(false, src.len());
                staged[..src.len()].copy_from_slice(src);
                staged.truncate(src.len());
                Arc::from(staged)
            }
            None => Arc::from(src),
        };
        Ok(Some(buffer))
    }

    fn release_buffer(&mut self, buffer: Arc<[u8]>) {
        self.released.push(BufferId::of(&buffer));
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes += 1;
        Ok(())
    }
}

/// Deterministic byte pattern for payload checks.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}
