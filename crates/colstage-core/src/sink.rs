//! Output sinks that receive flushed staging bytes.

use std::io::Write;

use crate::error::SinkError;

/// A destination for staged bytes (file, network stream, or similar).
///
/// The sink advertises a preferred I/O granularity through
/// [`natural_write_size`](Self::natural_write_size); flush routines batch
/// their writes to that size to minimise the number of physical writes.
pub trait OutputSink {
    /// Write all of `data` to the sink.
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError>;

    /// Preferred write granularity in bytes.
    ///
    /// A hint only. Zero is invalid and is rejected by flush routines.
    fn natural_write_size(&self) -> u64;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        (**self).write(data)
    }

    fn natural_write_size(&self) -> u64 {
        (**self).natural_write_size()
    }
}

/// Adapts any [`std::io::Write`] into an [`OutputSink`].
///
/// Each [`OutputSink::write`] maps to a single `write_all` on the inner
/// writer, so one flushed chunk is one physical write.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
    natural_write_size: u64,
}

impl<W: Write> IoSink<W> {
    /// Default granularity: 128 KiB, a common file-system write size.
    pub const DEFAULT_NATURAL_WRITE_SIZE: u64 = 128 * 1024;

    /// Wrap `inner` with the default natural write size.
    pub fn new(inner: W) -> Self {
        Self::with_natural_write_size(inner, Self::DEFAULT_NATURAL_WRITE_SIZE)
    }

    /// Wrap `inner` with an explicit natural write size.
    pub fn with_natural_write_size(inner: W, natural_write_size: u64) -> Self {
        Self {
            inner,
            natural_write_size,
        }
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush the wrapped writer.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush().map_err(|e| SinkError::new("flush", e))
    }

    /// Unwrap the sink, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputSink for IoSink<W> {
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        self.inner
            .write_all(data)
            .map_err(|e| SinkError::new("write", e))
    }

    fn natural_write_size(&self) -> u64 {
        self.natural_write_size
    }
}
