//! Byte-stream producer on top of write-acquisition.
//!
//! [`BlockWriter`] copies caller bytes into regions obtained from
//! [`BlockBuffer::next_block`] and backs up over whatever part of the last
//! region it did not fill, so the buffer's used size tracks exactly the
//! bytes written.

use std::io;

use crate::buffer::BlockBuffer;
use crate::error::BufferError;

/// [`std::io::Write`] adapter that stages bytes in a [`BlockBuffer`].
#[derive(Debug)]
pub struct BlockWriter<'a> {
    buffer: &'a mut BlockBuffer,
}

impl<'a> BlockWriter<'a> {
    /// Wrap `buffer`; writes append after its current used size.
    pub fn new(buffer: &'a mut BlockBuffer) -> Self {
        Self { buffer }
    }

    /// Return the last `count` bytes to the buffer.
    pub fn back_up(&mut self, count: usize) -> Result<(), BufferError> {
        let size = self.buffer.size();
        if count > size {
            return Err(BufferError::BackUpOutOfRange { count, size });
        }
        self.buffer.resize(size - count)
    }

    /// Bytes staged in the underlying buffer.
    pub fn size(&self) -> usize {
        self.buffer.size()
    }

    /// Release the borrow on the buffer.
    pub fn into_inner(self) -> &'a mut BlockBuffer {
        self.buffer
    }

    fn put(&mut self, src: &[u8]) -> Result<usize, BufferError> {
        let mut region = self.buffer.next_block()?;
        let n = region.len().min(src.len());
        region[..n].copy_from_slice(&src[..n]);
        let unused = region.len() - n;
        if unused > 0 {
            self.back_up(unused)?;
        }
        Ok(n)
    }
}

impl io::Write for BlockWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.put(&buf[written..]) {
                Ok(n) => written += n,
                // Report the bytes already staged; the error resurfaces on the next call.
                Err(_) if written > 0 => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstage_core::{BoundedPool, SystemPool};
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn size_tracks_bytes_written() {
        let mut buf = BlockBuffer::new(Arc::new(SystemPool::new()), 8).unwrap();
        let mut w = BlockWriter::new(&mut buf);
        w.write_all(b"abc").unwrap();
        assert_eq!(w.size(), 3);
        w.write_all(b"defghijklm").unwrap();
        assert_eq!(w.size(), 13);
        assert_eq!(buf.to_vec(), b"abcdefghijklm");
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn back_up_rejects_more_than_size() {
        let mut buf = BlockBuffer::new(Arc::new(SystemPool::new()), 8).unwrap();
        let mut w = BlockWriter::new(&mut buf);
        w.write_all(b"xy").unwrap();
        assert!(matches!(
            w.back_up(3),
            Err(BufferError::BackUpOutOfRange { count: 3, size: 2 })
        ));
        w.back_up(1).unwrap();
        assert_eq!(w.into_inner().to_vec(), b"x");
    }

    #[test]
    fn empty_write_is_a_no_op() {
        let mut buf = BlockBuffer::new(Arc::new(SystemPool::new()), 8).unwrap();
        let mut w = BlockWriter::new(&mut buf);
        assert_eq!(w.write(&[]).unwrap(), 0);
        assert_eq!(buf.size(), 0);
    }

    #[test]
    fn exhaustion_reports_partial_then_out_of_memory() {
        let mut buf = BlockBuffer::new(Arc::new(BoundedPool::new(8)), 8).unwrap();
        let mut w = BlockWriter::new(&mut buf);
        assert_eq!(w.write(&[1u8; 12]).unwrap(), 8);
        let err = w.write(&[1u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
        assert_eq!(buf.size(), 8);
    }
}
