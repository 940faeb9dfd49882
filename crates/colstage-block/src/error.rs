//! Block buffer error types.

use std::error::Error;
use std::fmt;
use std::io;

use colstage_core::SinkError;

/// Errors that can occur during block buffer operations.
#[derive(Debug)]
pub enum BufferError {
    /// A buffer was configured with a block size of zero.
    ZeroBlockSize,
    /// A configuration value other than the block size is invalid.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
    /// The pool could not supply enough blocks to reach a logical size.
    InsufficientCapacity {
        /// Logical size that was requested, in bytes.
        requested: usize,
        /// Capacity actually achieved, in bytes.
        achieved: usize,
    },
    /// Growing the used size by another block would overflow `usize`.
    CapacityOverflow {
        /// Used size at the time, in bytes.
        size: usize,
        /// Bytes the buffer tried to grow by.
        additional: usize,
    },
    /// A block index at or beyond the number of logical blocks.
    BlockOutOfRange {
        /// The requested block index.
        index: usize,
        /// Number of blocks currently holding data.
        block_count: usize,
    },
    /// The sink reported a natural write size of zero.
    ZeroNaturalWriteSize,
    /// The pool could not supply the scratch chunk needed by a flush.
    ScratchAllocation {
        /// Size of the chunk that was requested, in bytes.
        requested: usize,
    },
    /// More bytes were backed up than the buffer holds.
    BackUpOutOfRange {
        /// Number of bytes asked to be returned.
        count: usize,
        /// Logical size of the buffer at the time.
        size: usize,
    },
    /// The sink failed while receiving flushed bytes.
    Sink(SinkError),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockSize => write!(f, "block size cannot be zero"),
            Self::InvalidConfig { reason } => write!(f, "invalid buffer config: {reason}"),
            Self::InsufficientCapacity {
                requested,
                achieved,
            } => {
                write!(
                    f,
                    "insufficient capacity achieved: requested {requested} bytes, capacity {achieved} bytes"
                )
            }
            Self::CapacityOverflow { size, additional } => {
                write!(
                    f,
                    "buffer of {size} bytes cannot grow by {additional} bytes without overflow"
                )
            }
            Self::BlockOutOfRange { index, block_count } => {
                write!(f, "block index {index} out of range ({block_count} blocks)")
            }
            Self::ZeroNaturalWriteSize => write!(f, "natural write size cannot be zero"),
            Self::ScratchAllocation { requested } => {
                write!(f, "could not allocate {requested}-byte flush scratch chunk")
            }
            Self::BackUpOutOfRange { count, size } => {
                write!(f, "cannot back up {count} bytes from a {size}-byte buffer")
            }
            Self::Sink(e) => write!(f, "flush: {e}"),
        }
    }
}

impl Error for BufferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sink(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SinkError> for BufferError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

impl From<BufferError> for io::Error {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Sink(sink) => sink.into_io(),
            BufferError::InsufficientCapacity { .. }
            | BufferError::CapacityOverflow { .. }
            | BufferError::ScratchAllocation { .. } => {
                io::Error::new(io::ErrorKind::OutOfMemory, e)
            }
            BufferError::BlockOutOfRange { .. } | BufferError::BackUpOutOfRange { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            BufferError::ZeroBlockSize
            | BufferError::InvalidConfig { .. }
            | BufferError::ZeroNaturalWriteSize => io::Error::other(e),
        }
    }
}
