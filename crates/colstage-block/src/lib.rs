//! Block-chunked staging buffers for a columnar write path.
//!
//! A [`BlockBuffer`] accumulates serialized column or stripe bytes before
//! they are flushed to an [`OutputSink`](colstage_core::OutputSink). The
//! final size need not be known up front and producers write straight
//! into buffer-owned memory.
//!
//! # Architecture
//!
//! ```text
//! BlockBuffer
//! ├── Arc<dyn MemoryPool>   (supplies blocks and the flush scratch chunk)
//! ├── PoolBlock[]           (block_size bytes each, insertion order = logical order)
//! ├── used / capacity       (capacity = blocks × block_size, never shrinks)
//! └── write_to()            (single direct write, or coalesce through ScratchChunk)
//! ```
//!
//! # Acquire-and-commit
//!
//! [`BlockBuffer::next_block`] hands out the whole free tail of the
//! current block and advances the used size to the next block boundary.
//! Producers that write less than the region give the slack back with
//! [`BlockBuffer::resize`], which is what [`BlockWriter`] does.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod scratch;
pub mod view;
pub mod writer;

pub use buffer::BlockBuffer;
pub use config::BufferConfig;
pub use error::BufferError;
pub use scratch::ScratchChunk;
pub use view::{Block, BlockMut};
pub use writer::BlockWriter;
