//! colstage: in-memory staging buffers for columnar file write paths.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all colstage sub-crates. For most users, adding `colstage` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use colstage::prelude::*;
//!
//! let pool: Arc<dyn MemoryPool> = Arc::new(SystemPool::new());
//! let mut buffer = BlockBuffer::new(pool, 64).unwrap();
//!
//! // Fill acquired regions in place.
//! for _ in 0..3 {
//!     buffer.next_block().unwrap().fill(0xAB);
//! }
//!
//! let metrics = WriterMetrics::new();
//! let mut sink = IoSink::with_natural_write_size(Vec::<u8>::new(), 100);
//! let io = buffer.write_to(&mut sink, Some(&metrics)).unwrap();
//! assert_eq!(io, 2);
//! assert_eq!(metrics.io_count(), 2);
//! assert_eq!(sink.into_inner().len(), 192);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `colstage-core` | Pool, sink, and metrics contracts with stock implementations |
//! | [`block`] | `colstage-block` | `BlockBuffer`, views, config, `BlockWriter` |
//! | [`zerocopy`] | `colstage-zerocopy` | Read-side zero-copy buffer tracking |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Pool, sink, and metrics contracts (`colstage-core`).
pub use colstage_core as types;

/// The block buffer and its views (`colstage-block`).
pub use colstage_block as block;

/// Zero-copy read buffer tracking (`colstage-zerocopy`).
pub use colstage_zerocopy as zerocopy;

/// Common imports for staging and flushing.
pub mod prelude {
    pub use colstage_block::{Block, BlockBuffer, BlockMut, BlockWriter, BufferConfig, BufferError};
    pub use colstage_core::{
        BoundedPool, IoMetrics, IoSink, MemoryPool, OutputSink, SinkError, SystemPool,
        WriterMetrics,
    };
    pub use colstage_zerocopy::{PooledInput, ZeroCopyReader};
}
