//! Collaborator contracts for the colstage write-path staging layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! three seams a block buffer is wired to, plus the stock implementations
//! shipped with the workspace:
//!
//! - [`MemoryPool`]: fixed-size block supplier ([`SystemPool`], [`BoundedPool`]).
//! - [`OutputSink`]: byte destination with a preferred write granularity ([`IoSink`]).
//! - [`IoMetrics`]: accumulate-only I/O operation counter ([`WriterMetrics`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod metrics;
pub mod pool;
pub mod sink;

pub use error::SinkError;
pub use metrics::{IoMetrics, WriterMetrics};
pub use pool::{BoundedPool, MemoryPool, PoolBlock, SystemPool};
pub use sink::{IoSink, OutputSink};
