//! Zero-copy read buffers over pooled host input streams.
//!
//! [`ZeroCopyReader`] delegates reads to a [`PooledInput`] and keeps track
//! of every buffer the stream handed out, so they can all be returned with
//! one [`release_all_buffers`](ZeroCopyReader::release_all_buffers) call
//! (also performed on close and on drop).
//!
//! Buffers are tracked by identity (the address of their allocation),
//! never by content: comparing buffer contents would cost a full scan.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod input;
pub mod reader;

pub use error::ZeroCopyError;
pub use input::{BufferPool, PooledInput, ReadOptions};
pub use reader::{BufferId, ZeroCopyReader};
