//! Zero-copy reader error types.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors surfaced by [`ZeroCopyReader`](crate::ZeroCopyReader).
#[derive(Debug)]
pub enum ZeroCopyError {
    /// The host stream failed to produce a buffer.
    Read(io::Error),
    /// The host stream failed to close.
    Close(io::Error),
}

impl fmt::Display for ZeroCopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "zero-copy read failed: {e}"),
            Self::Close(e) => write!(f, "closing input failed: {e}"),
        }
    }
}

impl Error for ZeroCopyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(e) | Self::Close(e) => Some(e),
        }
    }
}

impl From<ZeroCopyError> for io::Error {
    fn from(e: ZeroCopyError) -> Self {
        match e {
            ZeroCopyError::Read(e) | ZeroCopyError::Close(e) => e,
        }
    }
}
