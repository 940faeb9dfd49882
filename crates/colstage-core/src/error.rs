//! Error type shared by output sinks.

use std::error::Error;
use std::fmt;
use std::io;

/// A failure reported by an [`OutputSink`](crate::OutputSink).
///
/// Sinks are usually backed by a file or socket, so the underlying cause
/// is an [`io::Error`]. The `operation` names what the sink was doing.
#[derive(Debug)]
pub struct SinkError {
    operation: &'static str,
    source: io::Error,
}

impl SinkError {
    /// Wrap an I/O error raised while performing `operation`.
    pub fn new(operation: &'static str, source: io::Error) -> Self {
        Self { operation, source }
    }

    /// Name of the sink operation that failed.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }

    /// Consume the error, returning the underlying I/O error.
    pub fn into_io(self) -> io::Error {
        self.source
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink {} failed: {}", self.operation, self.source)
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl From<io::Error> for SinkError {
    fn from(source: io::Error) -> Self {
        Self::new("write", source)
    }
}
