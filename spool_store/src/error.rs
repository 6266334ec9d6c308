//! Error type shared by spool buffers and their backends.

use std::io;

/// Errors raised by spool buffer operations.
#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    /// The backing stream failed to read, write or seek.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A value outside `0..=255` was passed where a byte was expected.
    #[error("Value {0} is not a byte (expected 0..=255)")]
    InvalidByte(i32),

    /// A mutating operation was attempted on a closed buffer.
    #[error("Buffer is closed")]
    Closed,
}
