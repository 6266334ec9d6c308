//! Byte spool storage: a growable positional byte stream over pluggable
//! backends.
//!
//! [`SpoolBuffer`] is the entry point. It appends on [`write`](SpoolBuffer::write)
//! and addresses bytes by offset on reads, on top of any [`Backend`]. Two
//! backends are provided: [`MemoryBackend`] keeps everything in RAM,
//! [`SpillBackend`] moves to a temporary file once the content grows past a
//! threshold.

pub mod backend;
pub mod error;
pub mod spool;

// Re-export buffer type for convenience
pub use spool::SpoolBuffer;

// Re-export backend types for convenience
pub use backend::{Backend, DEFAULT_SPILL_THRESHOLD, MemoryBackend, SpillBackend, StorageKind};

// Re-export error type for convenience
pub use error::SpoolError;
