//! Storage backends for spool buffers.
//!
//! A backend is any seekable byte stream. Two concrete backends ship with
//! the crate:
//!
//! - [`MemoryBackend`]: the stream lives in RAM for its whole lifetime
//! - [`SpillBackend`]: the stream starts in RAM and moves to a temporary
//!   file once it grows past a threshold
//!
//! The two are interchangeable from the buffer's point of view. Picking one
//! is a resource trade-off, not a behavior change.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Which storage medium backs a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Content stays in RAM.
    Memory,
    /// Content stays in RAM until it grows past [`DEFAULT_SPILL_THRESHOLD`],
    /// then moves to a temporary file.
    Spill,
}

/// Seekable byte stream a [`SpoolBuffer`](crate::SpoolBuffer) can run on.
///
/// Blanket-implemented for anything that reads, writes and seeks, so tests
/// can substitute failing or instrumented streams.
pub trait Backend: Read + Write + Seek + Send + fmt::Debug {}

impl<T: Read + Write + Seek + Send + fmt::Debug> Backend for T {}

/// In-memory backend: a growable byte vector behind a cursor.
///
/// Writes past the current end zero-fill the gap, per the [`Cursor`]
/// contract.
pub type MemoryBackend = Cursor<Vec<u8>>;

/// Bytes a [`SpillBackend`] keeps in RAM before moving to disk.
pub const DEFAULT_SPILL_THRESHOLD: usize = 64 * 1024;

static SPILL_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_spill_path() -> PathBuf {
    let seq = SPILL_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("spool-{}-{seq}.tmp", std::process::id()))
}

enum SpillState {
    Memory(Cursor<Vec<u8>>),
    File { file: File, path: PathBuf },
}

/// Spill-to-disk backend.
///
/// Starts out as an in-memory cursor. The first write that would grow the
/// content past the threshold first migrates everything written so far to a
/// temporary file, preserving the stream position, then lands in that file.
/// Reads, writes and seeks behave identically on both sides of the
/// migration.
///
/// The temporary file, if one was created, is removed when the backend is
/// dropped. The file is created lazily, so a fault in the temp directory
/// surfaces on the write that crosses the threshold, not on construction.
pub struct SpillBackend {
    state: SpillState,
    threshold: u64,
}

impl SpillBackend {
    /// Creates a backend that spills past [`DEFAULT_SPILL_THRESHOLD`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_SPILL_THRESHOLD)
    }

    /// Creates a backend that spills once the content grows past
    /// `threshold` bytes.
    #[must_use]
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            state: SpillState::Memory(Cursor::new(Vec::new())),
            threshold: threshold as u64,
        }
    }

    /// Returns true once the content has moved to a temporary file.
    #[must_use]
    pub fn is_spilled(&self) -> bool {
        matches!(self.state, SpillState::File { .. })
    }

    /// Path of the temporary file, if the backend has spilled.
    #[must_use]
    pub fn spill_path(&self) -> Option<&Path> {
        match &self.state {
            SpillState::Memory(_) => None,
            SpillState::File { path, .. } => Some(path),
        }
    }

    fn migrate_to_file(&mut self) -> io::Result<()> {
        let SpillState::Memory(cursor) = &self.state else {
            return Ok(());
        };
        let pos = cursor.position();
        let len = cursor.get_ref().len();
        let path = next_spill_path();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        if let Err(err) = copy_and_position(&mut file, cursor.get_ref(), pos) {
            // A failed migration leaves the memory state untouched.
            let _ = fs::remove_file(&path);
            return Err(err);
        }
        log::debug!("spilled {len} buffered bytes to {}", path.display());
        self.state = SpillState::File { file, path };
        Ok(())
    }
}

fn copy_and_position(file: &mut File, content: &[u8], pos: u64) -> io::Result<()> {
    file.write_all(content)?;
    file.seek(SeekFrom::Start(pos))?;
    Ok(())
}

impl Default for SpillBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for SpillBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            SpillState::Memory(cursor) => cursor.read(buf),
            SpillState::File { file, .. } => file.read(buf),
        }
    }
}

impl Write for SpillBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let SpillState::Memory(cursor) = &self.state {
            let projected = cursor
                .position()
                .saturating_add(buf.len() as u64)
                .max(cursor.get_ref().len() as u64);
            if projected > self.threshold {
                self.migrate_to_file()?;
            }
        }
        match &mut self.state {
            SpillState::Memory(cursor) => cursor.write(buf),
            SpillState::File { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            SpillState::Memory(_) => Ok(()),
            SpillState::File { file, .. } => file.flush(),
        }
    }
}

impl Seek for SpillBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.state {
            SpillState::Memory(cursor) => cursor.seek(pos),
            SpillState::File { file, .. } => file.seek(pos),
        }
    }
}

impl Drop for SpillBackend {
    fn drop(&mut self) {
        if let SpillState::File { path, .. } = &self.state {
            if let Err(err) = fs::remove_file(path) {
                log::warn!("failed to remove spill file {}: {err}", path.display());
            }
        }
    }
}

impl fmt::Debug for SpillBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpillBackend")
            .field("spilled", &self.is_spilled())
            .field("threshold", &self.threshold)
            .finish()
    }
}
