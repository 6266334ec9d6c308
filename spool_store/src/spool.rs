//! Growable byte stream with positional reads and writes.

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::backend::{Backend, MemoryBackend, SpillBackend, StorageKind};
use crate::error::SpoolError;

/// A growable stream of bytes with positional access.
///
/// Plain writes append at the current end of the stream. Reads and single
/// byte accesses address the stream by offset and leave no cursor state
/// behind, so calls can be freely interleaved.
///
/// [`close`](Self::close) releases the backing storage and is idempotent.
/// After close, read-style operations report an empty stream and
/// write-style operations fail with [`SpoolError::Closed`]. Dropping an
/// open buffer closes it.
///
/// # Example
///
/// ```
/// use spool_store::{SpoolBuffer, StorageKind};
///
/// let mut buffer = SpoolBuffer::open(StorageKind::Memory).unwrap();
/// buffer.write(b"abc").unwrap();
/// assert_eq!(buffer.read(2, 1).unwrap(), b"bc".to_vec());
/// assert_eq!(buffer.len().unwrap(), 3);
/// buffer.close().unwrap();
/// ```
pub struct SpoolBuffer {
    stream: Option<Box<dyn Backend>>,
    kind: StorageKind,
}

impl SpoolBuffer {
    /// Opens an empty buffer on the given storage kind.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backing storage cannot be set up.
    pub fn open(kind: StorageKind) -> Result<Self, SpoolError> {
        let stream: Box<dyn Backend> = match kind {
            StorageKind::Memory => Box::new(MemoryBackend::new(Vec::new())),
            StorageKind::Spill => Box::new(SpillBackend::new()),
        };
        Ok(Self {
            stream: Some(stream),
            kind,
        })
    }

    /// Wraps an externally constructed backend.
    ///
    /// Lets tests shrink spill thresholds or inject failing streams.
    /// `kind` is what [`kind`](Self::kind) will report.
    #[must_use]
    pub fn with_backend(kind: StorageKind, backend: Box<dyn Backend>) -> Self {
        Self {
            stream: Some(backend),
            kind,
        }
    }

    /// Appends `data` at the end of the stream and returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Closed`] after [`close`](Self::close), or
    /// [`SpoolError::Io`] if the backend fails.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, SpoolError> {
        let stream = self.stream.as_mut().ok_or(SpoolError::Closed)?;
        stream.seek(SeekFrom::End(0))?;
        stream.write_all(data)?;
        Ok(data.len())
    }

    /// Appends a slice of numeric byte values at the end of the stream.
    ///
    /// Every value must lie in `0..=255`. The whole slice is validated
    /// before anything is written, so a rejected call leaves the stream
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::InvalidByte`] for the first out-of-range
    /// value, [`SpoolError::Closed`] after close, or [`SpoolError::Io`]
    /// if the backend fails.
    pub fn write_values(&mut self, values: &[i32]) -> Result<usize, SpoolError> {
        if self.stream.is_none() {
            return Err(SpoolError::Closed);
        }
        let mut bytes = Vec::with_capacity(values.len());
        for &value in values {
            let byte = u8::try_from(value).map_err(|_| SpoolError::InvalidByte(value))?;
            bytes.push(byte);
        }
        self.write(&bytes)
    }

    /// Reads up to `len` bytes starting at `offset`.
    ///
    /// A `len` of zero means "from `offset` to the end of the stream".
    /// An `offset` at or past the end yields an empty vector, as does any
    /// read on a closed buffer. A `len` reaching past the end is clamped
    /// to the bytes that exist.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backend fails.
    pub fn read(&mut self, len: usize, offset: u64) -> Result<Vec<u8>, SpoolError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(Vec::new());
        };
        let restore = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        if offset >= end {
            stream.seek(SeekFrom::Start(restore))?;
            return Ok(Vec::new());
        }
        #[allow(clippy::cast_possible_truncation)]
        let available = (end - offset) as usize;
        let want = if len == 0 { available } else { len.min(available) };
        stream.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; want];
        stream.read_exact(&mut data)?;
        stream.seek(SeekFrom::Start(restore))?;
        Ok(data)
    }

    /// Reads up to `len` bytes starting at `offset`, widened to numeric
    /// values. Same conventions as [`read`](Self::read).
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backend fails.
    pub fn read_values(&mut self, len: usize, offset: u64) -> Result<Vec<i32>, SpoolError> {
        Ok(self.read(len, offset)?.into_iter().map(i32::from).collect())
    }

    /// Returns the byte at `offset`, or `None` if the offset is at or past
    /// the end of the stream or the buffer is closed.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backend fails.
    pub fn byte_at(&mut self, offset: u64) -> Result<Option<u8>, SpoolError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let restore = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        if offset >= end {
            stream.seek(SeekFrom::Start(restore))?;
            return Ok(None);
        }
        stream.seek(SeekFrom::Start(offset))?;
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte)?;
        stream.seek(SeekFrom::Start(restore))?;
        Ok(Some(byte[0]))
    }

    /// Writes a single byte value at `offset`.
    ///
    /// Writing past the current end grows the stream and zero-fills the
    /// gap.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::InvalidByte`] if `value` is outside
    /// `0..=255`, [`SpoolError::Closed`] after close, or
    /// [`SpoolError::Io`] if the backend fails.
    pub fn set_byte_at(&mut self, offset: u64, value: i32) -> Result<(), SpoolError> {
        let stream = self.stream.as_mut().ok_or(SpoolError::Closed)?;
        let byte = u8::try_from(value).map_err(|_| SpoolError::InvalidByte(value))?;
        stream.seek(SeekFrom::Start(offset))?;
        stream.write_all(&[byte])?;
        Ok(())
    }

    /// Total number of bytes in the stream. Zero after close.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backend fails.
    pub fn len(&mut self) -> Result<u64, SpoolError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        let restore = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(restore))?;
        Ok(end)
    }

    /// True if the stream holds no bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backend fails.
    pub fn is_empty(&mut self) -> Result<bool, SpoolError> {
        Ok(self.len()? == 0)
    }

    /// Releases the backing storage.
    ///
    /// A spill backend removes its temporary file here. Can be called
    /// multiple times; redundant calls log a warning and succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backend fails while shutting
    /// down.
    pub fn close(&mut self) -> Result<(), SpoolError> {
        if self.stream.take().is_none() {
            log::warn!("close() called on already closed buffer: {self:?}");
        }
        Ok(())
    }

    /// True once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Storage kind the buffer was opened with.
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        self.kind
    }
}

impl Drop for SpoolBuffer {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}

impl fmt::Debug for SpoolBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpoolBuffer")
            .field("kind", &self.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}
