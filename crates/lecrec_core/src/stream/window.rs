//! Random-access windowed stream over one section of a shared backend.

use crate::container::SectionRegion;
use crate::error::{RecordingError, RecordingResult};
use lecrec_storage::{InMemoryBackend, StorageBackend};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Lifecycle of a stream cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Constructed, not yet read or positioned.
    Created,
    /// At least one read or seek has happened.
    Opened,
    /// Closed; every further operation fails with `StreamClosed`.
    Closed,
}

/// A seekable, cloneable read cursor confined to one byte region.
///
/// The cursor is relative to the region: position `0` is the region's first
/// byte and reads stop at `len()`, never touching the next section. Clones
/// share the backend and copy only the index state, so any number of
/// cursors can be open over one file without extra descriptors. Closing a
/// stream does not affect its clones.
pub struct WindowedStream {
    backend: Arc<dyn StorageBackend>,
    region: SectionRegion,
    cursor: u64,
    state: StreamState,
}

impl WindowedStream {
    /// Creates a stream over `region` of `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, region: SectionRegion) -> Self {
        Self {
            backend,
            region,
            cursor: 0,
            state: StreamState::Created,
        }
    }

    /// Creates a stream over the whole backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub fn over_backend(backend: Arc<dyn StorageBackend>) -> RecordingResult<Self> {
        let size = backend.size()?;
        Ok(Self::new(backend, SectionRegion::new(0, size)))
    }

    /// Creates a stream over an in-memory buffer.
    #[must_use]
    pub fn over_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let region = SectionRegion::new(0, bytes.len() as u64);
        Self::new(Arc::new(InMemoryBackend::with_data(bytes)), region)
    }

    /// The absolute region this stream is confined to.
    #[must_use]
    pub fn region(&self) -> SectionRegion {
        self.region
    }

    /// The shared backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Length of the region in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.region.length
    }

    /// Returns whether the region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Cursor position relative to the region start.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Bytes left between the cursor and the region end.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.region.length - self.cursor
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Returns whether the stream has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    fn open(&mut self) -> RecordingResult<()> {
        match self.state {
            StreamState::Closed => Err(RecordingError::StreamClosed),
            StreamState::Created => {
                self.state = StreamState::Opened;
                Ok(())
            }
            StreamState::Opened => Ok(()),
        }
    }

    fn check_open(&self) -> RecordingResult<()> {
        if self.is_closed() {
            return Err(RecordingError::StreamClosed);
        }
        Ok(())
    }

    /// Reads from the cursor into `buf`.
    ///
    /// Returns the number of bytes read; `0` signals the end of the region.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`, or a storage error.
    pub fn read(&mut self, buf: &mut [u8]) -> RecordingResult<usize> {
        self.open()?;
        let n = self.read_at(self.cursor, buf)?;
        self.cursor += n as u64;
        Ok(n)
    }

    /// Reads at `pos` (relative to the region) without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`, or a storage error.
    pub fn read_at(&self, pos: u64, buf: &mut [u8]) -> RecordingResult<usize> {
        self.check_open()?;
        if pos >= self.region.length || buf.is_empty() {
            return Ok(0);
        }

        let available = usize::try_from(self.region.length - pos).unwrap_or(usize::MAX);
        let len = buf.len().min(available);
        let mut filled = 0;
        while filled < len {
            let n = self.backend.read_into(
                self.region.offset + pos + filled as u64,
                &mut buf[filled..len],
            )?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Reads everything from the cursor to the region end.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`, or a storage error.
    pub fn read_to_end_vec(&mut self) -> RecordingResult<Vec<u8>> {
        self.open()?;
        let remaining = usize::try_from(self.remaining()).map_err(|_| {
            RecordingError::invalid_operation("section does not fit into memory")
        })?;
        let mut data = vec![0u8; remaining];
        let n = self.read_at(self.cursor, &mut data)?;
        data.truncate(n);
        self.cursor += n as u64;
        Ok(data)
    }

    /// Advances the cursor by up to `n` bytes.
    ///
    /// Returns the number of bytes actually skipped, which is smaller than
    /// `n` only when the region end is reached.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn skip(&mut self, n: u64) -> RecordingResult<u64> {
        self.open()?;
        let skipped = n.min(self.remaining());
        self.cursor += skipped;
        Ok(skipped)
    }

    /// Moves the cursor to `pos`, clamped to the region length.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn seek_to(&mut self, pos: u64) -> RecordingResult<u64> {
        self.open()?;
        self.cursor = pos.min(self.region.length);
        Ok(self.cursor)
    }

    /// Moves the cursor back to the region start.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn reset(&mut self) -> RecordingResult<()> {
        self.seek_to(0).map(|_| ())
    }

    /// Closes this cursor. Clones remain usable. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.state = StreamState::Closed;
    }

    /// Creates an independent cursor over the same region, starting at `0`.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn try_clone(&self) -> RecordingResult<Self> {
        self.check_open()?;
        Ok(Self::new(Arc::clone(&self.backend), self.region))
    }

    /// Creates a new stream over `[offset, offset + length)` of this region.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`, or `InvalidArgument` if the
    /// sub-range does not lie inside this region.
    pub fn subwindow(&self, offset: u64, length: u64) -> RecordingResult<Self> {
        self.check_open()?;
        let end = offset.checked_add(length);
        if end.map_or(true, |end| end > self.region.length) {
            return Err(RecordingError::invalid_argument(format!(
                "sub-window {offset}+{length} exceeds region length {}",
                self.region.length
            )));
        }
        Ok(Self::new(
            Arc::clone(&self.backend),
            SectionRegion::new(self.region.offset + offset, length),
        ))
    }
}

impl fmt::Debug for WindowedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowedStream")
            .field("region", &self.region)
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Read for WindowedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        WindowedStream::read(self, buf).map_err(io::Error::from)
    }
}

impl Seek for WindowedStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(delta) => self.region.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of section")
        })?;
        self.seek_to(target).map_err(io::Error::from)
    }
}
