//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A low-level positioned, read-only byte store.
///
/// Backends are **opaque byte stores**. The container format, section
/// offsets and audio sub-headers are all interpreted by `lecrec_core`.
///
/// # Invariants
///
/// - `size()` never changes for the lifetime of a backend
/// - `read_at` returns exactly `len` bytes or fails
/// - `read_into` never reads past `size()`; at or after the end it returns `0`
/// - Backends must be `Send + Sync` so that any number of stream cursors can
///   share one backend behind an `Arc`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and in-memory tracks
/// - [`super::FileBackend`] - For recordings on disk
pub trait StorageBackend: Send + Sync {
    /// Reads up to `buf.len()` bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes read. A return value smaller than
    /// `buf.len()` means the end of storage was reached; `0` means `offset`
    /// is at or beyond the end.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize>;

    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        let end = offset.saturating_add(len as u64);
        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let mut buffer = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.read_into(offset + filled as u64, &mut buffer[filled..])?;
            if n == 0 {
                return Err(StorageError::ReadPastEnd { offset, len, size });
            }
            filled += n;
        }

        Ok(buffer)
    }

    /// Returns the size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;
}
