//! File-based storage backend for recordings on disk.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// A file-based storage backend.
///
/// One `FileBackend` wraps one OS file handle. Every windowed stream over a
/// recording shares the same backend, so opening a recording never costs
/// more than one file descriptor no matter how many cursors are cloned.
/// Recordings are write-once, so the file is opened read-only and its size
/// is taken once at open.
///
/// # Thread Safety
///
/// Positioned reads take the internal lock for the duration of the
/// seek + read pair, so concurrent readers never observe each other's
/// file position.
///
/// # Example
///
/// ```no_run
/// use lecrec_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open_read_only(Path::new("lecture.rec")).unwrap();
/// let mut header = [0u8; 52];
/// let n = backend.read_into(0, &mut header).unwrap();
/// assert!(n <= 52);
/// ```
#[derive(Debug)]
pub struct FileBackend {
    file: RwLock<File>,
    size: u64,
}

impl FileBackend {
    /// Opens an existing file for positioned reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            file: RwLock::new(file),
            size,
        })
    }
}

impl StorageBackend for FileBackend {
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        if offset >= self.size || buf.is_empty() {
            return Ok(0);
        }

        let available = usize::try_from(self.size - offset).unwrap_or(usize::MAX);
        let len = buf.len().min(available);

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf[..len])?;

        Ok(len)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.size)
    }
}
