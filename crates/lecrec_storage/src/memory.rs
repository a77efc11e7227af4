//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::StorageResult;

/// An in-memory storage backend.
///
/// This backend holds all data in memory and is suitable for:
/// - Unit and integration tests
/// - Audio tracks handed over as a complete WAV buffer
/// - Recordings built with `write_to_bytes` and read back without touching disk
///
/// # Example
///
/// ```rust
/// use lecrec_storage::{StorageBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::with_data(b"test data".to_vec());
/// assert_eq!(backend.size().unwrap(), 9);
/// assert_eq!(backend.read_at(5, 4).unwrap(), b"data");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates an in-memory backend over `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }

        let len = buf.len().min(self.data.len() - start);
        buf[..len].copy_from_slice(&self.data[start..start + len]);
        Ok(len)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }
}
