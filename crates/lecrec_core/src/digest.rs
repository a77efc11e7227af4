//! Hash-accumulating file used while writing a recording.
//!
//! Every byte written through a [`DigestWriter`] is forwarded to the file and
//! fed into a running SHA-256 state. The digest is finalized once, after the
//! section data and before the header patch, so the header never contributes
//! to its own checksum.

use crate::error::{RecordingError, RecordingResult};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

/// Length in bytes of a recording checksum.
pub const CHECKSUM_LEN: usize = 32;

/// A fixed-length SHA-256 digest over all section bytes of a recording.
pub type Checksum = [u8; CHECKSUM_LEN];

/// Computes the checksum of a byte slice.
#[must_use]
pub fn checksum_of(data: &[u8]) -> Checksum {
    Sha256::digest(data).into()
}

/// A random-access writer that hashes everything written through it.
///
/// Seeking is forwarded unchanged, so a section can be skipped and patched
/// later with [`write_unhashed`](Self::write_unhashed).
#[derive(Debug)]
pub struct DigestWriter<W> {
    inner: W,
    hasher: Option<Sha256>,
    bytes_hashed: u64,
}

/// A [`DigestWriter`] over a file on disk.
pub type DigestFile = DigestWriter<File>;

impl DigestWriter<File> {
    /// Creates (or truncates) `path` and opens it read-write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> RecordingResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file))
    }

    /// Returns the current file length.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be read.
    pub fn file_len(&self) -> RecordingResult<u64> {
        Ok(self.inner.metadata()?.len())
    }

    /// Flushes and fsyncs the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&mut self) -> RecordingResult<()> {
        self.inner.flush()?;
        self.inner.sync_all()?;
        Ok(())
    }
}

impl<W: Write + Seek> DigestWriter<W> {
    /// Wraps a writer with a fresh digest state.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Some(Sha256::new()),
            bytes_hashed: 0,
        }
    }

    /// Returns the number of bytes fed into the digest so far.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Returns whether [`finalize_digest`](Self::finalize_digest) has been called.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.hasher.is_none()
    }

    /// Consumes the hash state and returns the digest of everything written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the digest was already finalized.
    pub fn finalize_digest(&mut self) -> RecordingResult<Checksum> {
        let hasher = self
            .hasher
            .take()
            .ok_or_else(|| RecordingError::invalid_operation("digest already finalized"))?;
        Ok(hasher.finalize().into())
    }

    /// Writes bytes without feeding them to the digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_unhashed(&mut self, data: &[u8]) -> RecordingResult<()> {
        self.inner.write_all(data)?;
        Ok(())
    }

    /// Returns the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(hasher) = self.hasher.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                RecordingError::invalid_operation("write after digest was finalized"),
            ));
        };
        let written = self.inner.write(buf)?;
        hasher.update(&buf[..written]);
        self.bytes_hashed += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Seek> Seek for DigestWriter<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
