//! Error types for lecrec core.

use crate::container::SectionKind;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Errors that can occur while writing, reading or streaming a recording.
///
/// Short reads and end-of-stream are not errors: stream reads return `0`
/// once the end of their section is reached.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] lecrec_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The audio sub-header could not be parsed or the WAV could not be written.
    #[error("audio format error: {0}")]
    Audio(#[from] hound::Error),

    /// The header's format version does not match the reader's.
    #[error("incompatible recording format: expected version {expected}, found {actual}")]
    IncompatibleFormat {
        /// Version the reader understands.
        expected: u32,
        /// Version stored in the file.
        actual: u32,
    },

    /// The header is truncated or describes sections the file does not hold.
    #[error("malformed recording header: {message}")]
    MalformedHeader {
        /// Description of the problem.
        message: String,
    },

    /// An operation was attempted on a stream after `close()`.
    #[error("stream is closed")]
    StreamClosed,

    /// A section does not fit into the header's 32-bit length field.
    #[error("{section} section too large: {length} bytes exceeds maximum of {max} bytes")]
    SectionTooLarge {
        /// The offending section.
        section: SectionKind,
        /// Its length in bytes.
        length: u64,
        /// Largest length the header can store.
        max: u64,
    },

    /// An argument was out of range.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument problem.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// A background task failed without producing a result.
    #[error("background task failed: {message}")]
    BackgroundTask {
        /// Description of the failure.
        message: String,
    },
}

impl RecordingError {
    /// Creates a malformed header error.
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a background task error.
    pub fn background_task(message: impl Into<String>) -> Self {
        Self::BackgroundTask {
            message: message.into(),
        }
    }
}

impl From<RecordingError> for io::Error {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::Io(e) => e,
            RecordingError::Storage(lecrec_storage::StorageError::Io(e)) => e,
            other @ RecordingError::InvalidArgument { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, other)
            }
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
