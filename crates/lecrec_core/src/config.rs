//! Writer, reader and export configuration.

use crate::container::FORMAT_VERSION;
use crate::error::{RecordingError, RecordingResult};

/// Default chunk size used when streaming the audio section into a container.
pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 4096;

/// Default chunk size used when exporting audio to a standalone file.
pub const DEFAULT_EXPORT_CHUNK_SIZE: usize = 8192;

/// Default length of the silenced lead-in written at the start of an export.
pub const DEFAULT_LEAD_IN_SILENCE_MS: u64 = 20;

/// Configuration for writing a recording container.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Size of the buffer used to copy streamed sections.
    ///
    /// Affects throughput and progress granularity only, never the file layout.
    pub chunk_size: usize,

    /// Whether to fsync the file after the header has been patched.
    pub sync_on_finish: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
            sync_on_finish: true,
        }
    }
}

impl WriterConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the copy chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets whether to fsync after writing.
    #[must_use]
    pub const fn sync_on_finish(mut self, value: bool) -> Self {
        self.sync_on_finish = value;
        self
    }

    pub(crate) fn validate(&self) -> RecordingResult<()> {
        validate_chunk_size(self.chunk_size)
    }
}

/// Configuration for reading a recording container.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// The only format version this reader accepts.
    pub expected_version: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            expected_version: FORMAT_VERSION,
        }
    }
}

impl ReaderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the accepted format version.
    #[must_use]
    pub const fn expected_version(mut self, version: u32) -> Self {
        self.expected_version = version;
        self
    }
}

/// Configuration for exporting audio to a standalone WAV file.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Size of the buffer used to copy audio data.
    pub chunk_size: usize,

    /// Length of audio at the start of the export replaced by silence.
    ///
    /// Cut points rarely fall on a zero crossing, so the first few
    /// milliseconds are muted to avoid an audible click.
    pub lead_in_silence_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_EXPORT_CHUNK_SIZE,
            lead_in_silence_ms: DEFAULT_LEAD_IN_SILENCE_MS,
        }
    }
}

impl ExportConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the copy chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the silenced lead-in length.
    #[must_use]
    pub const fn lead_in_silence_ms(mut self, millis: u64) -> Self {
        self.lead_in_silence_ms = millis;
        self
    }

    pub(crate) fn validate(&self) -> RecordingResult<()> {
        validate_chunk_size(self.chunk_size)
    }
}

fn validate_chunk_size(size: usize) -> RecordingResult<()> {
    if size == 0 {
        return Err(RecordingError::invalid_argument("chunk size must be non-zero"));
    }
    Ok(())
}
