//! Container reader.
//!
//! Reading is synchronous for everything except screen-capture decoding:
//! the header, events and document are loaded eagerly, the audio and
//! screen-capture tracks are exposed as windows over the shared backend and
//! read on demand.

use crate::config::ReaderConfig;
use crate::container::header::{RecordingHeader, HEADER_SIZE};
use crate::container::section::{SectionKind, SectionPayload, SectionRegion};
use crate::digest::Checksum;
use crate::error::{RecordingError, RecordingResult};
use crate::stream::{
    AudioStream, ScreenCaptureParser, ScreenCaptureStream, ScreenCaptureTask, WindowedStream,
};
use bytes::Bytes;
use lecrec_storage::{FileBackend, InMemoryBackend, StorageBackend};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Buffer size used when re-hashing the sections.
const VERIFY_CHUNK_SIZE: usize = 64 * 1024;

/// Opens recording containers.
#[derive(Debug, Clone, Default)]
pub struct RecordingReader {
    config: ReaderConfig,
}

impl RecordingReader {
    /// Creates a reader with the given configuration.
    #[must_use]
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Opens a recording file.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHeader` if the file is shorter than its header
    /// claims, `IncompatibleFormat` on a version mismatch, or an I/O error.
    /// An audio section that is not a readable WAV is kept as raw bytes
    /// with no format.
    pub fn read(&self, path: impl AsRef<Path>) -> RecordingResult<RecordingHandle> {
        let path = path.as_ref();
        let backend = FileBackend::open_read_only(path)?;
        debug!(path = %path.display(), "opening recording");
        self.read_backend(Arc::new(backend))
    }

    /// Opens a recording held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_bytes(&self, bytes: impl Into<Vec<u8>>) -> RecordingResult<RecordingHandle> {
        self.read_backend(Arc::new(InMemoryBackend::with_data(bytes.into())))
    }

    /// Opens a recording stored in any backend.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_backend(
        &self,
        backend: Arc<dyn StorageBackend>,
    ) -> RecordingResult<RecordingHandle> {
        let size = backend.size()?;
        if size < HEADER_SIZE as u64 {
            return Err(RecordingError::malformed_header(format!(
                "file is {size} bytes, shorter than the {HEADER_SIZE}-byte header"
            )));
        }

        let header = RecordingHeader::parse_from(&backend.read_at(0, HEADER_SIZE)?)?;
        if header.version != self.config.expected_version {
            return Err(RecordingError::IncompatibleFormat {
                expected: self.config.expected_version,
                actual: header.version,
            });
        }

        let total = header.total_size();
        if size < total {
            return Err(RecordingError::malformed_header(format!(
                "header declares {total} bytes but file holds {size}"
            )));
        }
        if size > total {
            warn!(size, total, "ignoring trailing bytes after screen-capture section");
        }

        let events = read_section(&backend, header.region(SectionKind::Events))?;
        let document = read_section(&backend, header.region(SectionKind::Document))?;

        let audio = AudioStream::open_or_raw(WindowedStream::new(
            Arc::clone(&backend),
            header.region(SectionKind::Audio),
        ))?;

        let screen_region = header.region(SectionKind::ScreenCapture);
        let screen_capture = ScreenCaptureStream::new(
            WindowedStream::new(Arc::clone(&backend), screen_region),
            screen_region.length,
        );

        info!(
            version = header.version,
            events = header.events_length,
            document = header.document_length,
            audio = header.audio_length,
            screen_capture = header.screen_capture_length,
            "recording opened"
        );

        Ok(RecordingHandle {
            header,
            backend,
            events,
            document,
            audio,
            screen_capture,
        })
    }
}

fn read_section(backend: &Arc<dyn StorageBackend>, region: SectionRegion) -> RecordingResult<Bytes> {
    let len = usize::try_from(region.length)
        .map_err(|_| RecordingError::invalid_operation("section does not fit into memory"))?;
    Ok(Bytes::from(backend.read_at(region.offset, len)?))
}

/// A loaded recording.
pub struct RecordingHandle {
    header: RecordingHeader,
    backend: Arc<dyn StorageBackend>,
    events: Bytes,
    document: Bytes,
    audio: AudioStream,
    screen_capture: ScreenCaptureStream,
}

impl fmt::Debug for RecordingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHandle")
            .field("header", &self.header)
            .field("events", &self.events.len())
            .field("document", &self.document.len())
            .field("audio", &self.audio)
            .field("screen_capture", &self.screen_capture)
            .finish_non_exhaustive()
    }
}

/// The owned pieces of a [`RecordingHandle`].
#[derive(Debug)]
pub struct RecordingParts {
    /// Parsed header.
    pub header: RecordingHeader,
    /// Raw events section.
    pub events: Bytes,
    /// Raw document section.
    pub document: Bytes,
    /// Audio track.
    pub audio: AudioStream,
    /// Screen-capture track.
    pub screen_capture: ScreenCaptureStream,
}

impl RecordingHandle {
    /// The parsed header.
    #[must_use]
    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    /// Raw events section.
    #[must_use]
    pub fn events(&self) -> &Bytes {
        &self.events
    }

    /// Raw document section.
    #[must_use]
    pub fn document(&self) -> &Bytes {
        &self.document
    }

    /// Parses the events section.
    ///
    /// # Errors
    ///
    /// Returns the payload's parse error.
    pub fn parse_events<T: SectionPayload>(&self) -> RecordingResult<T> {
        T::parse_from(&self.events)
    }

    /// Parses the document section.
    ///
    /// # Errors
    ///
    /// Returns the payload's parse error.
    pub fn parse_document<T: SectionPayload>(&self) -> RecordingResult<T> {
        T::parse_from(&self.document)
    }

    /// The audio track.
    #[must_use]
    pub fn audio(&self) -> &AudioStream {
        &self.audio
    }

    /// Mutable audio track, for seeking and editing exclusions.
    pub fn audio_mut(&mut self) -> &mut AudioStream {
        &mut self.audio
    }

    /// The raw audio region, WAV sub-header included.
    #[must_use]
    pub fn audio_window(&self) -> &WindowedStream {
        self.audio.raw_window()
    }

    /// The screen-capture track.
    #[must_use]
    pub fn screen_capture(&self) -> &ScreenCaptureStream {
        &self.screen_capture
    }

    /// Mutable screen-capture track.
    pub fn screen_capture_mut(&mut self) -> &mut ScreenCaptureStream {
        &mut self.screen_capture
    }

    /// Absolute byte region of a section.
    #[must_use]
    pub fn region(&self, kind: SectionKind) -> SectionRegion {
        self.header.region(kind)
    }

    /// Playback length of the audio track.
    #[must_use]
    pub fn duration_millis(&self) -> u64 {
        self.audio.length_millis()
    }

    /// Recomputes the checksum over all section bytes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sections cannot be read.
    pub fn compute_checksum(&self) -> RecordingResult<Checksum> {
        let start = HEADER_SIZE as u64;
        let region = SectionRegion::new(start, self.header.total_size() - start);
        let mut window = WindowedStream::new(Arc::clone(&self.backend), region);

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; VERIFY_CHUNK_SIZE];
        loop {
            let n = window.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize().into())
    }

    /// Returns whether the stored checksum matches the section bytes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sections cannot be read.
    pub fn verify_checksum(&self) -> RecordingResult<bool> {
        let matches = self.compute_checksum()? == self.header.checksum;
        if !matches {
            warn!(stored = %self.header.checksum_hex(), "recording checksum mismatch");
        }
        Ok(matches)
    }

    /// Starts decoding the screen-capture track on a background thread.
    ///
    /// The handle stays fully usable while the parse runs.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` if the screen-capture window was closed.
    pub fn parse_screen_capture<P, F>(
        &self,
        parser: P,
        progress: Option<F>,
    ) -> RecordingResult<ScreenCaptureTask<P::Output>>
    where
        P: ScreenCaptureParser,
        F: FnMut(f32) + Send + 'static,
    {
        let stream = self.screen_capture.try_clone()?;
        Ok(ScreenCaptureTask::spawn(parser, stream, progress))
    }

    /// Splits the handle into its owned pieces.
    #[must_use]
    pub fn into_parts(self) -> RecordingParts {
        RecordingParts {
            header: self.header,
            events: self.events,
            document: self.document,
            audio: self.audio,
            screen_capture: self.screen_capture,
        }
    }
}
