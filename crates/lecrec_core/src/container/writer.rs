//! Two-pass container writer.
//!
//! Sections are written after a reserved header area while a running digest
//! is kept over every section byte. Once all sections are down, the digest is
//! finalized, the header is built from the actual lengths and patched in at
//! offset `0` without being hashed.

use crate::config::WriterConfig;
use crate::container::header::{RecordingHeader, HEADER_SIZE};
use crate::container::section::{ScreenCaptureSource, SectionKind, SectionPayload};
use crate::digest::{DigestFile, DigestWriter};
use crate::error::{RecordingError, RecordingResult};
use crate::export::render_playback_wav;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::stream::AudioStream;
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// The four tracks handed to the writer.
pub struct RecordingSections<'a, E, D> {
    /// Interaction events payload.
    pub events: &'a E,
    /// Document snapshot payload.
    pub document: &'a D,
    /// Audio track. A clone is read so the caller's cursor stays put; a
    /// track with exclusions is saved with the excluded ranges removed.
    pub audio: &'a AudioStream,
    /// Screen-capture producer, `None` for an empty section.
    pub screen_capture: Option<&'a mut dyn ScreenCaptureSource>,
}

impl<'a, E, D> RecordingSections<'a, E, D> {
    /// Bundles the sections without a screen capture.
    pub fn new(events: &'a E, document: &'a D, audio: &'a AudioStream) -> Self {
        Self {
            events,
            document,
            audio,
            screen_capture: None,
        }
    }

    /// Adds a screen-capture producer.
    #[must_use]
    pub fn with_screen_capture(mut self, source: &'a mut dyn ScreenCaptureSource) -> Self {
        self.screen_capture = Some(source);
        self
    }
}

/// Serialized payloads plus the size estimate used for progress.
struct PreparedSections {
    events: Vec<u8>,
    document: Vec<u8>,
    audio_len: u64,
    screen_hint: u64,
}

impl PreparedSections {
    fn estimated_total(&self) -> u64 {
        HEADER_SIZE as u64
            + self.events.len() as u64
            + self.document.len() as u64
            + self.audio_len
            + self.screen_hint
    }
}

fn section_len(section: SectionKind, length: u64) -> RecordingResult<u32> {
    u32::try_from(length).map_err(|_| RecordingError::SectionTooLarge {
        section,
        length,
        max: u64::from(u32::MAX),
    })
}

/// Writes recording containers.
///
/// # Example
///
/// ```rust
/// use lecrec_core::{AudioStream, RecordingReader, RecordingSections, RecordingWriter};
///
/// let audio = AudioStream::empty();
/// let events = b"events".to_vec();
/// let document = b"document".to_vec();
///
/// let writer = RecordingWriter::default();
/// let bytes = writer
///     .write_to_bytes(RecordingSections::new(&events, &document, &audio), None)
///     .unwrap();
///
/// let handle = RecordingReader::default().read_bytes(bytes).unwrap();
/// assert_eq!(handle.events().as_ref(), b"events");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    config: WriterConfig,
}

impl RecordingWriter {
    /// Creates a writer with the given configuration.
    #[must_use]
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    /// The writer configuration.
    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Writes a recording to `destination`, replacing any existing file.
    ///
    /// Returns the total number of bytes in the written file. On failure the
    /// destination is left partially written and should be removed by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `SectionTooLarge` if a section does not fit the header, or an
    /// I/O, storage or payload error.
    pub fn write<E, D>(
        &self,
        sections: RecordingSections<'_, E, D>,
        destination: impl AsRef<Path>,
        progress: ProgressCallback<'_>,
    ) -> RecordingResult<u64>
    where
        E: SectionPayload,
        D: SectionPayload,
    {
        self.config.validate()?;
        let destination = destination.as_ref();
        let prepared = prepare(&sections)?;
        let mut reporter = ProgressReporter::new(progress, prepared.estimated_total());

        if destination.exists() {
            debug!(path = %destination.display(), "removing existing recording");
            fs::remove_file(destination)?;
        }

        let mut out = DigestFile::create(destination)?;
        let header = self.write_sections(sections, prepared, &mut out, &mut reporter)?;
        if self.config.sync_on_finish {
            out.sync()?;
        }
        let total = out.file_len()?;
        reporter.finish();

        info!(
            path = %destination.display(),
            bytes = total,
            checksum = %header.checksum_hex(),
            "recording written"
        );
        Ok(total)
    }

    /// Builds a recording in memory with the same layout and checksum
    /// [`write`](Self::write) produces on disk.
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    pub fn write_to_bytes<E, D>(
        &self,
        sections: RecordingSections<'_, E, D>,
        progress: ProgressCallback<'_>,
    ) -> RecordingResult<Vec<u8>>
    where
        E: SectionPayload,
        D: SectionPayload,
    {
        self.config.validate()?;
        let prepared = prepare(&sections)?;
        let mut reporter = ProgressReporter::new(progress, prepared.estimated_total());

        let capacity = usize::try_from(prepared.estimated_total()).unwrap_or(0);
        let mut out = DigestWriter::new(Cursor::new(Vec::with_capacity(capacity)));
        let header = self.write_sections(sections, prepared, &mut out, &mut reporter)?;
        reporter.finish();

        let bytes = out.into_inner().into_inner();
        debug!(
            bytes = bytes.len(),
            checksum = %header.checksum_hex(),
            "recording built in memory"
        );
        Ok(bytes)
    }

    fn write_sections<E, D, W>(
        &self,
        sections: RecordingSections<'_, E, D>,
        prepared: PreparedSections,
        out: &mut DigestWriter<W>,
        reporter: &mut ProgressReporter<'_>,
    ) -> RecordingResult<RecordingHeader>
    where
        W: Write + Seek,
    {
        let mut header = RecordingHeader::new();
        out.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        let mut written = HEADER_SIZE as u64;

        for (kind, bytes) in [
            (SectionKind::Events, &prepared.events),
            (SectionKind::Document, &prepared.document),
        ] {
            out.write_all(bytes)?;
            written += bytes.len() as u64;
            header.set_section_length(kind, section_len(kind, bytes.len() as u64)?);
            reporter.report(written);
            debug!(section = %kind, bytes = bytes.len(), "section written");
        }

        let audio_start = out.bytes_hashed();
        if sections.audio.has_exclusions() {
            let format = sections.audio.format().ok_or_else(|| {
                RecordingError::invalid_operation("audio track with exclusions has no format")
            })?;
            let mut source = sections.audio.try_clone()?;
            let rendered = render_playback_wav(&mut source, format, self.config.chunk_size);
            source.close();
            let rendered = rendered?;
            debug!(
                physical = sections.audio.data_len(),
                playback = sections.audio.len(),
                "writing audio track with exclusions applied"
            );
            self.copy_through(&mut rendered.as_slice(), out, &mut written, reporter)?;
        } else {
            let mut audio = sections.audio.raw_window().try_clone()?;
            let result = self.copy_through(&mut audio, out, &mut written, reporter);
            audio.close();
            result?;
        }
        let audio_len = out.bytes_hashed() - audio_start;
        header.set_section_length(SectionKind::Audio, section_len(SectionKind::Audio, audio_len)?);
        debug!(section = %SectionKind::Audio, bytes = audio_len, "section written");

        let screen_len = match sections.screen_capture {
            Some(source) => {
                let start = out.bytes_hashed();
                let reported = source.write_to(out)?;
                let actual = out.bytes_hashed() - start;
                if reported != actual {
                    warn!(reported, actual, "screen capture source miscounted its bytes");
                }
                actual
            }
            None => 0,
        };
        written += screen_len;
        header.set_section_length(
            SectionKind::ScreenCapture,
            section_len(SectionKind::ScreenCapture, screen_len)?,
        );
        reporter.report(written);
        debug!(section = %SectionKind::ScreenCapture, bytes = screen_len, "section written");

        header.checksum = out.finalize_digest()?;
        out.seek(SeekFrom::Start(0))?;
        out.write_unhashed(&header.to_bytes())?;
        out.flush()?;

        Ok(header)
    }

    fn copy_through<R, W>(
        &self,
        source: &mut R,
        out: &mut DigestWriter<W>,
        written: &mut u64,
        reporter: &mut ProgressReporter<'_>,
    ) -> RecordingResult<()>
    where
        R: Read,
        W: Write + Seek,
    {
        let mut buf = vec![0u8; self.config.chunk_size];
        loop {
            let n = source.read(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            out.write_all(&buf[..n])?;
            *written += n as u64;
            reporter.report(*written);
        }
    }
}

fn prepare<E, D>(sections: &RecordingSections<'_, E, D>) -> RecordingResult<PreparedSections>
where
    E: SectionPayload,
    D: SectionPayload,
{
    let events = sections.events.to_bytes()?;
    let document = sections.document.to_bytes()?;
    // Edited tracks are re-encoded; the new WAV header is close to the old one.
    let audio_len = if sections.audio.has_exclusions() {
        sections.audio.header_len() + sections.audio.len()
    } else {
        sections.audio.raw_len()
    };
    let screen_hint = sections
        .screen_capture
        .as_ref()
        .and_then(|source| source.len_hint())
        .unwrap_or(0);

    section_len(SectionKind::Events, events.len() as u64)?;
    section_len(SectionKind::Document, document.len() as u64)?;
    section_len(SectionKind::Audio, audio_len)?;
    section_len(SectionKind::ScreenCapture, screen_hint)?;

    Ok(PreparedSections {
        events,
        document,
        audio_len,
        screen_hint,
    })
}
