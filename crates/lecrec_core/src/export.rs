//! Export of an audio track to a standalone WAV file.
//!
//! The export reads a clone of the caller's stream, so the caller's cursor
//! is untouched, and follows the stream's exclusions. The WAV header is
//! generated fresh for the exported length; the recording's own sub-header
//! is never copied.

use crate::config::ExportConfig;
use crate::error::{RecordingError, RecordingResult};
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::stream::{AudioFormat, AudioStream, SampleEncoding};
use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::{debug, info};

/// Outcome of a successful export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Sample data bytes written (WAV header excluded).
    pub bytes_written: u64,
    /// Duration of the exported audio.
    pub duration_ms: u64,
    /// Sample format of the exported file.
    pub format: AudioFormat,
}

/// Writes audio tracks to standalone WAV files.
#[derive(Debug, Clone, Default)]
pub struct AudioExporter {
    config: ExportConfig,
}

impl AudioExporter {
    /// Creates an exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Exports the playable part of `stream` to `destination`.
    ///
    /// An existing destination is replaced.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a track without a format,
    /// `StreamClosed` if `stream` was closed, or an I/O or audio error.
    pub fn export_audio(
        &self,
        stream: &AudioStream,
        destination: impl AsRef<Path>,
        progress: ProgressCallback<'_>,
    ) -> RecordingResult<ExportSummary> {
        self.config.validate()?;
        let format = stream
            .format()
            .ok_or_else(|| RecordingError::invalid_operation("cannot export a track without audio"))?;
        let destination = destination.as_ref();

        let mut source = stream.try_clone()?;
        if destination.exists() {
            fs::remove_file(destination)?;
        }
        let result = hound::WavWriter::create(destination, format.to_wav_spec())
            .map_err(RecordingError::from)
            .and_then(|writer| self.copy(&mut source, format, writer, progress));
        source.close();

        let summary = result?;
        info!(
            path = %destination.display(),
            bytes = summary.bytes_written,
            duration_ms = summary.duration_ms,
            "audio exported"
        );
        Ok(summary)
    }

    fn copy<W: Write + Seek>(
        &self,
        source: &mut AudioStream,
        format: AudioFormat,
        mut writer: hound::WavWriter<W>,
        progress: ProgressCallback<'_>,
    ) -> RecordingResult<ExportSummary> {
        let mut reporter = ProgressReporter::new(progress, source.len());
        let silence_end = format.millis_to_bytes(self.config.lead_in_silence_ms);
        let bytes_written = copy_playback(
            source,
            format,
            &mut writer,
            self.config.chunk_size,
            silence_end,
            &mut |copied: u64| reporter.report(copied),
        )?;
        writer.finalize()?;
        reporter.finish();

        Ok(ExportSummary {
            bytes_written,
            duration_ms: format.bytes_to_millis(bytes_written),
            format,
        })
    }
}

/// Renders the playable part of `source` as a complete WAV file in memory.
///
/// Used when a track with exclusions is saved into a recording.
pub(crate) fn render_playback_wav(
    source: &mut AudioStream,
    format: AudioFormat,
    chunk_size: usize,
) -> RecordingResult<Vec<u8>> {
    let capacity = usize::try_from(source.len()).unwrap_or(0);
    let mut rendered = Cursor::new(Vec::with_capacity(capacity + 128));
    let mut writer = hound::WavWriter::new(&mut rendered, format.to_wav_spec())?;
    copy_playback(source, format, &mut writer, chunk_size, 0, &mut |_: u64| {})?;
    writer.finalize()?;
    Ok(rendered.into_inner())
}

/// Copies playback bytes from `source` into `writer` in whole frames.
///
/// The first `silence_end` playback bytes are replaced by silence. Returns
/// the number of sample bytes written; a trailing partial frame is dropped.
fn copy_playback<W: Write + Seek>(
    source: &mut AudioStream,
    format: AudioFormat,
    writer: &mut hound::WavWriter<W>,
    chunk_size: usize,
    silence_end: u64,
    on_chunk: &mut dyn FnMut(u64),
) -> RecordingResult<u64> {
    let frame = format.frame_size() as usize;
    let silence_end = silence_end.min(source.len());
    let silence_byte = silence_byte(format);

    // Room for one carried partial frame ahead of each chunk.
    let mut buf = vec![0u8; frame + chunk_size];
    let mut pending = 0usize;
    let mut copied = 0u64;
    loop {
        let n = source.read(&mut buf[pending..pending + chunk_size])?;
        if n == 0 {
            break;
        }

        if copied < silence_end {
            let muted = usize::try_from(silence_end - copied).map_or(n, |m| m.min(n));
            buf[pending..pending + muted].fill(silence_byte);
        }
        copied += n as u64;

        let available = pending + n;
        let whole = available - available % frame;
        write_samples(writer, format, &buf[..whole])?;
        buf.copy_within(whole..available, 0);
        pending = available - whole;

        on_chunk(copied);
    }

    if pending > 0 {
        debug!(pending, "dropping trailing partial frame");
    }
    Ok(copied - pending as u64)
}

/// Raw byte value of a silent sample.
fn silence_byte(format: AudioFormat) -> u8 {
    match (format.encoding, format.bits_per_sample) {
        (SampleEncoding::Pcm, 8) => 0x80,
        _ => 0,
    }
}

/// Decodes little-endian WAV sample bytes and hands them to `hound`.
fn write_samples<W: Write + Seek>(
    writer: &mut hound::WavWriter<W>,
    format: AudioFormat,
    bytes: &[u8],
) -> RecordingResult<()> {
    match (format.encoding, format.bits_per_sample) {
        (SampleEncoding::Pcm, 8) => {
            for &b in bytes {
                writer.write_sample((i16::from(b) - 128) as i8)?;
            }
        }
        (SampleEncoding::Pcm, 16) => {
            for c in bytes.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([c[0], c[1]]))?;
            }
        }
        (SampleEncoding::Pcm, 24) => {
            for c in bytes.chunks_exact(3) {
                writer.write_sample(i32::from_le_bytes([0, c[0], c[1], c[2]]) >> 8)?;
            }
        }
        (SampleEncoding::Pcm, 32) => {
            for c in bytes.chunks_exact(4) {
                writer.write_sample(i32::from_le_bytes([c[0], c[1], c[2], c[3]]))?;
            }
        }
        (SampleEncoding::Float, 32) => {
            for c in bytes.chunks_exact(4) {
                writer.write_sample(f32::from_le_bytes([c[0], c[1], c[2], c[3]]))?;
            }
        }
        (encoding, bits) => {
            return Err(RecordingError::invalid_argument(format!(
                "cannot export {bits}-bit {encoding:?} audio"
            )));
        }
    }
    Ok(())
}
