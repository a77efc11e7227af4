//! Audio specialization of the windowed stream.
//!
//! The audio section of a recording starts with a RIFF/WAVE sub-header
//! followed by raw sample data. [`AudioStream`] parses the sub-header once,
//! then exposes the sample data as a second window so that every position in
//! this API is relative to the first sample byte. Exclusion intervals are
//! consulted on every read and skip; the bytes themselves are never touched.

use crate::error::{RecordingError, RecordingResult};
use crate::stream::exclusion::{ByteExclusions, ExclusionSet, MillisInterval};
use crate::stream::format::AudioFormat;
use crate::stream::window::{StreamState, WindowedStream};
use lecrec_storage::{FileBackend, StorageBackend};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A seekable, cloneable PCM cursor with time-based exclusions.
#[derive(Debug)]
pub struct AudioStream {
    raw: WindowedStream,
    data: WindowedStream,
    format: Option<AudioFormat>,
    header_len: u64,
    exclusions: ExclusionSet,
    byte_map: ByteExclusions,
}

impl AudioStream {
    /// Opens an audio stream over a raw audio region.
    ///
    /// An empty region yields a stream without a format; reads return end of
    /// stream and time-based operations fail.
    ///
    /// # Errors
    ///
    /// Returns `Audio` if the WAV sub-header cannot be parsed, or
    /// `InvalidArgument` if its sample format is not supported.
    pub fn open(raw: WindowedStream) -> RecordingResult<Self> {
        if raw.is_empty() {
            let data = raw.subwindow(0, 0)?;
            return Ok(Self::assemble(raw, data, None, 0));
        }

        let mut cursor = raw.try_clone()?;
        let reader = hound::WavReader::new(&mut cursor)?;
        let format = AudioFormat::from(reader.spec());
        format.validate()?;
        let declared = u64::from(reader.len()) * u64::from(format.bytes_per_sample());
        let header_len = reader.into_inner().position();

        let available = raw.len().saturating_sub(header_len);
        if declared > available {
            warn!(
                declared,
                available,
                "audio data chunk is longer than its section, truncating"
            );
        }
        let data_len = format.align_to_frame(declared.min(available));
        let data = raw.subwindow(header_len, data_len)?;

        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            bits = format.bits_per_sample,
            header_len,
            data_len,
            "opened audio stream"
        );
        Ok(Self::assemble(raw, data, Some(format), header_len))
    }

    /// Like [`open`](Self::open), but a sub-header that cannot be parsed
    /// yields a stream without a format that still carries the raw region.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` if `raw` was closed.
    pub fn open_or_raw(raw: WindowedStream) -> RecordingResult<Self> {
        match Self::open(raw.try_clone()?) {
            Err(err @ (RecordingError::Audio(_) | RecordingError::InvalidArgument { .. })) => {
                warn!(error = %err, raw_len = raw.len(), "audio section is not playable, keeping raw bytes");
                let data = raw.subwindow(0, 0)?;
                Ok(Self::assemble(raw, data, None, 0))
            }
            result => result,
        }
    }

    fn assemble(
        raw: WindowedStream,
        data: WindowedStream,
        format: Option<AudioFormat>,
        header_len: u64,
    ) -> Self {
        let byte_map = ByteExclusions::none(data.len());
        Self {
            raw,
            data,
            format,
            header_len,
            exclusions: ExclusionSet::new(),
            byte_map,
        }
    }

    /// A stream with no audio, written as a zero-length section.
    #[must_use]
    pub fn empty() -> Self {
        let raw = WindowedStream::over_bytes(Vec::new());
        let data = WindowedStream::over_bytes(Vec::new());
        Self::assemble(raw, data, None, 0)
    }

    /// Opens a complete in-memory WAV file.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn from_wav_bytes(bytes: impl Into<Vec<u8>>) -> RecordingResult<Self> {
        Self::open(WindowedStream::over_bytes(bytes))
    }

    /// Opens a WAV file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, or see [`open`](Self::open).
    pub fn from_path(path: impl AsRef<Path>) -> RecordingResult<Self> {
        let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::open_read_only(path.as_ref())?);
        Self::open(WindowedStream::over_backend(backend)?)
    }

    /// Sample format, `None` for an empty track.
    #[must_use]
    pub fn format(&self) -> Option<AudioFormat> {
        self.format
    }

    fn require_format(&self) -> RecordingResult<AudioFormat> {
        self.format
            .ok_or_else(|| RecordingError::invalid_operation("audio track has no format"))
    }

    /// Length of the WAV sub-header skipped before the sample data.
    #[must_use]
    pub fn header_len(&self) -> u64 {
        self.header_len
    }

    /// Length of the whole raw audio region, sub-header included.
    #[must_use]
    pub fn raw_len(&self) -> u64 {
        self.raw.len()
    }

    /// Physical sample data length, ignoring exclusions.
    #[must_use]
    pub fn data_len(&self) -> u64 {
        self.data.len()
    }

    /// Playback length in bytes (data minus excluded ranges).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.byte_map.virtual_len()
    }

    /// Returns whether there is nothing to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Playback length in milliseconds.
    #[must_use]
    pub fn length_millis(&self) -> u64 {
        self.format
            .map_or(0, |format| format.bytes_to_millis(self.len()))
    }

    /// Physical cursor position within the sample data.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.data.position()
    }

    /// Cursor position in playback bytes.
    #[must_use]
    pub fn virtual_position(&self) -> u64 {
        let physical = self.byte_map.skip_excluded(self.data.position());
        self.byte_map
            .physical_to_virtual(physical)
            .unwrap_or_else(|| self.len())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        self.data.state()
    }

    /// The raw audio region, WAV sub-header included.
    #[must_use]
    pub fn raw_window(&self) -> &WindowedStream {
        &self.raw
    }

    /// The sample data region.
    #[must_use]
    pub fn data_window(&self) -> &WindowedStream {
        &self.data
    }

    /// Reads sample bytes in playback order, skipping excluded ranges.
    ///
    /// A single call never crosses into an excluded range; `0` signals the end
    /// of the track.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`, or a storage error.
    pub fn read(&mut self, buf: &mut [u8]) -> RecordingResult<usize> {
        let current = self.data.position();
        let pos = self.byte_map.skip_excluded(current);
        if pos != current {
            self.data.seek_to(pos)?;
        }
        let limit = self
            .byte_map
            .next_boundary(pos)
            .unwrap_or_else(|| self.data.len());
        let max = usize::try_from(limit - pos)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        self.data.read(&mut buf[..max])
    }

    /// Skips up to `n` playback bytes, returning how many were skipped.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn skip(&mut self, n: u64) -> RecordingResult<u64> {
        let start = self.virtual_position();
        let target = start.saturating_add(n).min(self.len());
        self.data
            .seek_to(self.byte_map.virtual_to_physical(target))?;
        Ok(target - start)
    }

    /// Moves the cursor back to the first sample.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn reset(&mut self) -> RecordingResult<()> {
        self.data.reset()
    }

    /// Resets, then skips the playback bytes corresponding to `millis`.
    ///
    /// Returns the number of bytes skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a track without a format, or
    /// `StreamClosed` after `close()`.
    pub fn seek_ms(&mut self, millis: u64) -> RecordingResult<u64> {
        let format = self.require_format()?;
        self.reset()?;
        self.skip(format.millis_to_bytes(millis))
    }

    /// Closes this stream. Clones remain usable.
    pub fn close(&mut self) {
        self.data.close();
        self.raw.close();
    }

    /// Creates an independent stream at position `0` with its own copy of
    /// the exclusion set.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` after `close()`.
    pub fn try_clone(&self) -> RecordingResult<Self> {
        Ok(Self {
            raw: self.raw.try_clone()?,
            data: self.data.try_clone()?,
            format: self.format,
            header_len: self.header_len,
            exclusions: self.exclusions.clone(),
            byte_map: self.byte_map.clone(),
        })
    }

    /// The exclusion intervals in insertion order.
    #[must_use]
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Returns whether any sample bytes are cut from playback.
    #[must_use]
    pub fn has_exclusions(&self) -> bool {
        self.byte_map.excluded_bytes() > 0
    }

    /// The merged excluded byte ranges.
    #[must_use]
    pub fn excluded_ranges(&self) -> &ByteExclusions {
        &self.byte_map
    }

    fn rebuild_byte_map(&mut self) {
        self.byte_map = match self.format {
            Some(format) => self.exclusions.to_byte_map(&format, self.data.len()),
            None => ByteExclusions::none(self.data.len()),
        };
    }

    /// Cuts `[start, end)` out of playback.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `start > end`, or `InvalidOperation` for a
    /// track without a format.
    pub fn add_exclusion_millis(&mut self, start: u64, end: u64) -> RecordingResult<()> {
        self.require_format()?;
        self.exclusions.add(MillisInterval::new(start, end)?);
        self.rebuild_byte_map();
        Ok(())
    }

    /// Removes a cut previously added with the same bounds.
    ///
    /// Returns whether a matching interval was found.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `start > end`.
    pub fn remove_exclusion_millis(&mut self, start: u64, end: u64) -> RecordingResult<bool> {
        let removed = self.exclusions.remove(&MillisInterval::new(start, end)?);
        if removed {
            self.rebuild_byte_map();
        }
        Ok(removed)
    }

    fn exclusive_complement(&self, start: u64, end: u64) -> RecordingResult<[MillisInterval; 2]> {
        let format = self.require_format()?;
        MillisInterval::new(start, end)?;
        let span = format.bytes_to_millis_ceil(self.data.len());
        let head = MillisInterval::new(0, start.min(span))?;
        let tail = MillisInterval::new(end.min(span), span)?;
        Ok([head, tail])
    }

    /// Keeps only `[start, end)` for playback by excluding everything around it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `start > end`, or `InvalidOperation` for a
    /// track without a format.
    pub fn add_exclusive_millis(&mut self, start: u64, end: u64) -> RecordingResult<()> {
        for interval in self.exclusive_complement(start, end)? {
            self.exclusions.add(interval);
        }
        self.rebuild_byte_map();
        Ok(())
    }

    /// Undoes [`add_exclusive_millis`](Self::add_exclusive_millis) for the
    /// same bounds. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `start > end`, or `InvalidOperation` for a
    /// track without a format.
    pub fn remove_exclusive_millis(&mut self, start: u64, end: u64) -> RecordingResult<bool> {
        let mut removed = false;
        for interval in self.exclusive_complement(start, end)? {
            removed |= self.exclusions.remove(&interval);
        }
        if removed {
            self.rebuild_byte_map();
        }
        Ok(removed)
    }

    /// Drops every exclusion.
    pub fn clear_exclusions(&mut self) {
        self.exclusions.clear();
        self.rebuild_byte_map();
    }

    /// Maps a playback byte offset to a physical sample offset.
    #[must_use]
    pub fn virtual_to_physical(&self, virtual_pos: u64) -> u64 {
        self.byte_map.virtual_to_physical(virtual_pos)
    }

    /// Maps a physical sample offset to a playback offset, `None` if excluded.
    #[must_use]
    pub fn physical_to_virtual(&self, physical: u64) -> Option<u64> {
        self.byte_map.physical_to_virtual(physical)
    }
}

impl io::Read for AudioStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        AudioStream::read(self, buf).map_err(io::Error::from)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{pcm_bytes, wav_bytes};
    use super::*;

    fn read_all(stream: &mut AudioStream) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn unreadable_sub_header_keeps_raw_bytes() {
        let raw = WindowedStream::over_bytes(b"not a wav file".to_vec());
        assert!(matches!(
            AudioStream::open(raw.try_clone().unwrap()),
            Err(RecordingError::Audio(_))
        ));

        let mut stream = AudioStream::open_or_raw(raw).unwrap();
        assert!(stream.format().is_none());
        assert_eq!(stream.raw_len(), 14);
        assert_eq!(stream.len(), 0);
        assert_eq!(stream.read(&mut [0u8; 4]).unwrap(), 0);
        assert!(matches!(
            stream.seek_ms(10),
            Err(RecordingError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn parses_sub_header() {
        let stream = AudioStream::from_wav_bytes(wav_bytes(8_000, 1, 100)).unwrap();
        assert_eq!(stream.header_len(), 44);
        assert_eq!(stream.data_len(), 200);
        assert_eq!(stream.raw_len(), 244);
        assert_eq!(stream.format(), Some(AudioFormat::pcm(8_000, 1, 16)));
        assert_eq!(stream.length_millis(), 12);
    }

    #[test]
    fn reads_only_sample_data() {
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(8_000, 2, 50)).unwrap();
        assert_eq!(read_all(&mut stream), pcm_bytes(2, 50));
    }

    #[test]
    fn seek_ms_uses_bytes_per_second() {
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(44_100, 1, 88_200)).unwrap();
        stream.skip(10).unwrap();

        assert_eq!(stream.seek_ms(1000).unwrap(), 88_200);
        assert_eq!(stream.position(), 88_200);

        let mut buf = [0u8; 2];
        stream.read(&mut buf).unwrap();
        assert_eq!(i16::from_le_bytes(buf), 44_100u32 as i16);
    }

    #[test]
    fn exclusions_are_skipped_on_read() {
        // 1000 Hz mono 16-bit: 2 bytes per millisecond.
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(1_000, 1, 100)).unwrap();
        stream.add_exclusion_millis(10, 20).unwrap();
        stream.add_exclusion_millis(50, 100).unwrap();

        assert_eq!(stream.len(), 80);
        assert_eq!(stream.length_millis(), 40);

        let pcm = pcm_bytes(1, 100);
        let mut expected = pcm[..20].to_vec();
        expected.extend_from_slice(&pcm[40..100]);
        assert_eq!(read_all(&mut stream), expected);
    }

    #[test]
    fn skip_counts_playback_bytes() {
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(1_000, 1, 100)).unwrap();
        stream.add_exclusion_millis(10, 20).unwrap();

        assert_eq!(stream.skip(30).unwrap(), 30);
        assert_eq!(stream.position(), 50);
        assert_eq!(stream.virtual_position(), 30);
        assert_eq!(stream.skip(1_000).unwrap(), 150);
        assert_eq!(stream.virtual_position(), stream.len());
    }

    #[test]
    fn exclusive_keeps_only_interval() {
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(1_000, 1, 100)).unwrap();
        stream.add_exclusive_millis(30, 60).unwrap();

        assert_eq!(stream.length_millis(), 30);
        assert_eq!(read_all(&mut stream), pcm_bytes(1, 100)[60..120].to_vec());

        assert!(stream.remove_exclusive_millis(30, 60).unwrap());
        assert_eq!(stream.length_millis(), 100);
    }

    #[test]
    fn removing_overlapping_exclusion_keeps_the_other() {
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(1_000, 1, 100)).unwrap();
        stream.add_exclusion_millis(10, 30).unwrap();
        stream.add_exclusion_millis(20, 40).unwrap();
        assert_eq!(stream.length_millis(), 70);

        assert!(stream.remove_exclusion_millis(10, 30).unwrap());
        assert_eq!(stream.length_millis(), 80);
        assert!(!stream.remove_exclusion_millis(10, 30).unwrap());

        stream.clear_exclusions();
        assert!(stream.exclusions().is_empty());
    }

    #[test]
    fn clone_gets_private_exclusions() {
        let mut original = AudioStream::from_wav_bytes(wav_bytes(1_000, 1, 100)).unwrap();
        original.add_exclusion_millis(0, 10).unwrap();
        original.skip(4).unwrap();

        let clone = original.try_clone().unwrap();
        original.add_exclusion_millis(90, 100).unwrap();

        assert_eq!(clone.position(), 0);
        assert_eq!(clone.state(), StreamState::Created);
        assert_eq!(clone.exclusions().len(), 1);
        assert_eq!(original.exclusions().len(), 2);
    }

    #[test]
    fn closed_stream_rejects_everything() {
        let mut stream = AudioStream::from_wav_bytes(wav_bytes(1_000, 1, 10)).unwrap();
        stream.close();

        assert!(matches!(stream.read(&mut [0u8; 2]), Err(RecordingError::StreamClosed)));
        assert!(matches!(stream.skip(1), Err(RecordingError::StreamClosed)));
        assert!(matches!(stream.seek_ms(1), Err(RecordingError::StreamClosed)));
        assert!(matches!(stream.try_clone(), Err(RecordingError::StreamClosed)));
    }

    #[test]
    fn empty_track_has_no_format() {
        let mut stream = AudioStream::empty();
        assert!(stream.format().is_none());
        assert_eq!(stream.read(&mut [0u8; 4]).unwrap(), 0);
        assert!(matches!(
            stream.seek_ms(5),
            Err(RecordingError::InvalidOperation { .. })
        ));
        assert!(stream.add_exclusion_millis(0, 1).is_err());
    }

    #[test]
    fn rejects_garbage_header() {
        assert!(matches!(
            AudioStream::from_wav_bytes(b"definitely not a wav".to_vec()),
            Err(RecordingError::Audio(_))
        ));
    }
}
