//! Section kinds, byte regions and payload contracts.

use crate::error::RecordingResult;
use bytes::Bytes;
use std::fmt;
use std::io::{self, Write};

/// The four tracks embedded in a recording, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Timestamped interaction events.
    Events,
    /// Document snapshot.
    Document,
    /// Audio track (WAV sub-header followed by sample data).
    Audio,
    /// Screen-capture track.
    ScreenCapture,
}

impl SectionKind {
    /// All sections in the order they are laid out in the file.
    pub const ALL: [Self; 4] = [Self::Events, Self::Document, Self::Audio, Self::ScreenCapture];

    /// Position of the section in the on-disk order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Events => 0,
            Self::Document => 1,
            Self::Audio => 2,
            Self::ScreenCapture => 3,
        }
    }

    /// Human-readable section name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::ScreenCapture => "screen-capture",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A contiguous byte range of the container file belonging to one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionRegion {
    /// Absolute offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub length: u64,
}

impl SectionRegion {
    /// Creates a region.
    #[must_use]
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Absolute offset one past the last byte.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Returns whether the region holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A section payload that serializes to and from raw bytes.
///
/// The events log and the document snapshot are produced by collaborators
/// outside this crate; they only need to implement this trait.
pub trait SectionPayload: Sized {
    /// Serializes the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    fn to_bytes(&self) -> RecordingResult<Vec<u8>>;

    /// Parses the payload from section bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid payload.
    fn parse_from(bytes: &[u8]) -> RecordingResult<Self>;
}

impl SectionPayload for Vec<u8> {
    fn to_bytes(&self) -> RecordingResult<Vec<u8>> {
        Ok(self.clone())
    }

    fn parse_from(bytes: &[u8]) -> RecordingResult<Self> {
        Ok(bytes.to_vec())
    }
}

impl SectionPayload for Bytes {
    fn to_bytes(&self) -> RecordingResult<Vec<u8>> {
        Ok(self.to_vec())
    }

    fn parse_from(bytes: &[u8]) -> RecordingResult<Self> {
        Ok(Bytes::copy_from_slice(bytes))
    }
}

/// Producer of the screen-capture section.
///
/// The screen-capture encoder writes its track straight into the
/// container writer's hashing output and reports how many bytes it wrote.
pub trait ScreenCaptureSource: Send {
    /// Expected number of bytes, used only to scale progress reports.
    fn len_hint(&self) -> Option<u64> {
        None
    }

    /// Writes the whole track to `out` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if producing or writing the track fails.
    fn write_to(&mut self, out: &mut dyn Write) -> io::Result<u64>;
}

impl ScreenCaptureSource for Vec<u8> {
    fn len_hint(&self) -> Option<u64> {
        Some(self.len() as u64)
    }

    fn write_to(&mut self, out: &mut dyn Write) -> io::Result<u64> {
        out.write_all(self)?;
        Ok(self.len() as u64)
    }
}

impl ScreenCaptureSource for Bytes {
    fn len_hint(&self) -> Option<u64> {
        Some(self.len() as u64)
    }

    fn write_to(&mut self, out: &mut dyn Write) -> io::Result<u64> {
        out.write_all(self)?;
        Ok(self.len() as u64)
    }
}
