//! Fixed-size recording header.
//!
//! ## Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! | version (4) | checksum (32) | events (4) | document (4) | audio (4) | screen capture (4) |
//! ```
//!
//! The header is always [`HEADER_SIZE`] bytes, whatever the sections hold.

use crate::container::section::{SectionKind, SectionRegion};
use crate::digest::{Checksum, CHECKSUM_LEN};
use crate::error::{RecordingError, RecordingResult};

/// Current recording format version.
pub const FORMAT_VERSION: u32 = 3;

/// Serialized header size in bytes.
pub const HEADER_SIZE: usize = 4 + CHECKSUM_LEN + 4 * SectionKind::ALL.len();

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Header describing the format version, checksum and section lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingHeader {
    /// Format version.
    pub version: u32,
    /// SHA-256 of all section bytes in file order.
    pub checksum: Checksum,
    /// Length of the events section.
    pub events_length: u32,
    /// Length of the document section.
    pub document_length: u32,
    /// Length of the audio section.
    pub audio_length: u32,
    /// Length of the screen-capture section.
    pub screen_capture_length: u32,
}

impl Default for RecordingHeader {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            checksum: [0; CHECKSUM_LEN],
            events_length: 0,
            document_length: 0,
            audio_length: 0,
            screen_capture_length: 0,
        }
    }
}

impl RecordingHeader {
    /// Creates an empty header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized size of every header.
    #[must_use]
    pub const fn header_size() -> usize {
        HEADER_SIZE
    }

    /// Returns the recorded length of a section.
    #[must_use]
    pub const fn section_length(&self, kind: SectionKind) -> u32 {
        match kind {
            SectionKind::Events => self.events_length,
            SectionKind::Document => self.document_length,
            SectionKind::Audio => self.audio_length,
            SectionKind::ScreenCapture => self.screen_capture_length,
        }
    }

    /// Sets the recorded length of a section.
    pub fn set_section_length(&mut self, kind: SectionKind, length: u32) {
        match kind {
            SectionKind::Events => self.events_length = length,
            SectionKind::Document => self.document_length = length,
            SectionKind::Audio => self.audio_length = length,
            SectionKind::ScreenCapture => self.screen_capture_length = length,
        }
    }

    /// Computes the byte region of a section from the preceding lengths.
    #[must_use]
    pub fn region(&self, kind: SectionKind) -> SectionRegion {
        let offset = HEADER_SIZE as u64
            + SectionKind::ALL[..kind.index()]
                .iter()
                .map(|k| u64::from(self.section_length(*k)))
                .sum::<u64>();
        SectionRegion::new(offset, u64::from(self.section_length(kind)))
    }

    /// Regions of all four sections in file order.
    #[must_use]
    pub fn regions(&self) -> [SectionRegion; 4] {
        SectionKind::ALL.map(|kind| self.region(kind))
    }

    /// Total container size implied by this header.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.region(SectionKind::ScreenCapture).end()
    }

    /// Returns whether any section holds bytes.
    #[must_use]
    pub fn has_content(&self) -> bool {
        SectionKind::ALL
            .iter()
            .any(|kind| self.section_length(*kind) > 0)
    }

    /// Lowercase hex rendering of the checksum.
    #[must_use]
    pub fn checksum_hex(&self) -> String {
        self.checksum.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Serializes the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..4 + CHECKSUM_LEN].copy_from_slice(&self.checksum);

        let mut offset = 4 + CHECKSUM_LEN;
        for kind in SectionKind::ALL {
            buf[offset..offset + 4].copy_from_slice(&self.section_length(kind).to_le_bytes());
            offset += 4;
        }
        buf
    }

    /// Parses a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    ///
    /// The version is not checked here; that is the reader's decision.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHeader` if fewer than [`HEADER_SIZE`] bytes are given.
    pub fn parse_from(bytes: &[u8]) -> RecordingResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RecordingError::malformed_header(format!(
                "header needs {HEADER_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&bytes[4..4 + CHECKSUM_LEN]);

        let mut header = Self {
            version: read_u32(bytes, 0),
            checksum,
            ..Self::default()
        };
        let mut offset = 4 + CHECKSUM_LEN;
        for kind in SectionKind::ALL {
            header.set_section_length(kind, read_u32(bytes, offset));
            offset += 4;
        }

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> RecordingHeader {
        RecordingHeader {
            version: FORMAT_VERSION,
            checksum: [7; CHECKSUM_LEN],
            events_length: 10,
            document_length: 20,
            audio_length: 30,
            screen_capture_length: 40,
        }
    }

    #[test]
    fn header_size_is_52() {
        assert_eq!(HEADER_SIZE, 52);
        assert_eq!(RecordingHeader::header_size(), 52);
        assert_eq!(sample().to_bytes().len(), 52);
    }

    #[test]
    fn parse_reverses_serialize() {
        let header = sample();
        assert_eq!(RecordingHeader::parse_from(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn parse_ignores_trailing_bytes() {
        let mut bytes = sample().to_bytes().to_vec();
        bytes.extend_from_slice(b"section data");
        assert_eq!(RecordingHeader::parse_from(&bytes).unwrap(), sample());
    }

    #[test]
    fn parse_short_input_fails() {
        let bytes = sample().to_bytes();
        let result = RecordingHeader::parse_from(&bytes[..HEADER_SIZE - 1]);
        assert!(matches!(result, Err(RecordingError::MalformedHeader { .. })));
        assert!(RecordingHeader::parse_from(&[]).is_err());
    }

    #[test]
    fn layout_is_little_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], &[3, 0, 0, 0]);
        assert_eq!(&bytes[36..40], &[10, 0, 0, 0]);
        assert_eq!(&bytes[48..52], &[40, 0, 0, 0]);
    }

    #[test]
    fn regions_are_contiguous() {
        let header = sample();
        let [events, document, audio, screen] = header.regions();

        assert_eq!(events, SectionRegion::new(52, 10));
        assert_eq!(document, SectionRegion::new(62, 20));
        assert_eq!(audio, SectionRegion::new(82, 30));
        assert_eq!(screen, SectionRegion::new(112, 40));
        assert_eq!(header.total_size(), 152);
    }

    #[test]
    fn empty_header() {
        let header = RecordingHeader::new();
        assert!(!header.has_content());
        assert_eq!(header.total_size(), HEADER_SIZE as u64);
        assert_eq!(header.checksum_hex(), "0".repeat(64));
    }

    proptest! {
        #[test]
        fn size_is_independent_of_lengths(
            version in any::<u32>(),
            lengths in proptest::array::uniform4(any::<u32>()),
        ) {
            let header = RecordingHeader {
                version,
                checksum: [0xAB; CHECKSUM_LEN],
                events_length: lengths[0],
                document_length: lengths[1],
                audio_length: lengths[2],
                screen_capture_length: lengths[3],
            };
            let bytes = header.to_bytes();
            prop_assert_eq!(bytes.len(), RecordingHeader::header_size());
            prop_assert_eq!(RecordingHeader::parse_from(&bytes).unwrap(), header);

            let expected: u64 = HEADER_SIZE as u64 + lengths.iter().map(|l| u64::from(*l)).sum::<u64>();
            prop_assert_eq!(header.total_size(), expected);
        }
    }
}
