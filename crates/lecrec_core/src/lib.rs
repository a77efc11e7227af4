//! # lecrec Core
//!
//! Container format and track streams for lecture recordings.
//!
//! A recording bundles four tracks into one file: an interaction events log,
//! a document snapshot, an audio track and a screen-capture track. This
//! crate provides:
//!
//! - [`RecordingWriter`]: two-pass writer with a SHA-256 checksum over all
//!   section bytes and a header patched in last
//! - [`RecordingReader`]: version-gated reader returning a [`RecordingHandle`]
//! - [`WindowedStream`]: seekable, cloneable cursors confined to one section
//!   of a shared backend
//! - [`AudioStream`]: millisecond seeking and non-destructive exclusion
//!   intervals over the audio track
//! - [`AudioExporter`]: export of the playable audio to a standalone WAV file
//!
//! ## Example
//!
//! ```rust
//! use lecrec_core::{AudioStream, RecordingReader, RecordingSections, RecordingWriter};
//!
//! let audio = AudioStream::empty();
//! let (events, document) = (Vec::<u8>::new(), Vec::<u8>::new());
//!
//! let bytes = RecordingWriter::default()
//!     .write_to_bytes(RecordingSections::new(&events, &document, &audio), None)
//!     .unwrap();
//! assert_eq!(bytes.len(), lecrec_core::HEADER_SIZE);
//!
//! let handle = RecordingReader::default().read_bytes(bytes).unwrap();
//! assert!(!handle.header().has_content());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Crate version, as recorded in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
pub mod container;
mod digest;
mod error;
mod export;
mod progress;
pub mod stream;

pub use config::{
    ExportConfig, ReaderConfig, WriterConfig, DEFAULT_EXPORT_CHUNK_SIZE,
    DEFAULT_LEAD_IN_SILENCE_MS, DEFAULT_WRITE_CHUNK_SIZE,
};
pub use container::{
    RecordingHandle, RecordingHeader, RecordingParts, RecordingReader, RecordingSections,
    RecordingWriter, ScreenCaptureSource, SectionKind, SectionPayload, SectionRegion,
    FORMAT_VERSION, HEADER_SIZE,
};
pub use digest::{checksum_of, Checksum, DigestFile, DigestWriter, CHECKSUM_LEN};
pub use error::{RecordingError, RecordingResult};
pub use export::{AudioExporter, ExportSummary};
pub use progress::ProgressCallback;
pub use stream::{
    AudioFormat, AudioStream, ByteExclusions, ExclusionSet, MillisInterval, SampleEncoding,
    ScreenCaptureParser, ScreenCaptureStream, ScreenCaptureTask, StreamState, WindowedStream,
};
