//! Recording container format.
//!
//! A recording is a single file holding a fixed-size header followed by four
//! sections with no padding between them:
//!
//! ```text
//! | header (52) | events | document | audio | screen capture |
//! ```
//!
//! The header stores the format version, a SHA-256 checksum over all section
//! bytes, and the length of each section. Section offsets are the running sum
//! of the header size and the preceding lengths.

mod header;
mod reader;
mod section;
mod writer;

pub use header::{RecordingHeader, FORMAT_VERSION, HEADER_SIZE};
pub use reader::{RecordingHandle, RecordingParts, RecordingReader};
pub use section::{ScreenCaptureSource, SectionKind, SectionPayload, SectionRegion};
pub use writer::{RecordingSections, RecordingWriter};
