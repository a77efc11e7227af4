//! Region-scoped streams over a loaded recording.
//!
//! - [`WindowedStream`]: generic seekable cursor confined to one section
//! - [`AudioStream`]: PCM view with time-based seeking and exclusions
//! - [`ScreenCaptureStream`]: screen-capture view with background parsing

mod audio;
mod exclusion;
mod format;
mod screen;
mod window;

#[cfg(test)]
pub(crate) use audio::fixtures;
pub use audio::AudioStream;
pub use exclusion::{ByteExclusions, ExclusionSet, MillisInterval};
pub use format::{AudioFormat, SampleEncoding};
pub use screen::{ScreenCaptureParser, ScreenCaptureStream, ScreenCaptureTask};
pub use window::{StreamState, WindowedStream};
