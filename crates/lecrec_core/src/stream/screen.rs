//! Screen-capture view and background parsing.
//!
//! Frame indexing belongs to an external decoder. This module only hands it
//! a window over the section and runs it off the calling thread, so a slow
//! or failing decode never holds up the rest of a loaded recording.

use crate::container::ScreenCaptureSource;
use crate::error::{RecordingError, RecordingResult};
use crate::progress::ProgressCallback;
use crate::stream::window::WindowedStream;
use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// The screen-capture section of a recording.
#[derive(Debug)]
pub struct ScreenCaptureStream {
    window: WindowedStream,
    declared_len: u64,
}

impl ScreenCaptureStream {
    /// Wraps a window whose header-declared length is `declared_len`.
    #[must_use]
    pub fn new(window: WindowedStream, declared_len: u64) -> Self {
        Self {
            window,
            declared_len,
        }
    }

    /// Declared section length.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.declared_len
    }

    /// Returns whether the section is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared_len == 0
    }

    /// The underlying window.
    #[must_use]
    pub fn window(&self) -> &WindowedStream {
        &self.window
    }

    /// Mutable access to the underlying window.
    pub fn window_mut(&mut self) -> &mut WindowedStream {
        &mut self.window
    }

    /// Creates an independent view starting at the section start.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` if the window was closed.
    pub fn try_clone(&self) -> RecordingResult<Self> {
        Ok(Self::new(self.window.try_clone()?, self.declared_len))
    }

    /// Reads the whole section into memory.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` if the window was closed, or a storage error.
    pub fn read_all(&self) -> RecordingResult<Vec<u8>> {
        self.window.try_clone()?.read_to_end_vec()
    }
}

impl ScreenCaptureSource for ScreenCaptureStream {
    fn len_hint(&self) -> Option<u64> {
        Some(self.declared_len)
    }

    fn write_to(&mut self, out: &mut dyn Write) -> io::Result<u64> {
        let mut copy = self.window.try_clone().map_err(io::Error::from)?;
        io::copy(&mut copy, out)
    }
}

/// Decodes a screen-capture section into an application-defined value.
pub trait ScreenCaptureParser: Send + 'static {
    /// Decoded result.
    type Output: Send + 'static;

    /// Parses the section.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be decoded.
    fn parse(
        &self,
        stream: ScreenCaptureStream,
        progress: ProgressCallback<'_>,
    ) -> RecordingResult<Self::Output>;
}

/// Handle to a screen-capture parse running on a background thread.
#[derive(Debug)]
pub struct ScreenCaptureTask<T> {
    handle: JoinHandle<RecordingResult<T>>,
}

impl<T: Send + 'static> ScreenCaptureTask<T> {
    /// Starts `parser` on its own thread.
    ///
    /// `progress` is called from the parsing thread.
    pub fn spawn<P, F>(parser: P, stream: ScreenCaptureStream, mut progress: Option<F>) -> Self
    where
        P: ScreenCaptureParser<Output = T>,
        F: FnMut(f32) + Send + 'static,
    {
        let handle = thread::spawn(move || {
            let len = stream.len();
            let callback = progress.as_mut().map(|f| f as &mut dyn FnMut(f32));
            let result = parser.parse(stream, callback);
            match &result {
                Ok(_) => debug!(len, "screen capture parsed"),
                Err(e) => warn!(error = %e, len, "screen capture parse failed"),
            }
            result
        });
        Self { handle }
    }

    /// Returns whether the parse has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the parse ends and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the parser's error, or `BackgroundTask` if it panicked.
    pub fn wait(self) -> RecordingResult<T> {
        self.handle.join().unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "screen capture parser panicked".to_string());
            warn!(%message, "screen capture parser panicked");
            Err(RecordingError::background_task(message))
        })
    }
}
