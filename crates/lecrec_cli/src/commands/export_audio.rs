//! Export-audio command implementation.

use lecrec_core::{AudioExporter, ExportConfig, RecordingReader};
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// Optional playback window for the export.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipRange {
    /// Start offset in milliseconds.
    pub start_ms: Option<u64>,
    /// End offset in milliseconds.
    pub end_ms: Option<u64>,
}

/// Runs the export-audio command.
pub fn run(
    path: &Path,
    output: &Path,
    lead_in_ms: u64,
    range: ClipRange,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Exporting audio from {:?}", path);

    let mut handle = RecordingReader::default().read(path)?;
    if range.start_ms.is_some() || range.end_ms.is_some() {
        let start = range.start_ms.unwrap_or(0);
        let end = range.end_ms.unwrap_or_else(|| handle.duration_millis());
        handle.audio_mut().add_exclusive_millis(start, end)?;
    }

    let exporter = AudioExporter::new(ExportConfig::new().lead_in_silence_ms(lead_in_ms));
    let mut line = ProgressLine::new(io::stdout());
    let mut report = |p: f32| line.update(p);
    let summary = exporter.export_audio(handle.audio(), output, Some(&mut report))?;
    line.finish()?;

    println!("✓ Audio exported successfully");
    println!("  Path: {:?}", output);
    println!(
        "  Format: {} Hz, {} channel(s), {}-bit",
        summary.format.sample_rate, summary.format.channels, summary.format.bits_per_sample
    );
    println!("  Data: {} bytes", summary.bytes_written);
    println!("  Duration: {} ms", summary.duration_ms);

    Ok(())
}

/// Single-line percentage display, redrawn in 10% steps.
///
/// The first write error stops further output and is returned by `finish`.
struct ProgressLine<W: Write> {
    out: W,
    last_percent: u32,
    error: Option<io::Error>,
}

impl<W: Write> ProgressLine<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            last_percent: 0,
            error: None,
        }
    }

    fn update(&mut self, progress: f32) {
        if self.error.is_some() {
            return;
        }
        let percent = (progress * 100.0) as u32;
        if percent >= self.last_percent + 10 || (percent == 100 && self.last_percent != 100) {
            self.last_percent = percent;
            let result = write!(self.out, "\r  {:>3}%", percent).and_then(|()| self.out.flush());
            if let Err(e) = result {
                self.error = Some(e);
            }
        }
    }

    fn finish(mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => writeln!(self.out),
        }
    }
}
