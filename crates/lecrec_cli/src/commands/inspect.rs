//! Inspect command implementation.

use lecrec_core::{RecordingReader, SampleEncoding, SectionKind, HEADER_SIZE};
use lecrec_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;

/// Recording inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Recording path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Format version stored in the header.
    pub version: u32,
    /// Hex-encoded SHA-256 checksum stored in the header.
    pub checksum: String,
    /// Header size in bytes.
    pub header_size: usize,
    /// Section layout in file order.
    pub sections: Vec<SectionInfo>,
    /// Audio track details, absent for an empty track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioInfo>,
}

/// Layout of a single section.
#[derive(Debug, Serialize)]
pub struct SectionInfo {
    /// Section name.
    pub name: &'static str,
    /// Absolute offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub length: u64,
}

/// Audio track details.
#[derive(Debug, Serialize)]
pub struct AudioInfo {
    /// Frames per second.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Sample encoding (pcm, float).
    pub encoding: &'static str,
    /// WAV sub-header length.
    pub header_len: u64,
    /// Sample data length.
    pub data_len: u64,
    /// Playback length.
    pub duration_ms: u64,
}

/// Collects inspection data for a recording.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No recording found at {:?}", path).into());
    }

    let file_size = FileBackend::open_read_only(path)?.size()?;
    let handle = RecordingReader::default().read(path)?;
    let header = handle.header();

    let sections = SectionKind::ALL
        .iter()
        .map(|kind| {
            let region = header.region(*kind);
            SectionInfo {
                name: kind.name(),
                offset: region.offset,
                length: region.length,
            }
        })
        .collect();

    let audio = handle.audio().format().map(|format| AudioInfo {
        sample_rate: format.sample_rate,
        channels: format.channels,
        bits_per_sample: format.bits_per_sample,
        encoding: match format.encoding {
            SampleEncoding::Pcm => "pcm",
            SampleEncoding::Float => "float",
        },
        header_len: handle.audio().header_len(),
        data_len: handle.audio().data_len(),
        duration_ms: handle.duration_millis(),
    });

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size,
        version: header.version,
        checksum: header.checksum_hex(),
        header_size: HEADER_SIZE,
        sections,
        audio,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Recording: {}", result.path);
    println!();
    println!("Header:");
    println!("  Format version: {}", result.version);
    println!("  Header size:    {} bytes", result.header_size);
    println!("  Checksum:       {}", result.checksum);
    println!();
    println!("Sections:");
    for section in &result.sections {
        println!(
            "  {:<15} offset {:>10}  length {:>10}",
            section.name, section.offset, section.length
        );
    }
    println!();
    match &result.audio {
        Some(audio) => {
            println!("Audio:");
            println!(
                "  {} Hz, {} channel(s), {}-bit {}",
                audio.sample_rate, audio.channels, audio.bits_per_sample, audio.encoding
            );
            println!("  Sub-header: {} bytes", audio.header_len);
            println!("  Data:       {} bytes", audio.data_len);
            println!("  Duration:   {}", format_duration(audio.duration_ms));
        }
        None => println!("Audio: (empty)"),
    }
    println!();
    println!("Total size: {}", format_bytes(result.file_size));
}

fn format_duration(millis: u64) -> String {
    let seconds = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60,
        millis % 1000
    )
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
