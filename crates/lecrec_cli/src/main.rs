//! lecrec CLI
//!
//! Command-line tools for lecture recording containers.
//!
//! # Commands
//!
//! - `inspect` - Display the header, section layout and audio format
//! - `verify` - Recompute the checksum and compare it with the header
//! - `export-audio` - Write the audio track to a standalone WAV file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// lecrec command-line recording tools.
#[derive(Parser)]
#[command(name = "lecrec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the recording file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, sections and audio format
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify the recording checksum
    Verify,

    /// Export the audio track to a WAV file
    ExportAudio {
        /// Destination WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Milliseconds of silence at the start of the export
        #[arg(long, default_value_t = lecrec_core::DEFAULT_LEAD_IN_SILENCE_MS)]
        lead_in_ms: u64,

        /// Only export from this offset (milliseconds)
        #[arg(long)]
        start_ms: Option<u64>,

        /// Only export up to this offset (milliseconds)
        #[arg(long)]
        end_ms: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Recording path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Recording path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::ExportAudio {
            output,
            lead_in_ms,
            start_ms,
            end_ms,
        } => {
            let path = cli.path.ok_or("Recording path required for export-audio")?;
            let range = commands::export_audio::ClipRange {
                start_ms,
                end_ms,
            };
            commands::export_audio::run(&path, &output, lead_in_ms, range)?;
        }
        Commands::Version => {
            println!("lecrec CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("lecrec core v{}", lecrec_core::VERSION);
            println!("Recording format v{}", lecrec_core::FORMAT_VERSION);
        }
    }

    Ok(())
}
