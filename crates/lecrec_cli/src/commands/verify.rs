//! Verify command implementation.

use lecrec_core::RecordingReader;
use std::path::Path;
use tracing::info;

/// Runs the verify command.
///
/// Fails if the stored checksum does not match the section bytes.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying recording at {:?}", path);
    println!();

    let handle = RecordingReader::default().read(path)?;
    let stored = handle.header().checksum_hex();
    let computed: String = handle
        .compute_checksum()?
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    info!(%stored, %computed, "checksum recomputed");

    println!("  Stored:   {}", stored);
    println!("  Computed: {}", computed);
    println!();

    if stored == computed {
        println!("✓ Recording verification passed");
        Ok(())
    } else {
        println!("✗ Recording verification failed");
        Err("Verification failed".into())
    }
}
