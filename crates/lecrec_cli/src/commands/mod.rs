//! CLI command implementations.

pub mod export_audio;
pub mod inspect;
pub mod verify;
