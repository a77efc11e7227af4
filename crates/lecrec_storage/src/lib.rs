//! # lecrec Storage
//!
//! Positioned byte stores for lecrec recording containers.
//!
//! This crate provides the lowest-level storage abstraction used by the
//! container reader and the windowed streams. Storage backends are
//! **opaque byte stores** - they do not interpret the data they store.
//!
//! ## Design Principles
//!
//! - Backends are simple read-only byte stores (positioned read, size)
//! - No knowledge of container headers, sections or audio formats
//! - Must be `Send + Sync` so many stream cursors can share one backend
//! - The core crate owns all file format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and recordings built in memory
//! - [`FileBackend`] - For recordings on disk using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use lecrec_storage::{StorageBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::with_data(b"hello world".to_vec());
//! let data = backend.read_at(0, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//!
//! // Positioned reads past the end are short, not errors.
//! let mut buf = [0u8; 8];
//! assert_eq!(backend.read_into(6, &mut buf).unwrap(), 5);
//! assert_eq!(backend.read_into(11, &mut buf).unwrap(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
