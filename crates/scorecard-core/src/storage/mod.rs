//! Storage layer
//!
//! Persists the envelope behind the `EnvelopeBackend` trait so the store can
//! run against a real file or an in-memory buffer.
//!
//! ## Backends
//!
//! - **FileBackend**: one JSON file, written atomically (temp file + rename)
//! - **MemoryBackend**: a mutex-guarded string, for tests and throwaway stores

pub mod backend;
pub mod error;

pub use backend::{EnvelopeBackend, FileBackend, MemoryBackend, StorageStats};
pub use error::{StorageError, StorageResult};
