//! Persistence Module
//!
//! Crash-consistent snapshots of the vector store.

pub mod snapshot;

pub use snapshot::{metadata_path, LoadedSnapshot, SnapshotPresence, SnapshotView};
