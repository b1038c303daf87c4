//! Error Types
//!
//! One error enum shared by the store, the scorer and the collaborators.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Slot {slot_id} not found (store holds {count} vectors)")]
    NotFound { slot_id: usize, count: usize },

    #[error("Cosine similarity undefined for a zero-magnitude vector")]
    ZeroVector,

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("Input text is empty")]
    EmptyInput,

    #[error("Corrupt store at {path:?}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
