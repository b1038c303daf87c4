//! Vector Module
//!
//! Vector math kernels and the persistent exact-search vector store.

pub mod similarity;
mod vector_store;

pub use similarity::{
    cosine_similarity, cosine_similarity_01, dot_product, magnitude, normalize_vector,
    squared_l2_distance,
};
pub use vector_store::{CheckpointMode, SearchHit, VectorStore, DEFAULT_DIMENSION};
