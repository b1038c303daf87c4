//! Embedding Module
//!
//! Collaborator traits for turning text into vectors and terms, with local
//! reference implementations.

mod hash;
mod vocabulary;

pub use hash::HashEmbedder;
pub use vocabulary::VocabularyExtractor;

use crate::error::Result;

/// Text -> fixed-length embedding.
///
/// Implementations must be deterministic for identical input within a
/// process and reject blank text with `Error::EmptyInput`.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed several texts, in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Text -> ordered, deduplicated keyword list.
///
/// Blank text is rejected with `Error::EmptyInput`.
pub trait TermExtractor: Send + Sync {
    fn extract_terms(&self, text: &str) -> Result<Vec<String>>;
}
