//! Hash Embedder
//!
//! Feature-hashing bag of tokens and token bigrams. No model, no network;
//! good enough for tests, demos and offline scoring.

use xxhash_rust::xxh64::xxh64;

use super::Embedder;
use crate::error::{Error, Result};
use crate::scoring::tokenize;
use crate::vector::normalize_vector;

const UNIGRAM_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

const UNIGRAM_SEED: u64 = 0;
const BIGRAM_SEED: u64 = 1;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be > 0".into()));
        }
        Ok(Self { dimension })
    }

    /// xxh64 is a fixed algorithm, so stored embeddings keep matching new
    /// queries across toolchain upgrades.
    fn bucket(&self, feature: &str, seed: u64) -> usize {
        (xxh64(feature.as_bytes(), seed) % self.dimension as u64) as usize
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            vector[self.bucket(token, UNIGRAM_SEED)] += UNIGRAM_WEIGHT;
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            vector[self.bucket(&bigram, BIGRAM_SEED)] += BIGRAM_WEIGHT;
        }

        normalize_vector(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{cosine_similarity_01, magnitude};

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64).unwrap();
        let a = embedder.embed("Senior Rust engineer, distributed systems").unwrap();
        let b = embedder.embed("Senior Rust engineer, distributed systems").unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((magnitude(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bucket_layout_is_pinned() {
        // Fixed positions: a change here invalidates every persisted store
        let embedder = HashEmbedder::new(64).unwrap();
        let v = embedder.embed("Rust Python").unwrap();

        let nonzero: Vec<(usize, f32)> = v
            .iter()
            .enumerate()
            .filter(|(_, x)| **x != 0.0)
            .map(|(i, x)| (i, *x))
            .collect();
        let slots: Vec<usize> = nonzero.iter().map(|(i, _)| *i).collect();
        assert_eq!(slots, vec![12, 13, 35]);
        assert!((v[12] - 2.0 / 3.0).abs() < 1e-6);
        assert!((v[13] - 1.0 / 3.0).abs() < 1e-6);
        assert!((v[35] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_related_text_scores_higher() {
        let embedder = HashEmbedder::new(384).unwrap();
        let doc = embedder.embed("python django postgresql rest api").unwrap();
        let near = embedder.embed("python django rest api developer").unwrap();
        let far = embedder.embed("watercolor painting and pottery").unwrap();

        let near_sim = cosine_similarity_01(&doc, &near).unwrap();
        let far_sim = cosine_similarity_01(&doc, &far).unwrap();
        assert!(near_sim > far_sim);
    }

    #[test]
    fn test_blank_rejected() {
        let embedder = HashEmbedder::new(8).unwrap();
        assert!(matches!(embedder.embed("   \n"), Err(Error::EmptyInput)));
        assert!(matches!(embedder.embed("!!! ..."), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_batch_preserves_order() {
        let embedder = HashEmbedder::new(16).unwrap();
        let batch = embedder.embed_batch(&["alpha", "beta"]).unwrap();
        assert_eq!(batch[0], embedder.embed("alpha").unwrap());
        assert_eq!(batch[1], embedder.embed("beta").unwrap());
    }
}
