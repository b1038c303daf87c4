//! vecmatch - Hybrid Document Matching
//!
//! Scores a candidate document against a target description by blending
//! embedding similarity with keyword overlap, backed by a persistent exact
//! nearest-neighbor vector store.

pub mod config;
pub mod embedding;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod persistence;
pub mod scoring;
pub mod vector;

pub use config::Config;
pub use embedding::{Embedder, HashEmbedder, TermExtractor, VocabularyExtractor};
pub use error::{Error, Result};
pub use matcher::{MatchReport, Matcher};
pub use metrics::{Metrics, Operation};
pub use scoring::{MatchResult, MatchScorer, MatchTier, ScorerConfig, TermMatchMode, TermOverlap};
pub use vector::{CheckpointMode, SearchHit, VectorStore, DEFAULT_DIMENSION};
