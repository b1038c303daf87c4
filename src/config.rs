//! Configuration

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::scoring::{ScorerConfig, TermMatchMode, DEFAULT_SEMANTIC_WEIGHT};
use crate::vector::{CheckpointMode, DEFAULT_DIMENSION};

/// Matcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Vector file of the store; metadata sits next to it
    pub index_path: PathBuf,

    /// Embedding dimension
    pub dimension: usize,

    /// When the store writes to disk
    pub checkpoint: CheckpointMode,

    /// Share of semantic similarity in the blended score
    pub semantic_weight: f64,

    /// Term comparison rule
    pub term_match: TermMatchMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/vecmatch.vdx"),
            dimension: DEFAULT_DIMENSION,
            checkpoint: CheckpointMode::Always,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            term_match: TermMatchMode::Substring,
        }
    }
}

impl Config {
    pub fn with_index_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.index_path = path.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_checkpoint(mut self, mode: CheckpointMode) -> Self {
        self.checkpoint = mode;
        self
    }

    pub fn with_semantic_weight(mut self, weight: f64) -> Self {
        self.semantic_weight = weight;
        self
    }

    pub fn with_term_match(mut self, mode: TermMatchMode) -> Self {
        self.term_match = mode;
        self
    }

    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig::default()
            .with_semantic_weight(self.semantic_weight)
            .with_term_match(self.term_match)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be > 0".into()));
        }
        self.scorer_config().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.semantic_weight, 0.6);
        assert_eq!(config.checkpoint, CheckpointMode::Always);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().with_dimension(0).validate().is_err());
        assert!(Config::default().with_semantic_weight(1.2).validate().is_err());
        assert!(Config::default().with_semantic_weight(0.0).validate().is_ok());
    }
}
