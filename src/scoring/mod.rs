//! Scoring Module
//!
//! Hybrid semantic + lexical match scoring.

mod scorer;
mod terms;

pub use scorer::{
    explain, round2, MatchResult, MatchScorer, MatchTier, ScorerConfig, DEFAULT_SEMANTIC_WEIGHT,
    MODERATE_MATCH_THRESHOLD, STRONG_MATCH_THRESHOLD,
};
pub use terms::{term_overlap, TermMatchMode, TermOverlap};

pub(crate) use terms::tokenize;
