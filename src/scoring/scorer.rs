//! Match Scorer
//!
//! Fuses semantic similarity and term overlap into one bounded percentage,
//! and turns that percentage into a tiered explanation.

use std::fmt;

use super::terms::{term_overlap, TermMatchMode, TermOverlap};
use crate::error::{Error, Result};
use crate::vector::cosine_similarity_01;

/// Default share of the semantic signal in the blended score
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.6;

/// Lower bound (inclusive) of the strong tier
pub const STRONG_MATCH_THRESHOLD: f64 = 75.0;
/// Lower bound (inclusive) of the moderate tier
pub const MODERATE_MATCH_THRESHOLD: f64 = 50.0;

const MODERATE_MISSING_SHOWN: usize = 3;
const LOW_MISSING_SHOWN: usize = 5;

/// Round to 2 decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scorer configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerConfig {
    /// Weight of semantic similarity; term overlap gets `1 - weight`
    pub semantic_weight: f64,
    /// Term comparison rule
    pub term_match: TermMatchMode,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            term_match: TermMatchMode::Substring,
        }
    }
}

impl ScorerConfig {
    pub fn with_semantic_weight(mut self, weight: f64) -> Self {
        self.semantic_weight = weight;
        self
    }

    pub fn with_term_match(mut self, mode: TermMatchMode) -> Self {
        self.term_match = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.semantic_weight) {
            return Err(Error::InvalidConfig(format!(
                "semantic weight must be within [0, 1], got {}",
                self.semantic_weight
            )));
        }
        Ok(())
    }
}

/// Coarse verdict derived from the match percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Strong,
    Moderate,
    Low,
}

impl MatchTier {
    pub fn from_percentage(match_percentage: f64) -> Self {
        if match_percentage >= STRONG_MATCH_THRESHOLD {
            MatchTier::Strong
        } else if match_percentage >= MODERATE_MATCH_THRESHOLD {
            MatchTier::Moderate
        } else {
            MatchTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Strong => "Strong match",
            MatchTier::Moderate => "Moderate match",
            MatchTier::Low => "Low match",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of scoring one document against one target
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Blended score in [0, 100]
    pub match_percentage: f64,
    /// Semantic similarity in [0, 100]
    pub semantic_score: f64,
    /// Term overlap in [0, 100]
    pub skill_overlap_score: f64,
    pub matched_terms: Vec<String>,
    pub missing_terms: Vec<String>,
}

impl MatchResult {
    pub fn tier(&self) -> MatchTier {
        MatchTier::from_percentage(self.match_percentage)
    }
}

/// Stateless hybrid scorer. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    config: ScorerConfig,
}

impl MatchScorer {
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Cosine similarity rescaled to [0, 1]
    pub fn cosine_similarity_01(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        cosine_similarity_01(a, b)
    }

    pub fn term_overlap<T, I, S>(&self, target_terms: &[T], source_terms: I) -> TermOverlap
    where
        T: AsRef<str>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        term_overlap(target_terms, source_terms, self.config.term_match)
    }

    /// Weighted blend as a percentage rounded to 2 decimals.
    ///
    /// Finite inputs are clamped to [0, 1]; NaN or infinity is an error.
    pub fn score(&self, semantic_sim: f64, overlap_ratio: f64) -> Result<f64> {
        if !semantic_sim.is_finite() {
            return Err(Error::NonFinite("semantic similarity"));
        }
        if !overlap_ratio.is_finite() {
            return Err(Error::NonFinite("overlap ratio"));
        }
        let w = self.config.semantic_weight;
        let sim = semantic_sim.clamp(0.0, 1.0);
        let ratio = overlap_ratio.clamp(0.0, 1.0);
        Ok(round2((sim * w + ratio * (1.0 - w)) * 100.0))
    }

    /// Tiered summary of a match percentage.
    pub fn explain<M, S>(&self, match_percentage: f64, matched: &[M], missing: &[S]) -> String
    where
        M: AsRef<str>,
        S: AsRef<str>,
    {
        explain(match_percentage, matched, missing)
    }

    /// Score one document against one target
    pub fn evaluate<T, I, S>(
        &self,
        document_embedding: &[f32],
        target_embedding: &[f32],
        target_terms: &[T],
        source_terms: I,
    ) -> Result<MatchResult>
    where
        T: AsRef<str>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let semantic = self.cosine_similarity_01(document_embedding, target_embedding)?;
        let overlap = self.term_overlap(target_terms, source_terms);
        let match_percentage = self.score(semantic, overlap.overlap_ratio)?;

        Ok(MatchResult {
            match_percentage,
            semantic_score: round2(semantic * 100.0),
            skill_overlap_score: round2(overlap.overlap_ratio * 100.0),
            matched_terms: overlap.matched,
            missing_terms: overlap.missing,
        })
    }
}

fn join_first<S: AsRef<str>>(terms: &[S], n: usize) -> String {
    terms
        .iter()
        .take(n)
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tiered summary. The 75/50 cutoffs and the 3/5 truncation are fixed.
pub fn explain<M, S>(match_percentage: f64, matched: &[M], missing: &[S]) -> String
where
    M: AsRef<str>,
    S: AsRef<str>,
{
    let tier = MatchTier::from_percentage(match_percentage);
    match tier {
        MatchTier::Strong => format!(
            "{} ({:.2}%). The candidate aligns well with the target requirements. \
             Matched {} key terms.",
            tier,
            match_percentage,
            matched.len()
        ),
        MatchTier::Moderate if missing.is_empty() => format!(
            "{} ({:.2}%). The candidate has {} matching terms.",
            tier,
            match_percentage,
            matched.len()
        ),
        MatchTier::Moderate => format!(
            "{} ({:.2}%). The candidate has {} matching terms. Consider developing: {}.",
            tier,
            match_percentage,
            matched.len(),
            join_first(missing, MODERATE_MISSING_SHOWN)
        ),
        MatchTier::Low if matched.is_empty() && missing.is_empty() => format!(
            "{} ({:.2}%). No target terms were available to compare.",
            tier, match_percentage
        ),
        MatchTier::Low if missing.is_empty() => format!(
            "{} ({:.2}%). All {} target terms matched, but the overall semantic fit is weak.",
            tier,
            match_percentage,
            matched.len()
        ),
        MatchTier::Low => format!(
            "{} ({:.2}%). Focus on acquiring these critical terms: {}.",
            tier,
            match_percentage,
            join_first(missing, LOW_MISSING_SHOWN)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_score_bounds() {
        let scorer = MatchScorer::default();
        assert_eq!(scorer.score(1.0, 1.0).unwrap(), 100.0);
        assert_eq!(scorer.score(0.0, 0.0).unwrap(), 0.0);
        assert_eq!(scorer.score(0.5, 0.5).unwrap(), 50.0);
    }

    #[test]
    fn test_score_weighting_and_rounding() {
        let scorer = MatchScorer::default();
        // 0.8 * 0.6 + 0.5 * 0.4 = 0.68
        assert_eq!(scorer.score(0.8, 0.5).unwrap(), 68.0);
        // 0.123456 * 0.6 * 100 = 7.40736
        assert_eq!(scorer.score(0.123456, 0.0).unwrap(), 7.41);

        let semantic_only =
            MatchScorer::new(ScorerConfig::default().with_semantic_weight(1.0)).unwrap();
        assert_eq!(semantic_only.score(0.25, 1.0).unwrap(), 25.0);
    }

    #[test]
    fn test_score_rejects_non_finite() {
        let scorer = MatchScorer::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(scorer.score(bad, 0.5), Err(Error::NonFinite(_))));
            assert!(matches!(scorer.score(0.5, bad), Err(Error::NonFinite(_))));
        }
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(12.3449), 12.34);
    }

    #[test]
    fn test_invalid_weight_rejected() {
        for w in [-0.1, 1.5, f64::NAN] {
            let config = ScorerConfig::default().with_semantic_weight(w);
            assert!(matches!(MatchScorer::new(config), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(MatchTier::from_percentage(75.0), MatchTier::Strong);
        assert_eq!(MatchTier::from_percentage(74.99), MatchTier::Moderate);
        assert_eq!(MatchTier::from_percentage(50.0), MatchTier::Moderate);
        assert_eq!(MatchTier::from_percentage(49.99), MatchTier::Low);
    }

    #[test]
    fn test_explain_strong() {
        let text = explain(75.0, &["Python", "SQL"], &NONE);
        assert!(text.starts_with("Strong match (75.00%)."));
        assert!(text.contains("Matched 2 key terms."));
    }

    #[test]
    fn test_explain_moderate_shows_three_missing() {
        let missing = ["AWS", "Docker", "Kubernetes", "Git", "CSS"];
        let text = explain(74.99, &["Python"], &missing);
        assert!(text.starts_with("Moderate match (74.99%)."));
        assert!(text.contains("has 1 matching terms"));
        assert!(text.ends_with("Consider developing: AWS, Docker, Kubernetes."));
    }

    #[test]
    fn test_explain_low_shows_five_missing() {
        let missing = ["A", "B", "C", "D", "E", "F", "G"];
        let text = explain(12.5, &NONE, &missing);
        assert!(text.starts_with("Low match (12.50%)."));
        assert!(text.ends_with("critical terms: A, B, C, D, E."));
    }

    #[test]
    fn test_explain_low_without_target_terms() {
        let text = explain(30.0, &NONE, &NONE);
        assert_eq!(text, "Low match (30.00%). No target terms were available to compare.");
    }

    #[test]
    fn test_explain_low_with_every_term_matched() {
        let scorer = MatchScorer::default();
        // Opposite embeddings: semantic 0, overlap 1 -> 40%
        let result = scorer
            .evaluate(&[1.0, 0.0], &[-1.0, 0.0], &["Python"], ["python"])
            .unwrap();
        assert_eq!(result.match_percentage, 40.0);
        assert!(result.missing_terms.is_empty());

        let text = scorer.explain(
            result.match_percentage,
            &result.matched_terms,
            &result.missing_terms,
        );
        assert_eq!(
            text,
            "Low match (40.00%). All 1 target terms matched, but the overall semantic fit is weak."
        );
    }

    #[test]
    fn test_evaluate() {
        let scorer = MatchScorer::default();
        let doc = [1.0, 0.0, 0.0];
        let target = [1.0, 0.0, 0.0];

        let result = scorer
            .evaluate(&doc, &target, &["Rust", "Go"], ["golang", "python"])
            .unwrap();
        assert_eq!(result.semantic_score, 100.0);
        assert_eq!(result.skill_overlap_score, 50.0);
        // 1.0 * 0.6 + 0.5 * 0.4
        assert_eq!(result.match_percentage, 80.0);
        assert_eq!(result.matched_terms, vec!["Go"]);
        assert_eq!(result.missing_terms, vec!["Rust"]);
        assert_eq!(result.tier(), MatchTier::Strong);
    }

    #[test]
    fn test_evaluate_zero_vector() {
        let scorer = MatchScorer::default();
        let result = scorer.evaluate(&[0.0, 0.0], &[1.0, 0.0], &NONE, NONE);
        assert!(matches!(result, Err(Error::ZeroVector)));
    }
}
