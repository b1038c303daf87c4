//! Document Matcher
//!
//! Wires the embedder, the term extractor, the vector store and the scorer
//! into the document-vs-target flow.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::embedding::{Embedder, TermExtractor};
use crate::error::{Error, Result};
use crate::metrics::{Metrics, Operation};
use crate::scoring::{MatchResult, MatchScorer, MatchTier};
use crate::vector::{SearchHit, VectorStore};

/// Scored comparison plus its explanation
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub result: MatchResult,
    pub explanation: String,
    pub tier: MatchTier,
    /// Slot the document embedding was stored in, if it was stored
    pub slot_id: Option<usize>,
}

pub struct Matcher<E, X> {
    embedder: E,
    extractor: X,
    scorer: MatchScorer,
    store: Arc<VectorStore>,
    metrics: Arc<Metrics>,
}

impl<E: Embedder, X: TermExtractor> Matcher<E, X> {
    /// The embedder must produce vectors of the store's dimension.
    pub fn new(embedder: E, extractor: X, scorer: MatchScorer, store: Arc<VectorStore>) -> Result<Self> {
        if embedder.dimension() != store.dimension() {
            return Err(Error::DimensionMismatch {
                expected: store.dimension(),
                actual: embedder.dimension(),
            });
        }
        Ok(Self {
            embedder,
            extractor,
            scorer,
            store,
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Open the configured store and build a matcher around it
    pub fn open(config: &Config, embedder: E, extractor: X) -> Result<Self> {
        config.validate()?;
        let store = VectorStore::open(&config.index_path, config.dimension)?
            .with_checkpoint(config.checkpoint);
        let scorer = MatchScorer::new(config.scorer_config())?;
        Self::new(embedder, extractor, scorer, Arc::new(store))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    fn timed<T>(&self, op: Operation, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = f();
        match &result {
            Ok(_) => self.metrics.record_operation(op, start.elapsed()),
            Err(_) => self.metrics.record_failure(op, start.elapsed()),
        }
        result
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.timed(Operation::Embed, || self.embedder.embed(text))
    }

    /// Embed a document and store it under `doc_id`
    pub fn index_document(&self, doc_id: i64, text: &str) -> Result<usize> {
        let embedding = self.embed(text)?;
        let slot_id = self.timed(Operation::Insert, || self.store.insert(doc_id, &embedding))?;
        debug!("Indexed document {} at slot {}", doc_id, slot_id);
        Ok(slot_id)
    }

    fn score(&self, document_text: &str, target_text: &str) -> Result<(Vec<f32>, MatchReport)> {
        let document_terms = self.extractor.extract_terms(document_text)?;
        let target_terms = self.extractor.extract_terms(target_text)?;

        let document_embedding = self.embed(document_text)?;
        let target_embedding = self.embed(target_text)?;

        let result = self.timed(Operation::Score, || {
            self.scorer.evaluate(
                &document_embedding,
                &target_embedding,
                &target_terms,
                &document_terms,
            )
        })?;

        let explanation = self.scorer.explain(
            result.match_percentage,
            &result.matched_terms,
            &result.missing_terms,
        );
        let tier = result.tier();

        Ok((
            document_embedding,
            MatchReport {
                result,
                explanation,
                tier,
                slot_id: None,
            },
        ))
    }

    /// Score a document against a target and store the document embedding.
    ///
    /// The embedding is stored only after scoring succeeds.
    pub fn match_document(&self, doc_id: i64, document_text: &str, target_text: &str) -> Result<MatchReport> {
        let (embedding, mut report) = self.score(document_text, target_text)?;
        let slot_id = self.timed(Operation::Insert, || self.store.insert(doc_id, &embedding))?;
        report.slot_id = Some(slot_id);

        info!(
            "Document {} scored {:.2}% ({}), stored at slot {}",
            doc_id, report.result.match_percentage, report.tier, slot_id
        );
        Ok(report)
    }

    /// Score a document against a target without touching the store
    pub fn score_texts(&self, document_text: &str, target_text: &str) -> Result<MatchReport> {
        let (_, report) = self.score(document_text, target_text)?;
        Ok(report)
    }

    /// Stored documents nearest to `text`
    pub fn similar_documents(&self, text: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query = self.embed(text)?;
        self.timed(Operation::Search, || self.store.search(&query, k))
    }
}
