//! Orchestration: the match and retrieve operations, index rebuild at
//! startup, and best-effort re-indexing.
//!
//! The pipeline is stateless across calls; all state lives in the
//! [`VectorIndex`] and the authoritative store. A failed external call
//! aborts the current operation — there are no internal retries.

use std::sync::Arc;

use tracing::{info, warn};

use crate::analyzer::SemanticAnalyzer;
use crate::config::MatchingConfig;
use crate::embedding::EmbeddingCapability;
use crate::error::{Error, Result};
use crate::index::{SearchHit, VectorIndex};
use crate::keywords::tokenize;
use crate::models::{Document, MatchResult, RetrievedDocument, ScoreComponents};
use crate::scoring::{fuse, keyword_score};
use crate::store::DocumentStore;

const SNIPPET_CHARS: usize = 240;

/// Ties tokenizer, scorers, index, and external capabilities into the
/// two user-facing operations.
///
/// The index is constructed by the caller and injected here; call
/// [`rebuild_from_store`](Self::rebuild_from_store) once at startup
/// before exposing the pipeline to concurrent callers.
pub struct MatchingPipeline<S> {
    store: S,
    index: Arc<VectorIndex>,
    embeddings: EmbeddingCapability,
    analyzer: Box<dyn SemanticAnalyzer>,
    config: MatchingConfig,
}

impl<S> std::fmt::Debug for MatchingPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> MatchingPipeline<S> {
    /// Build a pipeline, validating the fusion weight and over-fetch
    /// factor up front and checking that an enabled embedding provider
    /// agrees with the index dimension.
    pub fn new(
        store: S,
        index: Arc<VectorIndex>,
        embeddings: EmbeddingCapability,
        analyzer: Box<dyn SemanticAnalyzer>,
        config: MatchingConfig,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.semantic_weight) {
            return Err(Error::InvalidWeight(config.semantic_weight));
        }
        if config.overfetch_factor < 1 {
            return Err(Error::Config(
                "overfetch_factor must be >= 1".to_string(),
            ));
        }
        if let Some(dims) = embeddings.dims() {
            if dims != index.dims() {
                return Err(Error::DimensionMismatch {
                    expected: index.dims(),
                    actual: dims,
                });
            }
        }

        Ok(Self {
            store,
            index,
            embeddings,
            analyzer,
            config,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Score a document against a target description.
    ///
    /// Tokenizes both texts, unions the document's extracted skills into
    /// its keyword set, computes the lexical score, obtains the semantic
    /// analysis, and fuses the two. Analyzer failure aborts the match;
    /// a failed best-effort re-index afterwards only logs a warning,
    /// since the scoring result is already valid.
    pub async fn match_document(&self, doc: &Document, target: &str) -> Result<MatchResult> {
        let target_keywords = tokenize(target);
        let mut doc_keywords = tokenize(&doc.text);

        // Multi-word skills would not survive the token pattern intact,
        // so each word of each skill joins the candidate set.
        for skill in &doc.skills {
            for word in skill.to_lowercase().split_whitespace() {
                doc_keywords.insert(word.to_string());
            }
        }

        let lexical = keyword_score(&target_keywords, &doc_keywords);

        let analysis = self
            .analyzer
            .analyze(&doc.text, target, &doc.skills)
            .await?;

        let fused = fuse(lexical, analysis.match_score, self.config.semantic_weight)?;

        let result = MatchResult {
            document_id: doc.id,
            scores: ScoreComponents {
                lexical,
                semantic: analysis.match_score,
                fused,
            },
            skill_gaps: analysis.skill_gaps,
            improvement_suggestions: analysis.improvement_suggestions,
        };

        if self.embeddings.is_enabled() || doc.embedding.is_some() {
            if let Err(e) = self.index_document(doc).await {
                warn!(document_id = doc.id, error = %e, "re-index after match failed");
            }
        }

        Ok(result)
    }

    /// Add a document to the vector index.
    ///
    /// Uses the document's stored embedding when present, otherwise
    /// embeds its text. Documents with an empty text body are skipped.
    pub async fn index_document(&self, doc: &Document) -> Result<()> {
        if doc.text.trim().is_empty() {
            return Ok(());
        }

        let vector = match &doc.embedding {
            Some(v) => v.clone(),
            None => self.embeddings.embed(&doc.text).await?,
        };

        self.index.add(doc.id, &vector)
    }

    /// Retrieve up to `k` documents similar to `query` that are owned
    /// by `owner`, ranked by descending similarity.
    ///
    /// The index search over-fetches (`overfetch_factor * k`) because
    /// the ownership filter runs strictly afterwards: the index carries
    /// no access scope, so a naive top-k could come back short once
    /// foreign documents are dropped. The over-fetch is a hedge, not a
    /// guarantee — a principal owning a small slice of the corpus may
    /// still receive fewer than `k` results, which is best-effort by
    /// design and never an error.
    pub async fn retrieve(
        &self,
        owner: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        // Embed outside the index lock; the external call dominates
        // latency.
        let query_vec = self.embeddings.embed(query).await?;

        let fetch = k.saturating_mul(self.config.overfetch_factor);
        let hits = dedup_latest(self.index.search(&query_vec, fetch)?);
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        let visible = self
            .store
            .documents_by_owner_and_ids(owner, &ids)
            .await?;
        let by_id: std::collections::HashMap<i64, &Document> =
            visible.iter().map(|d| (d.id, d)).collect();

        let mut results = Vec::new();
        for hit in &hits {
            if let Some(doc) = by_id.get(&hit.id) {
                results.push(RetrievedDocument {
                    id: doc.id,
                    score: hit.score,
                    snippet: doc.text.chars().take(SNIPPET_CHARS).collect(),
                    created_at: doc.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                });
                if results.len() == k {
                    break;
                }
            }
        }

        Ok(results)
    }

    /// Replay every stored document with a non-empty text body into the
    /// index. Returns the number of entries added.
    ///
    /// One-time, single-threaded bulk load; run it to completion before
    /// serving concurrent callers. Failures never abort startup: a store
    /// failure skips the rebuild entirely and a per-document failure
    /// skips that document, each logging the condition. The index is
    /// fully reconstructible, so serving with a partial index is safe.
    pub async fn rebuild_from_store(&self) -> usize {
        let docs = match self.store.list_all_documents().await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "index rebuild skipped: could not list documents");
                return 0;
            }
        };

        let mut added = 0;
        for doc in &docs {
            if doc.text.trim().is_empty() {
                continue;
            }
            if doc.embedding.is_none() && !self.embeddings.is_enabled() {
                continue;
            }
            match self.index_document(doc).await {
                Ok(()) => added += 1,
                Err(e) => warn!(document_id = doc.id, error = %e, "rebuild: skipping document"),
            }
        }

        info!(count = added, "vector index rebuilt from store");
        added
    }
}

/// Collapse duplicate ids, preferring the most recently added entry.
///
/// Re-indexed documents share their embedding (text is immutable once
/// scored), so duplicates carry equal scores and the stable sort places
/// the newer entry later; last-occurrence-wins keeps it while the
/// ranking position of the first occurrence is preserved.
fn dedup_latest(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut out: Vec<SearchHit> = Vec::with_capacity(hits.len());
    let mut seen: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
    for hit in hits {
        match seen.get(&hit.id) {
            Some(&idx) => out[idx] = hit,
            None => {
                seen.insert(hit.id, out.len());
                out.push(hit);
            }
        }
    }
    out
}
