//! End-to-end pipeline tests with stub capabilities and the in-memory
//! store.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use docmatch::analyzer::SemanticAnalyzer;
use docmatch::config::MatchingConfig;
use docmatch::embedding::{EmbeddingCapability, EmbeddingProvider};
use docmatch::store::memory::InMemoryStore;
use docmatch::{Document, Error, MatchingPipeline, SemanticAnalysis, VectorIndex};

/// Deterministic embedder: projects query text onto one of three axes.
struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub"
    }

    fn dims(&self) -> usize {
        3
    }

    async fn embed(&self, text: &str) -> docmatch::Result<Vec<f32>> {
        let t = text.to_lowercase();
        if t.contains("rust") {
            Ok(vec![1.0, 0.0, 0.0])
        } else if t.contains("python") {
            Ok(vec![0.0, 1.0, 0.0])
        } else {
            Ok(vec![0.0, 0.0, 1.0])
        }
    }
}

struct StubAnalyzer {
    score: f64,
    fail: bool,
}

#[async_trait]
impl SemanticAnalyzer for StubAnalyzer {
    async fn analyze(
        &self,
        _document: &str,
        _target: &str,
        _skills: &[String],
    ) -> docmatch::Result<SemanticAnalysis> {
        if self.fail {
            return Err(Error::AnalysisUnavailable("stub timeout".to_string()));
        }
        Ok(SemanticAnalysis {
            match_score: self.score,
            skill_gaps: vec!["kubernetes".to_string()],
            improvement_suggestions: vec!["mention CI experience".to_string()],
        })
    }
}

fn doc(id: i64, owner: &str, text: &str, embedding: Option<Vec<f32>>) -> Document {
    Document {
        id,
        owner: owner.to_string(),
        text: text.to_string(),
        skills: Vec::new(),
        embedding,
        created_at: Utc::now(),
    }
}

fn pipeline(
    store: InMemoryStore,
    dims: usize,
    embeddings: EmbeddingCapability,
    analyzer_score: f64,
) -> MatchingPipeline<InMemoryStore> {
    MatchingPipeline::new(
        store,
        Arc::new(VectorIndex::new(dims)),
        embeddings,
        Box::new(StubAnalyzer {
            score: analyzer_score,
            fail: false,
        }),
        MatchingConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_match_fuses_lexical_and_semantic() -> Result<()> {
    // Target {python, sql} vs candidate {python, java}: 1/2 * 120 = 60.
    // Fused with semantic 90 at weight 0.7: 60*0.3 + 90*0.7 = 81.
    let p = pipeline(InMemoryStore::new(), 3, EmbeddingCapability::Disabled, 90.0);
    let d = doc(1, "alice", "python java", None);

    let result = p.match_document(&d, "python sql").await?;
    assert_eq!(result.document_id, 1);
    assert!((result.scores.lexical - 60.0).abs() < 1e-9);
    assert!((result.scores.semantic - 90.0).abs() < 1e-9);
    assert!((result.scores.fused - 81.0).abs() < 1e-9);
    assert_eq!(result.skill_gaps, vec!["kubernetes"]);
    Ok(())
}

#[tokio::test]
async fn test_match_unions_skills_into_candidate_set() -> Result<()> {
    let p = pipeline(InMemoryStore::new(), 3, EmbeddingCapability::Disabled, 0.0);
    let mut d = doc(1, "alice", "seasoned engineer", None);
    d.skills = vec!["Machine Learning".to_string()];

    // Both target tokens come from the skill, not the text: full overlap.
    let result = p.match_document(&d, "machine learning").await?;
    assert!((result.scores.lexical - 100.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_analyzer_failure_aborts_match() {
    let p = MatchingPipeline::new(
        InMemoryStore::new(),
        Arc::new(VectorIndex::new(3)),
        EmbeddingCapability::Disabled,
        Box::new(StubAnalyzer {
            score: 0.0,
            fail: true,
        }),
        MatchingConfig::default(),
    )
    .unwrap();

    let d = doc(1, "alice", "some text", None);
    let err = p.match_document(&d, "target").await.unwrap_err();
    assert!(matches!(err, Error::AnalysisUnavailable(_)));
}

#[tokio::test]
async fn test_match_reindexes_best_effort() -> Result<()> {
    let p = pipeline(
        InMemoryStore::new(),
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        50.0,
    );
    let d = doc(1, "alice", "rust systems programming", Some(vec![1.0, 0.0, 0.0]));

    p.match_document(&d, "rust").await?;
    assert_eq!(p.index().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_retrieve_filters_by_owner() -> Result<()> {
    // Over-fetch surfaces ids [1, 2, 3]; only id 2 belongs to bob and
    // k = 3, so the final result is exactly [2] — never an error.
    let store = InMemoryStore::new();
    store.insert(doc(0, "alice", "rust services", None));
    store.insert(doc(0, "bob", "rust tooling", None));
    store.insert(doc(0, "alice", "rust compilers", None));

    let p = pipeline(
        store,
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        0.0,
    );
    for id in 1..=3 {
        let text = match id {
            1 => "rust services",
            2 => "rust tooling",
            _ => "rust compilers",
        };
        p.index_document(&doc(id, "", text, Some(vec![1.0, 0.0, 0.0])))
            .await?;
    }

    let results = p.retrieve("bob", "rust", 3).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 2);
    Ok(())
}

#[tokio::test]
async fn test_retrieve_ranks_and_truncates() -> Result<()> {
    let store = InMemoryStore::new();
    store.insert(doc(0, "alice", "rust only", None));
    store.insert(doc(0, "alice", "rust and python", None));
    store.insert(doc(0, "alice", "python only", None));

    let p = pipeline(
        store,
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        0.0,
    );
    let half = (0.5f32).sqrt();
    p.index_document(&doc(1, "", "rust only", Some(vec![1.0, 0.0, 0.0])))
        .await?;
    p.index_document(&doc(2, "", "rust and python", Some(vec![half, half, 0.0])))
        .await?;
    p.index_document(&doc(3, "", "python only", Some(vec![0.0, 1.0, 0.0])))
        .await?;

    let results = p.retrieve("alice", "rust", 2).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, 1);
    assert_eq!(results[1].id, 2);
    assert!(results[0].score >= results[1].score);
    Ok(())
}

#[tokio::test]
async fn test_retrieve_dedups_reindexed_document() -> Result<()> {
    let store = InMemoryStore::new();
    store.insert(doc(0, "alice", "rust services", None));

    let p = pipeline(
        store,
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        0.0,
    );
    let d = doc(1, "", "rust services", Some(vec![1.0, 0.0, 0.0]));
    p.index_document(&d).await?;
    p.index_document(&d).await?;
    assert_eq!(p.index().len(), 2);

    let results = p.retrieve("alice", "rust", 5).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 1);
    Ok(())
}

#[tokio::test]
async fn test_retrieve_disabled_embeddings_errors() {
    let p = pipeline(InMemoryStore::new(), 3, EmbeddingCapability::Disabled, 0.0);
    let err = p.retrieve("alice", "anything", 5).await.unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)));
}

#[tokio::test]
async fn test_retrieve_empty_index_returns_empty() -> Result<()> {
    let p = pipeline(
        InMemoryStore::new(),
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        0.0,
    );
    let results = p.retrieve("alice", "rust", 5).await?;
    assert!(results.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rebuild_skips_empty_text() -> Result<()> {
    let store = InMemoryStore::new();
    store.insert(doc(0, "alice", "rust services", Some(vec![1.0, 0.0, 0.0])));
    store.insert(doc(0, "alice", "   ", Some(vec![0.0, 1.0, 0.0])));
    store.insert(doc(0, "alice", "python tooling", Some(vec![0.0, 1.0, 0.0])));

    let p = pipeline(
        store,
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        0.0,
    );
    let added = p.rebuild_from_store().await;
    assert_eq!(added, 2);
    assert_eq!(p.index().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rebuild_embeds_when_no_stored_vector() -> Result<()> {
    let store = InMemoryStore::new();
    store.insert(doc(0, "alice", "rust services", None));

    let p = pipeline(
        store,
        3,
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        0.0,
    );
    assert_eq!(p.rebuild_from_store().await, 1);

    let results = p.retrieve("alice", "rust", 1).await?;
    assert_eq!(results.len(), 1);
    assert!((results[0].score - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_pipeline_rejects_dim_mismatch_with_provider() {
    let err = MatchingPipeline::new(
        InMemoryStore::new(),
        Arc::new(VectorIndex::new(8)),
        EmbeddingCapability::Enabled(Box::new(StubEmbedder)),
        Box::new(StubAnalyzer {
            score: 0.0,
            fail: false,
        }),
        MatchingConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_pipeline_rejects_bad_weight() {
    let err = MatchingPipeline::new(
        InMemoryStore::new(),
        Arc::new(VectorIndex::new(3)),
        EmbeddingCapability::Disabled,
        Box::new(StubAnalyzer {
            score: 0.0,
            fail: false,
        }),
        MatchingConfig {
            semantic_weight: 1.7,
            overfetch_factor: 3,
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidWeight(_)));
}
