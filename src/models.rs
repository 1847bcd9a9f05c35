//! Core data types that flow through the matching and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document eligible for matching and retrieval.
///
/// Immutable once scored. The `id` is assigned by the authoritative
/// store; `embedding`, when present, is a unit-normalized vector of the
/// index dimension.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: i64,
    /// Principal that may retrieve this document.
    pub owner: String,
    pub text: String,
    /// Externally extracted skill list. Skills are strong signal and may
    /// not appear verbatim in the text (e.g. multi-word skills), so the
    /// match operation unions them into the candidate keyword set.
    pub skills: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// Result of the external semantic analysis capability.
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticAnalysis {
    /// Semantic match score in `[0, 100]`.
    pub match_score: f64,
    /// Skills the target requires but the document lacks.
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
}

/// Scoring breakdown for one match: `fused = lexical*(1-w) + semantic*w`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreComponents {
    /// Keyword-overlap score in `[0, 100]`.
    pub lexical: f64,
    /// Externally supplied semantic score in `[0, 100]`.
    pub semantic: f64,
    /// Blended final score in `[0, 100]`.
    pub fused: f64,
}

/// Outcome of a match operation. Created once per request, immutable
/// thereafter; persistence is the caller's responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub document_id: i64,
    pub scores: ScoreComponents,
    pub skill_gaps: Vec<String>,
    pub improvement_suggestions: Vec<String>,
}

/// A retrieval hit visible to the requesting principal.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDocument {
    pub id: i64,
    /// Inner-product similarity against the query embedding.
    pub score: f32,
    /// Text excerpt for display.
    pub snippet: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}
