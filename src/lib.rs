//! # docmatch
//!
//! Hybrid lexical + semantic document matching and retrieval engine.
//!
//! docmatch ranks how well a candidate document matches a target
//! description by fusing a keyword-overlap score with a semantic score
//! from an external analyzer, and answers nearest-neighbor queries over
//! an in-memory vector index, post-filtered by document ownership.
//!
//! ## Architecture
//!
//! ```text
//! match:     text ──▶ tokenize ──▶ lexical score ──┐
//!                          analyzer ──▶ semantic ──┴──▶ fuse ──▶ MatchResult
//!
//! retrieve:  query ──▶ embed ──▶ VectorIndex.search (over-fetch)
//!                 ──▶ ownership filter (store) ──▶ top-k results
//! ```
//!
//! Persistence, transport, and the reasoning service live behind the
//! [`store::DocumentStore`], [`embedding::EmbeddingProvider`], and
//! [`analyzer::SemanticAnalyzer`] traits; the engine itself is
//! transport-agnostic.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Typed error kinds |
//! | [`models`] | Core data types |
//! | [`keywords`] | Keyword extraction |
//! | [`scoring`] | Lexical scoring and score fusion |
//! | [`index`] | Append-only in-memory vector index |
//! | [`embedding`] | Embedding capability and HTTP provider |
//! | [`analyzer`] | Semantic analysis capability |
//! | [`store`] | Authoritative document store abstraction |
//! | [`pipeline`] | Match and retrieve orchestration |

pub mod analyzer;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod keywords;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod store;

pub use config::{load_config, Config};
pub use error::{Error, Result};
pub use index::{SearchHit, VectorIndex};
pub use models::{Document, MatchResult, RetrievedDocument, ScoreComponents, SemanticAnalysis};
pub use pipeline::MatchingPipeline;
