//! Typed errors for the matching engine.
//!
//! Empty inputs, an empty index, and zero retrieval results are *not*
//! errors; those paths return well-defined empty or zero values. The
//! variants here cover the conditions that abort an operation.

use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Vector shape does not match the index dimension. This is a
    /// programming error: the operation aborts immediately and is never
    /// retried.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding capability is disabled or its provider failed.
    /// Aborts the current match/retrieve operation; no partial result.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The semantic analyzer failed (timeout, transport error, or a
    /// malformed response). Aborts the current match operation.
    #[error("semantic analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    /// Fusion weight outside `[0, 1]`.
    #[error("invalid fusion weight {0}: must be in [0, 1]")]
    InvalidWeight(f64),

    /// Configuration could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The authoritative document store failed.
    #[error("document store error: {0}")]
    Store(String),
}
