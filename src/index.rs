//! In-memory vector index over unit-normalized document embeddings.
//!
//! Append-only: there is no delete or update. Entries are (position, id)
//! pairs where position is the physical slot and id is the document's
//! logical id. Duplicate ids are legal (a document may be re-indexed);
//! consumers deduplicating result sets should prefer the most recently
//! added entry for an id.
//!
//! Search is a brute-force inner-product scan, which is correct and
//! adequate at the expected corpus scale (thousands of documents). All
//! vectors are unit-normalized by the caller, so inner product equals
//! cosine similarity.

use std::sync::RwLock;

use crate::error::{Error, Result};

/// A single search hit: document id and inner-product similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub score: f32,
}

struct Entries {
    /// Flat arena; entry `i` occupies `[i*dims, (i+1)*dims)`.
    vectors: Vec<f32>,
    /// Position -> document id.
    ids: Vec<i64>,
}

/// Shared, process-wide vector index.
///
/// `add` and `search` take `&self` and are safe to call concurrently;
/// a single reader/writer lock guards the arena and id list. Both
/// operations are fast relative to the network I/O that surrounds them,
/// so callers must not hold external-capability calls inside them —
/// embed first, then search.
///
/// Each `add`/`search` is individually atomic with respect to the lock.
/// A concurrent `add` may or may not be visible to an in-flight search;
/// search only promises the best matches among entries visible at call
/// time.
pub struct VectorIndex {
    dims: usize,
    entries: RwLock<Entries>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension.
    ///
    /// The dimension is fixed for the lifetime of the index and is
    /// determined by the embedding capability in use.
    ///
    /// # Panics
    ///
    /// Panics if `dims` is zero.
    pub fn new(dims: usize) -> Self {
        assert!(dims > 0, "index dimension must be > 0");
        Self {
            dims,
            entries: RwLock::new(Entries {
                vectors: Vec::new(),
                ids: Vec::new(),
            }),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an entry for `id`.
    ///
    /// The vector must already be unit-normalized; the index does not
    /// renormalize. Growth is unbounded — there is no eviction.
    pub fn add(&self, id: i64, vector: &[f32]) -> Result<()> {
        self.check_dims(vector)?;
        debug_assert!(
            (vector.iter().map(|v| v * v).sum::<f32>().sqrt() - 1.0).abs() < 1e-3,
            "vector for id {id} is not unit-normalized"
        );

        let mut entries = self.entries.write().unwrap();
        entries.vectors.extend_from_slice(vector);
        entries.ids.push(id);
        Ok(())
    }

    /// Return up to `min(k, len)` hits ranked by descending inner
    /// product, ties broken by insertion order (earlier entries first).
    ///
    /// Never fails for an empty index; returns an empty vec instead.
    /// Does not mutate state.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.check_dims(query)?;

        let entries = self.entries.read().unwrap();
        if entries.ids.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = entries
            .vectors
            .chunks_exact(self.dims)
            .zip(entries.ids.iter())
            .map(|(vec, &id)| SearchHit {
                id,
                score: dot(query, vec),
            })
            .collect();

        // Stable sort preserves insertion order among equal scores.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k.min(entries.ids.len()));
        Ok(hits)
    }

    fn check_dims(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
