//! Authoritative document store abstraction.
//!
//! The [`DocumentStore`] trait covers the two operations the pipeline
//! needs: a full listing at startup to rebuild the vector index, and an
//! owner-scoped lookup for post-filtering retrieval results. Ownership,
//! durability, and query performance are the backend's concern.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Document;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every stored document. Used once at startup to replay documents
    /// with a non-empty text body into the vector index.
    async fn list_all_documents(&self) -> Result<Vec<Document>>;

    /// The subset of `ids` owned by `owner`. The store is the source of
    /// truth for ownership; the index itself is principal-agnostic.
    async fn documents_by_owner_and_ids(&self, owner: &str, ids: &[i64])
        -> Result<Vec<Document>>;
}
