//! In-memory [`DocumentStore`] for tests and embedded use.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Document;

use super::DocumentStore;

/// Store backed by a `HashMap` behind an `RwLock`. Ids are assigned
/// sequentially on insert, mirroring an autoincrement column.
pub struct InMemoryStore {
    docs: RwLock<HashMap<i64, Document>>,
    next_id: RwLock<i64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            next_id: RwLock::new(1),
        }
    }

    /// Insert a document, assigning and returning its id.
    pub fn insert(&self, mut doc: Document) -> i64 {
        let mut next = self.next_id.write().unwrap();
        let id = *next;
        *next += 1;
        doc.id = id;
        self.docs.write().unwrap().insert(id, doc);
        id
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_all_documents(&self) -> Result<Vec<Document>> {
        let docs = self.docs.read().unwrap();
        let mut all: Vec<Document> = docs.values().cloned().collect();
        all.sort_by_key(|d| d.id);
        Ok(all)
    }

    async fn documents_by_owner_and_ids(
        &self,
        owner: &str,
        ids: &[i64],
    ) -> Result<Vec<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| docs.get(id))
            .filter(|d| d.owner == owner)
            .cloned()
            .collect())
    }
}
