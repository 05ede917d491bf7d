//! Vector storage for indexed chunks.
//!
//! The [`VectorStore`] trait is the seam between the router and whatever
//! backs the index; [`sqlite::SqliteVectorStore`] is the shipped
//! implementation (sqlite-vec). The index is a full, flat nearest-neighbor
//! structure: population is append-only via upsert and a complete reload is
//! the only supported reset path.

pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::RagError;

pub use sqlite::SqliteVectorStore;

/// A chunk as stored in the index: stable id, text, and flat metadata.
///
/// Ids are `doc_{i}`, sequential from load order. A fresh load reuses the id
/// space, so re-running the load is a full replace, not an incremental merge.
#[derive(Clone, Debug, Serialize)]
pub struct IndexedDocument {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl IndexedDocument {
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// One similarity-search result.
///
/// `distance` is cosine distance: non-negative, smaller = closer, meaningful
/// only for relative ranking within a single index instance.
#[derive(Clone, Debug, Serialize)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

/// Access pattern the pipeline requires of its index: upsert-by-id,
/// nearest-neighbor query, and full scan.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces documents by id. When `embeddings` is `None` the
    /// store computes vectors through its embedding gateway over the document
    /// texts first. Returns `Ok(false)` only when embedding computation
    /// yields nothing.
    async fn upsert(
        &self,
        documents: Vec<IndexedDocument>,
        embeddings: Option<Vec<Vec<f32>>>,
    ) -> Result<bool, RagError>;

    /// Embeds `query_text` internally and returns up to `limit` hits ranked
    /// ascending by distance.
    async fn search(&self, query_text: &str, limit: usize) -> Result<Vec<QueryHit>, RagError>;

    /// Full enumeration of the index, unordered with respect to relevance.
    /// Used for exhaustive listing answers rather than similarity.
    async fn scan_all(&self) -> Result<Vec<IndexedDocument>, RagError>;

    /// Total number of stored documents.
    async fn count(&self) -> Result<usize, RagError>;
}
