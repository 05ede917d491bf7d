//! SQLite-backed vector index using the sqlite-vec extension.
//!
//! Layout: a `chunks` table holds `(id, content, metadata)`; a
//! `chunks_embeddings` vec0 virtual table holds the vectors, joined by rowid.
//! The vec0 table is created lazily from the first upserted vector's length,
//! so the embedding dimension is fixed by the backend that populated the
//! index; a mismatched later write surfaces as a storage error.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Value};
use tokio_rusqlite::{Connection, ffi};

use super::{IndexedDocument, QueryHit, VectorStore};
use crate::embeddings::EmbeddingProvider;
use crate::types::RagError;

pub struct SqliteVectorStore {
    conn: Connection,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteVectorStore {
    /// Opens (creating if needed) the database at `path` and prepares the
    /// chunk table. The sqlite-vec extension is registered process-wide on
    /// first use.
    pub async fn open(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let conn = Connection::open(path)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        conn.call(|conn| -> tokio_rusqlite::Result<()> {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS chunks (
                    id TEXT PRIMARY KEY,
                    content TEXT NOT NULL,
                    metadata TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::Storage(err.to_string()))?;
        Ok(Self { conn, embedder })
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(
        &self,
        documents: Vec<IndexedDocument>,
        embeddings: Option<Vec<Vec<f32>>>,
    ) -> Result<bool, RagError> {
        if documents.is_empty() {
            return Ok(true);
        }

        let vectors = match embeddings {
            Some(vectors) => vectors,
            None => {
                let texts: Vec<String> =
                    documents.iter().map(|doc| doc.content.clone()).collect();
                self.embedder.embed_many(&texts).await?
            }
        };
        if vectors.is_empty() {
            tracing::warn!("upsert aborted: embedding computation yielded nothing");
            return Ok(false);
        }
        if vectors.len() != documents.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, got {}",
                documents.len(),
                vectors.len()
            )));
        }

        let dimension = vectors[0].len();
        let mut rows = Vec::with_capacity(documents.len());
        for (doc, vector) in documents.into_iter().zip(vectors) {
            let metadata = Value::Object(doc.metadata).to_string();
            let embedding = serde_json::to_string(&vector)
                .map_err(|err| RagError::Storage(err.to_string()))?;
            rows.push((doc.id, doc.content, metadata, embedding));
        }

        let inserted = rows.len();
        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                conn.execute(
                    &format!(
                        "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_embeddings \
                         USING vec0(embedding float[{dimension}])"
                    ),
                    [],
                )?;
                let tx = conn.transaction()?;
                for (id, content, metadata, embedding) in rows {
                    tx.execute(
                        "INSERT OR REPLACE INTO chunks (id, content, metadata) VALUES (?1, ?2, ?3)",
                        (&id, &content, &metadata),
                    )?;
                    let rowid: i64 = tx.query_row(
                        "SELECT rowid FROM chunks WHERE id = ?1",
                        [&id],
                        |row| row.get(0),
                    )?;
                    // vec0 tables reject INSERT OR REPLACE; clear then insert.
                    tx.execute("DELETE FROM chunks_embeddings WHERE rowid = ?1", [rowid])?;
                    tx.execute(
                        "INSERT INTO chunks_embeddings (rowid, embedding) VALUES (?1, vec_f32(?2))",
                        (rowid, &embedding),
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        tracing::debug!(documents = inserted, "upserted into vector index");
        Ok(true)
    }

    async fn search(&self, query_text: &str, limit: usize) -> Result<Vec<QueryHit>, RagError> {
        let query_embedding = self.embedder.embed_one(query_text).await?;
        let embedding_json = serde_json::to_string(&query_embedding)
            .map_err(|err| RagError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<Vec<QueryHit>> {
                let has_embeddings: bool = conn
                    .query_row(
                        "SELECT COUNT(*) FROM sqlite_master \
                         WHERE type = 'table' AND name = 'chunks_embeddings'",
                        [],
                        |row| row.get::<_, i64>(0),
                    )
                    .map(|count| count > 0)?;
                if !has_embeddings {
                    return Ok(Vec::new());
                }

                let mut stmt = conn.prepare(&format!(
                    "SELECT c.id, c.content, c.metadata, \
                     vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                     FROM chunks c \
                     JOIN chunks_embeddings e ON e.rowid = c.rowid \
                     ORDER BY distance ASC \
                     LIMIT {limit}"
                ))?;
                let rows = stmt.query_map([&embedding_json], |row| {
                    Ok(QueryHit {
                        id: row.get(0)?,
                        document: row.get(1)?,
                        metadata: parse_metadata(&row.get::<_, String>(2)?),
                        distance: row.get(3)?,
                    })
                })?;

                let mut hits = Vec::new();
                for row in rows {
                    hits.push(row?);
                }
                Ok(hits)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn scan_all(&self) -> Result<Vec<IndexedDocument>, RagError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::Result<Vec<IndexedDocument>> {
                let mut stmt = conn.prepare("SELECT id, content, metadata FROM chunks")?;
                let rows = stmt.query_map([], |row| {
                    Ok(IndexedDocument {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        metadata: parse_metadata(&row.get::<_, String>(2)?),
                    })
                })?;

                let mut documents = Vec::new();
                for row in rows {
                    documents.push(row?);
                }
                Ok(documents)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::Result<usize> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }
}

fn parse_metadata(raw: &str) -> Map<String, Value> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn register_sqlite_vec() -> Result<(), RagError> {
    static RESULT: OnceLock<Result<(), String>> = OnceLock::new();

    RESULT
        .get_or_init(|| unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != ffi::SQLITE_OK {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            } else {
                Ok(())
            }
        })
        .clone()
        .map_err(RagError::Storage)
}
