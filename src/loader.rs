//! Reads the scraped topic JSON files, chunks them, and populates the index.
//!
//! Loading is bulk and idempotent: every topic is chunked first, ids are
//! assigned sequentially across the whole batch, and a single upsert writes
//! everything. Re-running a load against the same store reuses the same id
//! space and so replaces the previous snapshot outright.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::chunker::{Chunk, chunk_topic};
use crate::stores::{IndexedDocument, VectorStore};
use crate::types::RagError;

pub use crate::chunker::Topic;

/// Maps each topic to the JSON file holding its scraped record.
#[derive(Clone, Debug)]
pub struct SourcePaths {
    paths: BTreeMap<&'static str, PathBuf>,
}

impl SourcePaths {
    /// Default layout: one conventionally named file per topic under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        let mut paths = BTreeMap::new();
        for topic in Topic::ALL {
            paths.insert(topic.key(), dir.join(Self::default_file_name(topic)));
        }
        Self { paths }
    }

    fn default_file_name(topic: Topic) -> &'static str {
        match topic {
            Topic::AboutUs => "about_us_data.json",
            Topic::Internship => "internship_complete_data.json",
            Topic::Precat => "precat_data.json",
            Topic::ModularCourses => "modular_courses_data.json",
            Topic::McqCourse => "mastering_mcqs_data.json",
            Topic::Contact => "contact_data.json",
        }
    }

    /// Replaces the path for one topic.
    #[must_use]
    pub fn with_path(mut self, topic: Topic, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(topic.key(), path.into());
        self
    }

    pub fn path_for(&self, topic: Topic) -> &Path {
        &self.paths[topic.key()]
    }
}

/// Outcome of one [`load_snapshot`] run.
#[derive(Clone, Debug, Default)]
pub struct LoadSummary {
    /// Total chunks written to the store.
    pub chunks_indexed: usize,
    /// Topics whose source file was missing or unreadable.
    pub topics_skipped: Vec<Topic>,
}

/// Loads all topic files, chunks them, and writes the result to `store` in
/// one upsert.
///
/// A missing or unparsable topic file is logged and skipped rather than
/// aborting the load; the remaining topics still index. Ids are `doc_{i}`,
/// sequential over the concatenated chunk list in topic load order.
pub async fn load_snapshot(
    store: &dyn VectorStore,
    paths: &SourcePaths,
) -> Result<LoadSummary, RagError> {
    let mut summary = LoadSummary::default();
    let mut chunks: Vec<Chunk> = Vec::new();

    for topic in Topic::ALL {
        match read_topic(paths.path_for(topic)).await {
            Ok(data) => {
                let topic_chunks = chunk_topic(topic, &data);
                tracing::info!(topic = topic.key(), chunks = topic_chunks.len(), "chunked topic");
                chunks.extend(topic_chunks);
            }
            Err(err) => {
                tracing::warn!(topic = topic.key(), %err, "skipping topic");
                summary.topics_skipped.push(topic);
            }
        }
    }

    let documents: Vec<IndexedDocument> = chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| IndexedDocument {
            id: format!("doc_{index}"),
            content: chunk.content,
            metadata: chunk.metadata,
        })
        .collect();
    summary.chunks_indexed = documents.len();

    if documents.is_empty() {
        tracing::warn!("no chunks produced; store left untouched");
        return Ok(summary);
    }

    store.upsert(documents, None).await?;
    tracing::info!(
        chunks = summary.chunks_indexed,
        skipped = summary.topics_skipped.len(),
        "snapshot loaded"
    );
    Ok(summary)
}

async fn read_topic(path: &Path) -> Result<Value, RagError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| RagError::SourceData(format!("{}: {err}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|err| RagError::SourceData(format!("{}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_cover_every_topic() {
        let paths = SourcePaths::new("data");
        for topic in Topic::ALL {
            let path = paths.path_for(topic);
            assert!(path.starts_with("data"));
            assert!(path.extension().is_some_and(|ext| ext == "json"));
        }
    }

    #[test]
    fn path_override_replaces_only_one_topic() {
        let paths = SourcePaths::new("data").with_path(Topic::Contact, "/tmp/contact.json");
        assert_eq!(
            paths.path_for(Topic::Contact),
            Path::new("/tmp/contact.json")
        );
        assert!(paths.path_for(Topic::AboutUs).starts_with("data"));
    }
}
