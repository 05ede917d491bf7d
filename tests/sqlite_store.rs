//! End-to-end checks of the sqlite-vec store and snapshot loading, using
//! the deterministic in-process embedder against a temporary database.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use sunbeam_rag::embeddings::MockEmbeddingProvider;
use sunbeam_rag::loader::{SourcePaths, Topic, load_snapshot};
use sunbeam_rag::stores::{IndexedDocument, SqliteVectorStore, VectorStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

async fn open_store(dir: &Path) -> SqliteVectorStore {
    init_tracing();
    SqliteVectorStore::open(
        dir.join("test.sqlite"),
        Arc::new(MockEmbeddingProvider::new()),
    )
    .await
    .unwrap()
}

fn document(id: &str, content: &str) -> IndexedDocument {
    let mut metadata = Map::new();
    metadata.insert("page".to_string(), Value::from("test"));
    IndexedDocument {
        id: id.to_string(),
        content: content.to_string(),
        metadata,
    }
}

#[tokio::test]
async fn search_ranks_exact_text_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let docs = vec![
        document("doc_0", "Internship fees and batch schedule"),
        document("doc_1", "About the Sunbeam campus in Pune"),
        document("doc_2", "Modular course on web development"),
    ];
    assert!(store.upsert(docs, None).await.unwrap());

    // The query is verbatim one stored text; the mock embedder maps identical
    // text to identical vectors, so its distance is exactly zero.
    let hits = store
        .search("About the Sunbeam campus in Pune", 3)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, "doc_1");
    assert!(hits[0].distance.abs() < 1e-5);
    assert!(hits[0].distance <= hits[1].distance);
    assert!(hits[1].distance <= hits[2].distance);
    assert_eq!(hits[0].metadata.get("page"), Some(&Value::from("test")));
}

#[tokio::test]
async fn search_respects_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    let docs = (0..5)
        .map(|i| document(&format!("doc_{i}"), &format!("passage number {i}")))
        .collect();
    store.upsert(docs, None).await.unwrap();

    let hits = store.search("passage", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn search_on_empty_store_returns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    let hits = store.search("anything", 5).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn upsert_by_id_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    store
        .upsert(vec![document("doc_0", "old content")], None)
        .await
        .unwrap();
    store
        .upsert(vec![document("doc_0", "new content")], None)
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let all = store.scan_all().await.unwrap();
    assert_eq!(all[0].content, "new content");

    // The replaced embedding must be live too: searching for the new text
    // finds it at distance zero.
    let hits = store.search("new content", 1).await.unwrap();
    assert_eq!(hits[0].id, "doc_0");
    assert!(hits[0].distance.abs() < 1e-5);
}

#[tokio::test]
async fn scan_all_returns_every_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    let docs: Vec<_> = (0..4)
        .map(|i| document(&format!("doc_{i}"), &format!("text {i}")))
        .collect();
    store.upsert(docs, None).await.unwrap();

    let mut ids: Vec<String> = store
        .scan_all()
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["doc_0", "doc_1", "doc_2", "doc_3"]);
    assert_eq!(store.count().await.unwrap(), 4);
}

#[tokio::test]
async fn upsert_without_vectors_for_real_documents_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    // Embedding computation producing zero vectors for non-empty input is
    // the one case upsert reports as Ok(false) instead of an error.
    let ok = store
        .upsert(vec![document("doc_0", "some text")], Some(Vec::new()))
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(store.count().await.unwrap(), 0);
    assert!(store.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn precomputed_embeddings_bypass_the_embedder() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;

    let vectors = vec![vec![1.0f32, 0.0, 0.0], vec![0.0f32, 1.0, 0.0]];
    store
        .upsert(
            vec![document("doc_0", "alpha"), document("doc_1", "beta")],
            Some(vectors),
        )
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn load_snapshot_skips_missing_topics_and_indexes_the_rest() {
    let data_dir = tempfile::tempdir().unwrap();
    let db_dir = tempfile::tempdir().unwrap();
    let store = open_store(db_dir.path()).await;

    // Only two of the six topic files exist.
    tokio::fs::write(
        data_dir.path().join("contact_data.json"),
        json!({
            "full_text": "Reach us at info@sunbeaminfo.com",
            "emails": ["info@sunbeaminfo.com"],
            "phones": ["+91 20 2421 1234"]
        })
        .to_string(),
    )
    .await
    .unwrap();
    tokio::fs::write(
        data_dir.path().join("modular_courses_data.json"),
        json!([
            {"course_name": "Advanced Java", "duration": "3 Months", "link": "N/A"},
            {"course_name": "Web Development", "duration": "2 Months", "link": "N/A"}
        ])
        .to_string(),
    )
    .await
    .unwrap();

    let paths = SourcePaths::new(data_dir.path());
    let summary = load_snapshot(&store, &paths).await.unwrap();

    assert_eq!(summary.topics_skipped.len(), 4);
    assert!(summary.topics_skipped.contains(&Topic::AboutUs));
    assert!(!summary.topics_skipped.contains(&Topic::Contact));
    assert!(summary.chunks_indexed > 0);
    assert_eq!(store.count().await.unwrap(), summary.chunks_indexed);

    // Ids are sequential from zero across the whole batch.
    let all = store.scan_all().await.unwrap();
    assert!(all.iter().any(|doc| doc.id == "doc_0"));
    assert!(
        all.iter()
            .all(|doc| doc.id.strip_prefix("doc_").unwrap().parse::<usize>().is_ok())
    );
}
