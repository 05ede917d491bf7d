//! Runtime configuration for the retrieval pipeline.
//!
//! Configuration resolves in two layers (later wins):
//!
//! 1. Compiled defaults (local LM Studio for embeddings, `sunbeam_courses`
//!    collection under `./chroma_db`).
//! 2. Environment variables (a `.env` file is honored via `dotenvy`).
//!
//! Recognized variables:
//!
//! - `SUNBEAM_DATA_DIR` — directory holding the scraped topic JSON files
//! - `SUNBEAM_DB_DIR` — directory for the sqlite vector database
//! - `SUNBEAM_COLLECTION` — collection (database file) name
//! - `SUNBEAM_EMBEDDING_URL` / `SUNBEAM_EMBEDDING_MODEL`
//! - `SUNBEAM_LMSTUDIO_URL` — local OpenAI-compatible completion server
//! - `GROQ_API_KEY` / `GOOGLE_API_KEY` — cloud provider credentials

use std::path::PathBuf;

/// Embedding backend endpoint settings.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    /// Base URL of the OpenAI-compatible embedding server.
    pub base_url: String,
    /// Model name sent with every embedding request.
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234/v1".to_string(),
            model: "text-embedding-nomic-embed-text-v1.5".to_string(),
        }
    }
}

/// Credentials and endpoints for the completion providers.
#[derive(Clone, Debug, Default)]
pub struct ProviderCredentials {
    pub groq_api_key: String,
    pub google_api_key: String,
    /// Overrides the default local LM Studio endpoint when set.
    pub lmstudio_base_url: Option<String>,
}

/// Top-level configuration consumed by the loader, store, and gateways.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Directory containing the per-topic scraped JSON files.
    pub data_dir: PathBuf,
    /// Directory where the sqlite vector database lives.
    pub db_dir: PathBuf,
    /// Collection name; also the database file stem.
    pub collection: String,
    pub embedding: EmbeddingConfig,
    pub providers: ProviderCredentials,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            db_dir: PathBuf::from("chroma_db"),
            collection: "sunbeam_courses".to_string(),
            embedding: EmbeddingConfig::default(),
            providers: ProviderCredentials::default(),
        }
    }
}

impl RagConfig {
    /// Builds a configuration from defaults plus environment overrides.
    ///
    /// Loads a `.env` file when present. Unset variables keep their defaults;
    /// this never fails, matching the load-then-serve model where a bad
    /// endpoint shows up as a gateway error at call time rather than at
    /// construction.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(dir) = std::env::var("SUNBEAM_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("SUNBEAM_DB_DIR") {
            config.db_dir = PathBuf::from(dir);
        }
        if let Ok(name) = std::env::var("SUNBEAM_COLLECTION") {
            config.collection = name;
        }
        if let Ok(url) = std::env::var("SUNBEAM_EMBEDDING_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("SUNBEAM_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(url) = std::env::var("SUNBEAM_LMSTUDIO_URL") {
            config.providers.lmstudio_base_url = Some(url);
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            config.providers.groq_api_key = key;
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.providers.google_api_key = key;
        }
        config
    }

    /// Full path of the sqlite database file for this collection.
    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(format!("{}.sqlite", self.collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_stack() {
        let config = RagConfig::default();
        assert_eq!(config.collection, "sunbeam_courses");
        assert!(config.embedding.base_url.contains("127.0.0.1"));
        assert!(config.db_path().ends_with("sunbeam_courses.sqlite"));
    }
}
