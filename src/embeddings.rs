//! Embedding gateway: text in, fixed-length vectors out.
//!
//! The HTTP client speaks the OpenAI-compatible `/embeddings` protocol. A
//! failed or misshapen batch call falls back to one single-item call per
//! text before the failure propagates. Vector dimensionality is fixed by the
//! backend and never verified here; swapping backends without a full
//! re-embed-and-reload leaves the index with inconsistent dimensions.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::EmbeddingConfig;
use crate::types::RagError;

/// Converts text into embedding vectors.
///
/// `embed_many` must return one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError>;

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// OpenAI-compatible embedding backend client.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, input: serde_json::Value) -> Result<EmbeddingResponse, RagError> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "input": input, "model": self.model }))
            .send()
            .await?
            .error_for_status()?;
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(format!("unexpected response shape: {err}")))?;
        Ok(parsed)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut parsed = self.request(json!(text)).await?;
        if parsed.data.is_empty() {
            return Err(RagError::Embedding("empty embedding response".into()));
        }
        Ok(parsed.data.remove(0).embedding)
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match self.request(json!(texts)).await {
            Ok(parsed) if parsed.data.len() == texts.len() => {
                Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
            }
            Ok(parsed) => {
                tracing::debug!(
                    expected = texts.len(),
                    got = parsed.data.len(),
                    "batch embedding shape mismatch, retrying per item"
                );
                self.embed_each(texts).await
            }
            Err(err) => {
                tracing::debug!(%err, "batch embedding call failed, retrying per item");
                self.embed_each(texts).await
            }
        }
    }
}

impl HttpEmbeddingClient {
    /// Per-item fallback path; a failure here is terminal.
    async fn embed_each(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_one(text).await?);
        }
        Ok(vectors)
    }
}

/// Deterministic in-process provider for tests and offline runs.
///
/// Vectors are derived from character histograms, so identical text always
/// embeds identically and overlapping text lands nearby under cosine
/// distance. Not meaningful semantically.
#[derive(Clone, Debug, Default)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 16 }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let dims = self.dimensions.max(1);
        let mut vector = vec![0.0f32; dims];
        for (position, ch) in text.chars().enumerate() {
            let bucket = (ch as usize) % dims;
            vector[bucket] += 1.0 + (position % 7) as f32 * 0.01;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed(text))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}
