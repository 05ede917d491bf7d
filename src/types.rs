//! Shared error and conversation types used across the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the retrieval pipeline.
///
/// Variants map to the failure domains of the pipeline stages: source data
/// loading, embedding, generation, and vector storage. IO and HTTP errors
/// convert automatically so call sites can use `?` directly.
#[derive(Debug, Error)]
pub enum RagError {
    /// A topic's source file was missing or unreadable. Recoverable at load
    /// time: the loader logs a warning and skips the topic.
    #[error("source data unavailable: {0}")]
    SourceData(String),

    /// The embedding backend failed or returned an unexpected shape after the
    /// per-item fallback was exhausted.
    #[error("embedding backend failure: {0}")]
    Embedding(String),

    /// The generation backend errored or returned a malformed response. Never
    /// silently recovered into a crafted answer.
    #[error("generation backend failure: {0}")]
    Generation(String),

    /// A sqlite / sqlite-vec operation failed.
    #[error("vector store failure: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Role of a prior conversation turn supplied by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior turn of conversation, passed in via [`crate::router::QueryContext`].
///
/// The core keeps no conversational state of its own; whatever history the
/// front end wants considered travels with each call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
