//! ```text
//! Scraped topic JSON ──► chunker::topics ──► Vec<Chunk>
//!                                   │
//! loader::load_snapshot ────────────┤ assigns doc_{i} ids
//!                                   ▼
//!                     stores::sqlite::SqliteVectorStore
//!                          (embeds via embeddings::EmbeddingProvider)
//!
//! Question + QueryContext ──► router::classify ──► Intent
//!                                   │
//!        ┌──────────────────────────┼───────────────────────┐
//!        ▼                          ▼                       ▼
//!  regex extraction          scan_all + dedup       search + prompt
//!  (contact intent)          (enumerations)         + generation gateway
//!        └──────────────────────────┴───────────────────────┘
//!                                   ▼
//!                       RagAnswer { answer, sources }
//! ```

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod loader;
pub mod router;
pub mod stores;
pub mod types;

pub use config::RagConfig;
pub use embeddings::{EmbeddingProvider, HttpEmbeddingClient, MockEmbeddingProvider};
pub use generation::{CompletionGateway, ProviderKind, ProviderSelection, ProviderSet};
pub use loader::{LoadSummary, SourcePaths, Topic, load_snapshot};
pub use router::{Intent, QueryContext, QueryRouter, RagAnswer};
pub use stores::{IndexedDocument, QueryHit, SqliteVectorStore, VectorStore};
pub use types::RagError;
