//! Knowledge retrieval for parley: an append-only store of embedded texts
//! ranked by similarity to a query.

pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod models;
pub mod search;
pub mod storage;

pub use embeddings::{Embedder, EmbeddingClient};
pub use engine::KnowledgeEngine;
pub use errors::{KnowledgeError, KnowledgeResult};
pub use models::{KnowledgeItem, ScoredText};
pub use parley_core::config::{KnowledgeSettings, Similarity};
pub use search::{LinearScanIndex, VectorIndex};
pub use storage::KnowledgeStore;
