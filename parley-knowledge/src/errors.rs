/// Failures of the knowledge engine.
///
/// Every variant except `EmbeddingDimMismatch` is a failure of the external
/// embedding provider; none of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimMismatch { expected: usize, actual: usize },
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
