use serde::Serialize;

/// A stored text with its embedding. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeItem {
    text: String,
    embedding: Vec<f64>,
}

impl KnowledgeItem {
    pub fn new(text: impl Into<String>, embedding: Vec<f64>) -> Self {
        Self {
            text: text.into(),
            embedding,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn embedding(&self) -> &[f64] {
        &self.embedding
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// A retrieved text and the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredText {
    pub text: String,
    pub score: f64,
}
