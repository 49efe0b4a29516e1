//! Similarity scoring and ranking over stored embeddings.

use crate::Similarity;
use crate::models::KnowledgeItem;

/// Raw inner product. Not normalized by magnitude.
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product(a, b) / (norm_a * norm_b)
}

/// Score `item` against `query` with the configured similarity.
pub fn score(similarity: Similarity, query: &[f64], item: &[f64]) -> f64 {
    match similarity {
        Similarity::Dot => dot_product(query, item),
        Similarity::Cosine => cosine_similarity(query, item),
    }
}

/// Position of an item in the store and its score against a query.
pub type ScoredIndex = (usize, f64);

/// Nearest-neighbor lookup over the stored items.
///
/// Implementations return at most `top_k` positions into `items`, best
/// first; items with equal scores keep their store order.
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &'static str;

    fn rank(&self, query: &[f64], items: &[KnowledgeItem], top_k: usize) -> Vec<ScoredIndex>;
}

/// Exact search that scores every item.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScanIndex {
    similarity: Similarity,
}

impl LinearScanIndex {
    pub fn new(similarity: Similarity) -> Self {
        Self { similarity }
    }
}

impl VectorIndex for LinearScanIndex {
    fn name(&self) -> &'static str {
        "linear_scan"
    }

    fn rank(&self, query: &[f64], items: &[KnowledgeItem], top_k: usize) -> Vec<ScoredIndex> {
        let mut ranked: Vec<ScoredIndex> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (idx, score(self.similarity, query, item.embedding())))
            .collect();
        // sort_by is stable: equal scores stay in insertion order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        ranked
    }
}
