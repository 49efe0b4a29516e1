use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::KnowledgeSettings;
use crate::embeddings::{Embedder, EmbeddingClient};
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{KnowledgeItem, ScoredText};
use crate::search::{LinearScanIndex, VectorIndex};
use crate::storage::KnowledgeStore;

/// Knowledge store plus retriever.
///
/// `add` embeds and appends; `retrieve` embeds the query and ranks every
/// stored item against it. Provider failures are returned as-is, never
/// retried, and never leave a partial item behind.
pub struct KnowledgeEngine {
    settings: KnowledgeSettings,
    embedder: Arc<dyn Embedder>,
    store: KnowledgeStore,
    index: Box<dyn VectorIndex>,
}

impl KnowledgeEngine {
    /// Engine ranking with an exact linear scan under `settings.similarity`.
    pub fn new(settings: KnowledgeSettings, embedder: Arc<dyn Embedder>) -> Self {
        let index = Box::new(LinearScanIndex::new(settings.similarity));
        Self::with_index(settings, embedder, index)
    }

    /// Engine ranking through a caller-supplied index.
    pub fn with_index(
        settings: KnowledgeSettings,
        embedder: Arc<dyn Embedder>,
        index: Box<dyn VectorIndex>,
    ) -> Self {
        let store = KnowledgeStore::new(settings.embedding_dim, settings.max_items);
        Self {
            settings,
            embedder,
            store,
            index,
        }
    }

    /// Build an engine backed by the HTTP embedding client.
    pub fn with_http_embedder(
        settings: KnowledgeSettings,
        api_key: Option<String>,
        timeout: Duration,
    ) -> KnowledgeResult<Self> {
        let embedder = EmbeddingClient::new(&settings)
            .with_api_key(api_key)
            .with_timeout(timeout)?;
        Ok(Self::new(settings, Arc::new(embedder)))
    }

    /// Number of texts injected into a RAG prompt by default.
    pub fn default_top_k(&self) -> usize {
        self.settings.top_k
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All stored texts in insertion order.
    pub fn texts(&self) -> Vec<String> {
        self.store.texts()
    }

    /// Embed `text` and append it to the store. No deduplication.
    pub async fn add(&self, text: &str) -> KnowledgeResult<()> {
        let embedding = self.embedder.embed(text).await?;
        let dimension = embedding.len();

        let evicted = self.store.append(KnowledgeItem::new(text, embedding))?;
        if let Some(evicted) = evicted {
            debug!(
                "Knowledge store at capacity, evicted oldest item ({} chars)",
                evicted.text().len()
            );
        }

        info!(
            "Added knowledge item ({} chars, dim {}, {} stored)",
            text.len(),
            dimension,
            self.store.len()
        );
        Ok(())
    }

    /// Top `top_k` texts, most similar first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> KnowledgeResult<Vec<String>> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Like `retrieve`, keeping the scores.
    ///
    /// An empty store (or `top_k == 0`) short-circuits without calling the
    /// embedding provider.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        top_k: usize,
    ) -> KnowledgeResult<Vec<ScoredText>> {
        if top_k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let state = self.store.read();
        if let Some(expected) = state.dimension()
            && expected != query_embedding.len()
        {
            return Err(KnowledgeError::EmbeddingDimMismatch {
                expected,
                actual: query_embedding.len(),
            });
        }
        let items = state.items();
        let ranked = self.index.rank(&query_embedding, items, top_k);
        let hits: Vec<ScoredText> = ranked
            .into_iter()
            .filter_map(|(idx, score)| {
                items.get(idx).map(|item| ScoredText {
                    text: item.text().to_string(),
                    score,
                })
            })
            .collect();

        debug!(
            "Retrieved {} of {} items via {} (model {})",
            hits.len(),
            items.len(),
            self.index.name(),
            self.embedder.model()
        );
        Ok(hits)
    }
}

impl std::fmt::Debug for KnowledgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeEngine")
            .field("settings", &self.settings)
            .field("embedder", &self.embedder.model())
            .field("index", &self.index.name())
            .field("items", &self.store.len())
            .finish()
    }
}
