use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::KnowledgeItem;

/// In-memory, insertion-ordered collection of knowledge items.
///
/// Appends hold the write lock only for the dimension check and the push,
/// so readers never observe a half-written item.
#[derive(Debug)]
pub struct KnowledgeStore {
    state: RwLock<StoreState>,
    max_items: Option<usize>,
}

#[derive(Debug, Default)]
pub struct StoreState {
    items: Vec<KnowledgeItem>,
    dimension: Option<usize>,
}

impl StoreState {
    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

impl KnowledgeStore {
    /// `dimension` pins the vector length; otherwise the first append fixes it.
    /// `max_items` caps the store, evicting the oldest item first.
    pub fn new(dimension: Option<usize>, max_items: Option<usize>) -> Self {
        Self {
            state: RwLock::new(StoreState {
                items: Vec::new(),
                dimension,
            }),
            max_items: max_items.filter(|max| *max > 0),
        }
    }

    /// Append an item; rejects it untouched if its dimension disagrees.
    ///
    /// Returns the evicted item when the store was at capacity.
    pub fn append(&self, item: KnowledgeItem) -> KnowledgeResult<Option<KnowledgeItem>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let actual = item.dimension();
        let current = state.dimension;
        match current {
            Some(expected) if expected != actual => {
                return Err(KnowledgeError::EmbeddingDimMismatch { expected, actual });
            }
            Some(_) => {}
            None => state.dimension = Some(actual),
        }

        let evicted = match self.max_items {
            Some(max) if state.items.len() >= max => Some(state.items.remove(0)),
            _ => None,
        };
        state.items.push(item);
        Ok(evicted)
    }

    /// Shared read access to a consistent snapshot of the items.
    pub fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.read().dimension
    }

    /// All stored texts in insertion order.
    pub fn texts(&self) -> Vec<String> {
        self.read()
            .items
            .iter()
            .map(|item| item.text().to_string())
            .collect()
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new(None, None)
    }
}
