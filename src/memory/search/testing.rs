//! In-memory stubs shared by the search engine tests.

use std::collections::HashMap;
use std::sync::Arc;

use rig::embeddings::{Embedding, EmbeddingError};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::ids::MemoryId;
use crate::memory::core::item::MemoryItem;
use crate::memory::core::request::SearchFilters;
use crate::memory::embedding::embedder::{EmbedFuture, Embedder};
use crate::memory::storage::memory_store::{MemoryStore, StoreFuture};

/// Store stub holding records in memory and applying filters in-process.
pub struct StubStore {
    items: Vec<MemoryItem>,
}

impl StubStore {
    pub fn new(items: Vec<MemoryItem>) -> Arc<Self> {
        Arc::new(Self { items })
    }
}

impl MemoryStore for StubStore {
    fn find(&self, filters: SearchFilters) -> StoreFuture<'_, MemoryResult<Vec<MemoryItem>>> {
        Box::pin(async move {
            let mut found: Vec<MemoryItem> = self
                .items
                .iter()
                .filter(|item| filters.matches(item))
                .cloned()
                .collect();
            found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(found)
        })
    }

    fn get(&self, id: MemoryId) -> StoreFuture<'_, MemoryResult<Option<MemoryItem>>> {
        Box::pin(async move { Ok(self.items.iter().find(|item| item.id == id).cloned()) })
    }

    fn insert(&self, _item: MemoryItem) -> StoreFuture<'_, MemoryResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn update(&self, _item: MemoryItem) -> StoreFuture<'_, MemoryResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn delete(&self, _id: MemoryId) -> StoreFuture<'_, MemoryResult<bool>> {
        Box::pin(async move { Ok(false) })
    }

    fn count(&self) -> StoreFuture<'_, MemoryResult<u64>> {
        Box::pin(async move { Ok(self.items.len() as u64) })
    }
}

/// Deterministic embedder stub: maps known texts to fixed vectors, errors
/// on unknown text or when configured to fail.
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f64>>,
    fail: bool,
}

impl StubEmbedder {
    pub fn new(vectors: HashMap<String, Vec<f64>>) -> Arc<Self> {
        Arc::new(Self {
            vectors,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            vectors: HashMap::new(),
            fail: true,
        })
    }
}

impl Embedder for StubEmbedder {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, MemoryResult<Embedding>> {
        let text = text.to_string();
        Box::pin(async move {
            if self.fail {
                return Err(MemoryError::Embedding(EmbeddingError::ProviderError(
                    "stub provider down".to_string(),
                )));
            }

            self.vectors
                .get(&text)
                .map(|vec| Embedding {
                    document: text.clone(),
                    vec: vec.clone(),
                })
                .ok_or_else(|| {
                    MemoryError::Embedding(EmbeddingError::ProviderError(format!(
                        "no stub vector for {text:?}"
                    )))
                })
        })
    }

    fn ndims(&self) -> usize {
        self.vectors.values().next().map_or(0, Vec::len)
    }
}

/// A record whose embedding mirrors the given f64 vector.
pub fn item_with_embedding(value: &str, vector: &[f64]) -> MemoryItem {
    let stored: Vec<f32> = vector.iter().map(|v| *v as f32).collect();
    MemoryItem::new(value, None, vec![])
        .unwrap()
        .with_embedding(stored, "stub-embed")
}
