//! Embedding-similarity search over stored vectors.

use std::sync::Arc;

use tracing::debug;

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::request::{SearchFilters, SearchResult};
use crate::memory::embedding::embedder::Embedder;
use crate::memory::search::paging::window;
use crate::memory::search::score::cosine_similarity;
use crate::memory::storage::memory_store::MemoryStore;

/// Semantic engine scoring candidates by cosine similarity.
#[derive(Clone)]
pub struct SemanticEngine {
    store: Arc<dyn MemoryStore>,
    embedder: Option<Arc<dyn Embedder>>,
    min_similarity: f64,
}

impl SemanticEngine {
    /// Create an engine over the store and an optional embedding provider.
    #[must_use]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        embedder: Option<Arc<dyn Embedder>>,
        min_similarity: f64,
    ) -> Self {
        Self {
            store,
            embedder,
            min_similarity,
        }
    }

    /// Similarity search against stored embeddings.
    ///
    /// Tag and date filters are applied before similarity computation to
    /// shrink the expensive-compare set; candidates without a stored
    /// embedding, or with a dimension mismatch, are skipped. Kept hits
    /// score strictly above the minimum-similarity threshold, sorted by
    /// similarity descending with recency as the tie-break.
    ///
    /// # Errors
    /// Returns a provider-failure error if the query cannot be embedded;
    /// the orchestrator absorbs that by retrying against the exact engine.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> MemoryResult<(Vec<SearchResult>, usize)> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(MemoryError::EmbedderUnavailable)?;
        let query_embedding = embedder.embed_text(query).await?;

        let candidates = self.store.find(filters.clone()).await?;
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|item| {
                let stored = item.embedding.as_deref()?;
                let Some(similarity) = cosine_similarity(&query_embedding.vec, stored) else {
                    debug!("skipping dimension-mismatched embedding for memory {}", item.id);
                    return None;
                };
                if similarity <= self.min_similarity {
                    return None;
                }
                Some(SearchResult {
                    memory: item,
                    score: similarity,
                    engine: "semantic",
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.memory.updated_at.cmp(&a.memory.updated_at))
        });

        Ok(window(results, offset, limit))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::memory::core::item::MemoryItem;
    use crate::memory::search::testing::{StubEmbedder, StubStore, item_with_embedding};

    use super::*;

    fn embedder_for(query: &str, vector: &[f64]) -> Arc<StubEmbedder> {
        let mut vectors = HashMap::new();
        vectors.insert(query.to_string(), vector.to_vec());
        StubEmbedder::new(vectors)
    }

    #[tokio::test]
    async fn test_own_text_scores_one() {
        let vector = [0.6, 0.8, 0.0];
        let store = StubStore::new(vec![item_with_embedding("my note", &vector)]);
        let engine = SemanticEngine::new(store, Some(embedder_for("my note", &vector)), 0.1);

        let (results, total) = engine
            .search("my note", &SearchFilters::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].engine, "semantic");
    }

    #[tokio::test]
    async fn test_threshold_discards_weak_matches() {
        let store = StubStore::new(vec![
            // Near-orthogonal to the query vector.
            item_with_embedding("noise", &[0.0, 1.0]),
            item_with_embedding("signal", &[1.0, 0.1]),
        ]);
        let engine = SemanticEngine::new(store, Some(embedder_for("q", &[1.0, 0.0])), 0.1);

        let (results, total) = engine
            .search("q", &SearchFilters::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(results[0].memory.value.contains("signal"));
    }

    #[tokio::test]
    async fn test_candidates_without_embedding_are_skipped() {
        let store = StubStore::new(vec![
            MemoryItem::new("no embedding yet", None, vec![]).unwrap(),
            item_with_embedding("embedded", &[1.0, 0.0]),
        ]);
        let engine = SemanticEngine::new(store, Some(embedder_for("q", &[1.0, 0.0])), 0.1);

        let (_, total) = engine
            .search("q", &SearchFilters::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_skipped_not_fatal() {
        let store = StubStore::new(vec![
            item_with_embedding("short vector", &[1.0]),
            item_with_embedding("good vector", &[1.0, 0.0]),
        ]);
        let engine = SemanticEngine::new(store, Some(embedder_for("q", &[1.0, 0.0])), 0.1);

        let (results, total) = engine
            .search("q", &SearchFilters::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(results[0].memory.value.contains("good"));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_provider_error() {
        let store = StubStore::new(vec![item_with_embedding("x", &[1.0])]);
        let engine = SemanticEngine::new(store, Some(StubEmbedder::failing()), 0.1);

        let err = engine
            .search("q", &SearchFilters::default(), 20, 0)
            .await
            .unwrap_err();
        assert!(err.is_provider_failure());
    }

    #[tokio::test]
    async fn test_missing_embedder_is_provider_failure() {
        let store = StubStore::new(vec![]);
        let engine = SemanticEngine::new(store, None, 0.1);

        let err = engine
            .search("q", &SearchFilters::default(), 20, 0)
            .await
            .unwrap_err();
        assert!(err.is_provider_failure());
    }

    #[tokio::test]
    async fn test_sorted_by_similarity_descending() {
        let store = StubStore::new(vec![
            item_with_embedding("far", &[0.5, 0.5]),
            item_with_embedding("near", &[1.0, 0.05]),
        ]);
        let engine = SemanticEngine::new(store, Some(embedder_for("q", &[1.0, 0.0])), 0.1);

        let (results, _) = engine
            .search("q", &SearchFilters::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].memory.value.contains("near"));
        assert!(results[0].score > results[1].score);
    }
}
