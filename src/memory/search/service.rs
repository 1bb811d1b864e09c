//! Search orchestration: validation, strategy, dispatch, and assembly.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::memory::core::config::SearchConfig;
use crate::memory::core::errors::MemoryResult;
use crate::memory::core::request::{SearchRequest, SearchResponse, SearchResult, SearchType};
use crate::memory::embedding::embedder::Embedder;
use crate::memory::search::exact::ExactEngine;
use crate::memory::search::fallback::FallbackMatcher;
use crate::memory::search::hybrid::HybridCombiner;
use crate::memory::search::semantic::SemanticEngine;
use crate::memory::search::strategy::{SearchCapabilities, select_search_type};
use crate::memory::storage::fts_index::TextIndex;
use crate::memory::storage::memory_store::MemoryStore;

/// Entry point for memory search.
///
/// Backend availability is fixed at construction from the one-shot
/// capability probe; individual queries never re-probe.
pub struct SearchService {
    capabilities: SearchCapabilities,
    exact: ExactEngine,
    semantic: SemanticEngine,
    fallback: FallbackMatcher,
    combiner: HybridCombiner,
}

impl SearchService {
    /// Compose the service from its backends.
    #[must_use]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        index: Option<Arc<dyn TextIndex>>,
        embedder: Option<Arc<dyn Embedder>>,
        config: &SearchConfig,
    ) -> Self {
        let capabilities = SearchCapabilities {
            exact: index.is_some(),
            semantic: embedder.is_some(),
        };
        let fallback = FallbackMatcher::new(store.clone());
        let exact = ExactEngine::new(index, fallback.clone());
        let semantic = SemanticEngine::new(store, embedder, config.min_similarity);

        Self {
            capabilities,
            exact,
            semantic,
            fallback,
            combiner: HybridCombiner::new(config),
        }
    }

    /// The availability flags this service was composed with.
    #[must_use]
    pub const fn capabilities(&self) -> SearchCapabilities {
        self.capabilities
    }

    /// Run a search request end to end.
    ///
    /// Validation happens before any backend is touched; afterwards every
    /// failure class except storage errors is absorbed into a degraded but
    /// successful response.
    ///
    /// # Errors
    /// Returns `MemoryError::Validation` for an invalid request, or a
    /// storage error if a backend cannot be queried at all.
    pub async fn search(&self, mut request: SearchRequest) -> MemoryResult<SearchResponse> {
        request.validate()?;
        let start = Instant::now();

        let effective = select_search_type(request.search_type, self.capabilities);
        if effective != request.search_type {
            debug!(
                "search downgraded from {} to {}",
                request.search_type, effective
            );
        }

        let terms = request.terms();
        let filters = request.filters();
        let (results, total) = match effective {
            SearchType::Exact => {
                self.exact
                    .search(&terms, &filters, request.limit, request.offset)
                    .await?
            }
            SearchType::Semantic => {
                self.semantic_with_exact_retry(&request, &terms).await?
            }
            SearchType::Hybrid => {
                self.combiner
                    .search(
                        &self.exact,
                        &self.semantic,
                        &request.query,
                        &filters,
                        request.limit,
                        request.offset,
                    )
                    .await?
            }
            SearchType::Fallback => {
                self.fallback
                    .search(&terms, &filters, request.limit, request.offset)
                    .await?
            }
        };

        Ok(SearchResponse {
            results,
            total,
            query: request.query.clone(),
            effective_search_type: effective,
            execution_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            filters,
        })
    }

    /// Semantic search with the single retry against the exact engine on
    /// provider failure. Provider errors never reach the caller.
    async fn semantic_with_exact_retry(
        &self,
        request: &SearchRequest,
        terms: &[String],
    ) -> MemoryResult<(Vec<SearchResult>, usize)> {
        let filters = request.filters();
        match self
            .semantic
            .search(&request.query, &filters, request.limit, request.offset)
            .await
        {
            Ok(out) => Ok(out),
            Err(err) if err.is_provider_failure() => {
                warn!("semantic search failed, retrying with exact engine: {err}");
                self.exact
                    .search(terms, &filters, request.limit, request.offset)
                    .await
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::memory::core::errors::MemoryError;
    use crate::memory::core::item::MemoryItem;
    use crate::memory::search::testing::{StubEmbedder, StubStore, item_with_embedding};

    use super::*;

    fn store_with(values: &[&str]) -> Arc<StubStore> {
        StubStore::new(
            values
                .iter()
                .map(|v| MemoryItem::new(*v, None, vec![]).unwrap())
                .collect(),
        )
    }

    fn service_without_backends(store: Arc<StubStore>) -> SearchService {
        SearchService::new(store, None, None, &SearchConfig::default())
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_backends() {
        let service = service_without_backends(store_with(&[]));
        let mut request = SearchRequest::new("   ");
        request.search_type = SearchType::Hybrid;

        assert!(matches!(
            service.search(request).await,
            Err(MemoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_limit_out_of_bounds_rejected() {
        let service = service_without_backends(store_with(&["x"]));
        let mut request = SearchRequest::new("x");
        request.limit = 500;

        assert!(matches!(
            service.search(request).await,
            Err(MemoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_scenario_single_hit() {
        let service = service_without_backends(store_with(&[
            "FastAPI tutorial about building APIs in Python",
        ]));
        let mut request = SearchRequest::new("python");
        request.search_type = SearchType::Fallback;

        let response = service.search(request).await.unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].score > 0.0);
        assert_eq!(response.effective_search_type, SearchType::Fallback);
    }

    // With no backends at all, every requested type degrades to fallback.
    #[tokio::test]
    async fn test_all_types_degrade_to_fallback_without_backends() {
        let service = service_without_backends(store_with(&["some api notes"]));
        for requested in [
            SearchType::Exact,
            SearchType::Semantic,
            SearchType::Hybrid,
            SearchType::Fallback,
        ] {
            let mut request = SearchRequest::new("api");
            request.search_type = requested;
            let response = service.search(request).await.unwrap();
            assert_eq!(response.effective_search_type, SearchType::Fallback);
            assert_eq!(response.total, 1);
        }
    }

    // Hybrid with the semantic provider absent must rank exactly like a
    // direct exact-engine query.
    #[tokio::test]
    async fn test_hybrid_degrades_to_exact_ranking() {
        let store = store_with(&[
            "api gateway design",
            "api versioning strategy",
            "unrelated grocery list",
            "public api checklist",
            "weekend plans",
        ]);
        // No FTS index in this composition, so "exact" runs through the
        // fallback matcher; the degraded hybrid must match it exactly.
        let service = service_without_backends(store);

        let mut hybrid = SearchRequest::new("api");
        hybrid.search_type = SearchType::Hybrid;
        let hybrid_response = service.search(hybrid).await.unwrap();

        let mut exact = SearchRequest::new("api");
        exact.search_type = SearchType::Exact;
        let exact_response = service.search(exact).await.unwrap();

        let hybrid_ids: Vec<_> = hybrid_response
            .results
            .iter()
            .map(|r| r.memory.id)
            .collect();
        let exact_ids: Vec<_> = exact_response.results.iter().map(|r| r.memory.id).collect();
        assert_eq!(hybrid_ids, exact_ids);
        assert_eq!(hybrid_response.total, exact_response.total);
    }

    #[tokio::test]
    async fn test_semantic_provider_failure_retries_exact() {
        let store = StubStore::new(vec![
            MemoryItem::new("notes about python", None, vec![]).unwrap(),
        ]);
        let service = SearchService::new(
            store,
            None,
            Some(StubEmbedder::failing()),
            &SearchConfig::default(),
        );

        let mut request = SearchRequest::new("python");
        request.search_type = SearchType::Semantic;
        let response = service.search(request).await.unwrap();

        // The response reports the selected type; the results carry the
        // engine that actually produced them.
        assert_eq!(response.effective_search_type, SearchType::Semantic);
        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].engine, "fallback");
    }

    #[tokio::test]
    async fn test_semantic_end_to_end_with_stub_embedder() {
        let vector = [0.0, 1.0];
        let store = StubStore::new(vec![item_with_embedding("remember this", &vector)]);
        let mut vectors = HashMap::new();
        vectors.insert("remember this".to_string(), vector.to_vec());
        let service = SearchService::new(
            store,
            None,
            Some(StubEmbedder::new(vectors)),
            &SearchConfig::default(),
        );

        let mut request = SearchRequest::new("remember this");
        request.search_type = SearchType::Semantic;
        let response = service.search(request).await.unwrap();
        assert_eq!(response.effective_search_type, SearchType::Semantic);
        assert_eq!(response.total, 1);
        assert!((response.results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_response_echoes_filters_and_query() {
        let service = service_without_backends(store_with(&["tagged note"]));
        let mut request = SearchRequest::new("  note ");
        request.search_type = SearchType::Fallback;
        request.tags = Some(vec!["missing".to_string()]);

        let response = service.search(request).await.unwrap();
        assert_eq!(response.query, "note");
        assert_eq!(response.filters.tags, Some(vec!["missing".to_string()]));
        assert_eq!(response.total, 0);
        assert!(response.execution_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_pagination_through_service() {
        let values: Vec<String> = (0..7).map(|i| format!("page entry {i}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let service = service_without_backends(store_with(&refs));

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let mut request = SearchRequest::new("entry");
            request.search_type = SearchType::Fallback;
            request.limit = 3;
            request.offset = offset;
            let response = service.search(request).await.unwrap();
            assert_eq!(response.total, 7);
            if response.results.is_empty() {
                break;
            }
            offset += response.results.len();
            seen.extend(response.results.into_iter().map(|r| r.memory.id));
        }

        assert_eq!(seen.len(), 7);
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 7);
    }
}
