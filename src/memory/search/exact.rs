//! Exact-term search over the inverted text index.

use std::sync::Arc;

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::request::{SearchFilters, SearchResult};
use crate::memory::search::fallback::FallbackMatcher;
use crate::memory::search::paging::window;
use crate::memory::search::score::normalize_rank;
use crate::memory::storage::fts_index::{TextIndex, build_match_query};

/// Exact-match engine backed by the FTS5 index.
///
/// When the index is structurally unavailable the engine delegates entirely
/// to the fallback matcher; that is a recoverable downgrade, not an error.
#[derive(Clone)]
pub struct ExactEngine {
    index: Option<Arc<dyn TextIndex>>,
    fallback: FallbackMatcher,
}

impl ExactEngine {
    /// Create an engine over an optional index and its fallback.
    #[must_use]
    pub fn new(index: Option<Arc<dyn TextIndex>>, fallback: FallbackMatcher) -> Self {
        Self { index, fallback }
    }

    /// AND-semantics term search, scoped by tag and date filters.
    ///
    /// The full ranked match set is retrieved from the index before
    /// windowing so the native ranking order survives cross-engine merges.
    /// Index rank is normalized onto [0.1, 1.0].
    ///
    /// # Errors
    /// Returns an error if the index or store cannot be queried.
    pub async fn search(
        &self,
        terms: &[String],
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> MemoryResult<(Vec<SearchResult>, usize)> {
        let Some(index) = &self.index else {
            return self.fallback.search(terms, filters, limit, offset).await;
        };

        let match_query = build_match_query(terms);
        if match_query.is_empty() {
            return self.fallback.search(terms, filters, limit, offset).await;
        }

        let matches = index.search_ranked(match_query, filters.clone()).await?;
        let results: Vec<SearchResult> = matches
            .into_iter()
            .map(|hit| SearchResult {
                score: normalize_rank(hit.raw_rank),
                memory: hit.item,
                engine: "exact",
            })
            .collect();

        Ok(window(results, offset, limit))
    }
}
