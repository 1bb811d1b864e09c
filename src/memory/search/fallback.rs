//! Naive substring fallback matcher, always available.

use std::sync::Arc;

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::request::{SearchFilters, SearchResult};
use crate::memory::search::paging::window;
use crate::memory::storage::memory_store::MemoryStore;

/// Score contribution per term occurrence.
const OCCURRENCE_WEIGHT: f64 = 0.1;

/// Keyword matcher scanning raw fields when no index exists.
#[derive(Clone)]
pub struct FallbackMatcher {
    store: Arc<dyn MemoryStore>,
}

impl FallbackMatcher {
    /// Create a matcher over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Substring search over value, summary, and serialized tags.
    ///
    /// A record matches when every term occurs case-insensitively in the
    /// concatenated fields. The full match set is ordered most recently
    /// updated first, ties broken by score descending, then windowed.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    pub async fn search(
        &self,
        terms: &[String],
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> MemoryResult<(Vec<SearchResult>, usize)> {
        let candidates = self.store.find(filters.clone()).await?;
        let terms: Vec<String> = terms.iter().map(|term| term.to_lowercase()).collect();

        let mut matches: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|item| {
                let haystack = item.searchable_text().to_lowercase();
                if !terms.iter().all(|term| haystack.contains(term)) {
                    return None;
                }

                let occurrences: usize = terms
                    .iter()
                    .map(|term| haystack.matches(term).count())
                    .sum();
                #[allow(clippy::cast_precision_loss)]
                let score = (occurrences as f64 * OCCURRENCE_WEIGHT).min(1.0);
                Some(SearchResult {
                    memory: item,
                    score,
                    engine: "fallback",
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.memory
                .updated_at
                .cmp(&a.memory.updated_at)
                .then_with(|| b.score.total_cmp(&a.score))
        });

        Ok(window(matches, offset, limit))
    }
}
