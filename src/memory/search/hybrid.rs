//! Hybrid combiner merging exact and semantic result sets.

use std::collections::HashMap;

use tracing::warn;

use crate::memory::core::config::SearchConfig;
use crate::memory::core::errors::MemoryResult;
use crate::memory::core::ids::MemoryId;
use crate::memory::core::request::{SearchFilters, SearchResult};
use crate::memory::search::exact::ExactEngine;
use crate::memory::search::paging::{NO_LIMIT, window};
use crate::memory::search::semantic::SemanticEngine;

/// Weighted identity-keyed merge of the two engines' result sets.
///
/// A memory found by only one engine keeps that engine's weight, so a
/// single-engine hit is capped below its raw score (0.3 for exact-only,
/// 0.7 for semantic-only).
#[derive(Clone, Copy, Debug)]
pub struct HybridCombiner {
    exact_weight: f64,
    semantic_weight: f64,
}

impl HybridCombiner {
    /// Create a combiner with the configured weights.
    #[must_use]
    pub const fn new(config: &SearchConfig) -> Self {
        Self {
            exact_weight: config.exact_weight,
            semantic_weight: config.semantic_weight,
        }
    }

    /// Run both engines over the full candidate set and merge.
    ///
    /// Each engine is invoked unwindowed; per-engine windows would make the
    /// post-merge ranking unsound. The two invocations are independent and
    /// run concurrently. A provider failure on the semantic side downgrades
    /// that side to the exact engine's result set rather than failing the
    /// query.
    ///
    /// # Errors
    /// Returns an error if the exact engine (or the store behind it) fails.
    pub async fn search(
        &self,
        exact: &ExactEngine,
        semantic: &SemanticEngine,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> MemoryResult<(Vec<SearchResult>, usize)> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_string).collect();
        let (exact_out, semantic_out) = tokio::join!(
            exact.search(&terms, filters, NO_LIMIT, 0),
            semantic.search(query, filters, NO_LIMIT, 0),
        );

        let (exact_results, _) = exact_out?;
        let semantic_results = match semantic_out {
            Ok((results, _)) => results,
            Err(err) if err.is_provider_failure() => {
                warn!("semantic side of hybrid search degraded to exact: {err}");
                exact_results.clone()
            }
            Err(err) => return Err(err),
        };

        let merged = self.merge(exact_results, semantic_results);
        Ok(window(merged, offset, limit))
    }

    /// Merge by memory identity and re-sort by combined score.
    #[must_use]
    pub fn merge(
        &self,
        exact_results: Vec<SearchResult>,
        semantic_results: Vec<SearchResult>,
    ) -> Vec<SearchResult> {
        let mut combined: HashMap<MemoryId, SearchResult> = HashMap::new();

        for result in exact_results {
            combined.insert(
                result.memory.id,
                SearchResult {
                    score: result.score * self.exact_weight,
                    memory: result.memory,
                    engine: "hybrid",
                },
            );
        }

        for result in semantic_results {
            let weighted = result.score * self.semantic_weight;
            match combined.get_mut(&result.memory.id) {
                Some(existing) => existing.score += weighted,
                None => {
                    combined.insert(
                        result.memory.id,
                        SearchResult {
                            score: weighted,
                            memory: result.memory,
                            engine: "hybrid",
                        },
                    );
                }
            }
        }

        let mut merged: Vec<SearchResult> = combined.into_values().collect();
        merged.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.memory.id.cmp(&b.memory.id))
        });
        merged
    }
}
