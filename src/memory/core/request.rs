//! Search request and response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::item::MemoryItem;

/// Maximum accepted page size.
pub const MAX_LIMIT: usize = 100;
/// Default page size when the request omits one.
pub const DEFAULT_LIMIT: usize = 20;

/// Which search backend the caller asked for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Exact-term search via the full-text index.
    Exact,
    /// Embedding-similarity search.
    Semantic,
    /// Weighted combination of exact and semantic.
    #[default]
    Hybrid,
    /// Naive substring scan, always available.
    Fallback,
}

impl SearchType {
    /// Stable wire name for this search type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
            Self::Fallback => "fallback",
        }
    }
}

impl core::fmt::Display for SearchType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters applied to every search backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Match-any tag filter.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Inclusive lower bound on `created_at`.
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
}

impl SearchFilters {
    /// Whether a record passes the tag and date filters.
    #[must_use]
    pub fn matches(&self, item: &MemoryItem) -> bool {
        if let Some(tags) = &self.tags
            && !tags.is_empty()
            && !tags.iter().any(|tag| item.tags.contains(tag))
        {
            return false;
        }

        if let Some(from) = self.date_from
            && item.created_at < from
        {
            return false;
        }

        if let Some(to) = self.date_to
            && item.created_at > to
        {
            return false;
        }

        true
    }
}

/// A search request consumed by the orchestrator.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchRequest {
    /// Free-text query, non-empty after trimming.
    pub query: String,
    /// Match-any tag filter.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Inclusive lower bound on `created_at`.
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
    /// Page size, 1..=100.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Page offset.
    #[serde(default)]
    pub offset: usize,
    /// Requested backend.
    #[serde(default)]
    pub search_type: SearchType,
}

const fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl SearchRequest {
    /// Build a request with default paging and hybrid search.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tags: None,
            date_from: None,
            date_to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            search_type: SearchType::default(),
        }
    }

    /// Validate query and paging bounds, trimming the query in place.
    ///
    /// # Errors
    /// Returns `MemoryError::Validation` for an empty query or a limit
    /// outside 1..=100.
    pub fn validate(&mut self) -> MemoryResult<()> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(MemoryError::Validation(
                "search query cannot be empty".to_string(),
            ));
        }
        self.query = trimmed.to_string();

        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(MemoryError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        Ok(())
    }

    /// The filters this request carries.
    #[must_use]
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            tags: self.tags.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }

    /// Whitespace-split query terms.
    #[must_use]
    pub fn terms(&self) -> Vec<String> {
        self.query.split_whitespace().map(str::to_string).collect()
    }
}

/// A single scored search hit.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    /// The matched memory record.
    pub memory: MemoryItem,
    /// Relevance score in [0, 1].
    pub score: f64,
    /// Backend that produced this hit ("hybrid" when merged).
    pub engine: &'static str,
}

/// Windowed, ranked search response with execution diagnostics.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
    /// Ranked results, already windowed by limit/offset.
    pub results: Vec<SearchResult>,
    /// Match count before windowing.
    pub total: usize,
    /// Original query text.
    pub query: String,
    /// Backend actually used after the downgrade chain.
    pub effective_search_type: SearchType,
    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: f64,
    /// Filters that were applied.
    pub filters: SearchFilters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_query() {
        let mut request = SearchRequest::new("  python  ");
        request.validate().unwrap();
        assert_eq!(request.query, "python");
    }

    #[test]
    fn test_validate_rejects_empty_query() {
        let mut request = SearchRequest::new("   ");
        assert!(matches!(
            request.validate(),
            Err(MemoryError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_limit_bounds() {
        let mut request = SearchRequest::new("q");
        request.limit = 0;
        assert!(request.validate().is_err());
        request.limit = 101;
        assert!(request.validate().is_err());
        request.limit = 100;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: SearchRequest = serde_json::from_str(r#"{"query": "api"}"#).unwrap();
        assert_eq!(request.limit, DEFAULT_LIMIT);
        assert_eq!(request.offset, 0);
        assert_eq!(request.search_type, SearchType::Hybrid);
        assert!(request.tags.is_none());
    }

    #[test]
    fn test_filters_match_any_tag() {
        let item = crate::memory::core::item::MemoryItem::new(
            "note",
            None,
            vec!["work".to_string(), "rust".to_string()],
        )
        .unwrap();

        let filters = SearchFilters {
            tags: Some(vec!["personal".to_string(), "rust".to_string()]),
            ..SearchFilters::default()
        };
        assert!(filters.matches(&item));

        let filters = SearchFilters {
            tags: Some(vec!["personal".to_string()]),
            ..SearchFilters::default()
        };
        assert!(!filters.matches(&item));
    }

    #[test]
    fn test_filters_date_bounds_inclusive() {
        let item = crate::memory::core::item::MemoryItem::new("note", None, vec![]).unwrap();
        let filters = SearchFilters {
            date_from: Some(item.created_at),
            date_to: Some(item.created_at),
            ..SearchFilters::default()
        };
        assert!(filters.matches(&item));
    }
}
