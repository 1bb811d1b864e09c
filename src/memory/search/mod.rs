//! Hybrid search engine: strategy selection, the individual backends, and
//! the orchestrator.

pub mod exact;
pub mod fallback;
pub mod hybrid;
pub mod paging;
pub mod score;
pub mod semantic;
pub mod service;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use exact::ExactEngine;
pub use fallback::FallbackMatcher;
pub use hybrid::HybridCombiner;
pub use paging::{NO_LIMIT, window};
pub use score::{cosine_similarity, normalize_rank};
pub use semantic::SemanticEngine;
pub use service::SearchService;
pub use strategy::{SearchCapabilities, select_search_type};
