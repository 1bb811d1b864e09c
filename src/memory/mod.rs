//! Memory subsystem: records, storage, embeddings, and hybrid search.
//!
//! Organized into:
//! - `core`: configuration, errors, IDs, records, and request models
//! - `storage`: `SQLite` record store, filter builder, and FTS5 index seam
//! - `embedding`: embedding provider abstraction and Ollama implementation
//! - `search`: the hybrid search engine and its orchestrator

pub mod core;
pub mod embedding;
pub mod search;
pub mod storage;

// Re-export commonly used types for convenience
pub use self::core::{
    EmbeddingConfig, MemoryConfig, MemoryError, MemoryId, MemoryItem, MemoryResult, SearchConfig,
    SearchFilters, SearchRequest, SearchResponse, SearchResult, SearchType, StorageConfig,
};
pub use embedding::{EmbedFuture, Embedder, OllamaEmbedder};
pub use search::{
    ExactEngine, FallbackMatcher, HybridCombiner, SearchCapabilities, SearchService,
    select_search_type,
};
pub use storage::{IndexedMatch, MemoryStore, SqliteMemoryStore, StoreFuture, TextIndex};
