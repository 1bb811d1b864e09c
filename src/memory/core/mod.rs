//! Core memory types, configuration, and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod item;
pub mod request;

pub use config::{EmbeddingConfig, MemoryConfig, SearchConfig, StorageConfig};
pub use errors::{MemoryError, MemoryResult};
pub use ids::MemoryId;
pub use item::{MemoryItem, decode_tags};
pub use request::{
    DEFAULT_LIMIT, MAX_LIMIT, SearchFilters, SearchRequest, SearchResponse, SearchResult,
    SearchType,
};
