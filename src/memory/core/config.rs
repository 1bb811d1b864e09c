//! Configuration for the memory subsystem.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::memory::core::errors::{MemoryError, MemoryResult};

/// Top-level configuration for the memory service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Embedding model settings.
    pub embedding: EmbeddingConfig,
    /// Search engine settings.
    pub search: SearchConfig,
}

impl MemoryConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> MemoryResult<()> {
        if self.storage.memory_table.is_empty() {
            return Err(MemoryError::InvalidConfig(
                "storage.memory_table must not be empty".to_string(),
            ));
        }

        if self.embedding.enabled {
            if self.embedding.model.is_empty() {
                return Err(MemoryError::InvalidConfig(
                    "embedding.model must be set when embedding is enabled".to_string(),
                ));
            }
            if self.embedding.ndims == 0 {
                return Err(MemoryError::InvalidConfig(
                    "embedding.ndims must be > 0".to_string(),
                ));
            }
        }

        if let Some(base_url) = &self.embedding.base_url {
            Url::parse(base_url)?;
        }

        if !(0.0..=1.0).contains(&self.search.exact_weight)
            || !(0.0..=1.0).contains(&self.search.semantic_weight)
        {
            return Err(MemoryError::InvalidConfig(
                "search weights must be in [0, 1]".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.search.min_similarity) {
            return Err(MemoryError::InvalidConfig(
                "search.min_similarity must be in [0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}

/// Storage configuration for memory data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Memory table name.
    pub memory_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("mnemo.sqlite"),
            memory_table: "memories".to_string(),
        }
    }
}

/// Embedding model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Whether semantic search is enabled at all.
    pub enabled: bool,
    /// Ollama embedding model name.
    pub model: String,
    /// Embedding vector dimensions.
    pub ndims: usize,
    /// Optional custom base URL.
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "nomic-embed-text".to_string(),
            ndims: 768,
            base_url: None,
        }
    }
}

/// Search engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight applied to exact-match scores in hybrid merge.
    pub exact_weight: f64,
    /// Weight applied to semantic scores in hybrid merge.
    pub semantic_weight: f64,
    /// Minimum cosine similarity kept by the semantic engine.
    pub min_similarity: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exact_weight: 0.3,
            semantic_weight: 0.7,
            min_similarity: 0.1,
        }
    }
}
