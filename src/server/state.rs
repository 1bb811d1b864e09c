//! Application state shared across all request handlers.

use std::sync::Arc;

use tracing::warn;

use crate::memory::core::config::MemoryConfig;
use crate::memory::core::errors::MemoryResult;
use crate::memory::embedding::embedder::{Embedder, OllamaEmbedder};
use crate::memory::search::service::SearchService;
use crate::memory::storage::fts_index::TextIndex;
use crate::memory::storage::memory_store::{MemoryStore, SqliteMemoryStore};

/// Shared application state.
pub struct AppState {
    /// Record store for the persistence endpoints.
    pub store: Arc<dyn MemoryStore>,
    /// Search entry point.
    pub search: SearchService,
}

impl AppState {
    /// Compose the state from config: open storage, run the one-shot
    /// capability probe, and wire the search service.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or storage cannot
    /// be opened.
    pub async fn from_config(config: &MemoryConfig) -> MemoryResult<Arc<Self>> {
        config.validate()?;

        let sqlite = Arc::new(SqliteMemoryStore::new(&config.storage).await?);
        let index: Option<Arc<dyn TextIndex>> = if sqlite.fts5_available() {
            Some(sqlite.clone())
        } else {
            None
        };

        let embedder: Option<Arc<dyn Embedder>> = if config.embedding.enabled {
            match OllamaEmbedder::new(&config.embedding) {
                Ok(embedder) => Some(Arc::new(embedder)),
                Err(err) => {
                    warn!("embedding provider unavailable, semantic search disabled: {err}");
                    None
                }
            }
        } else {
            None
        };

        let store: Arc<dyn MemoryStore> = sqlite;
        let search = SearchService::new(store.clone(), index, embedder, &config.search);

        Ok(Arc::new(Self { store, search }))
    }
}
