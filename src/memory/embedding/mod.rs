//! Embedding provider abstraction and Ollama implementation.

pub mod embedder;

pub use embedder::{EmbedFuture, Embedder, OllamaEmbedder};
