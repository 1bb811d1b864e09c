//! Persistent storage modules for memory data.

pub mod filters;
pub mod fts_index;
pub mod memory_store;

pub use filters::{FilterClause, build_filter_clause};
pub use fts_index::{IndexedMatch, TextIndex, build_match_query};
pub use memory_store::{
    MemoryStore, SqliteMemoryStore, StoreFuture, decode_embedding, encode_embedding,
};
