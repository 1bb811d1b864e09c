//! FTS5 text index seam over the `SQLite` store.

use rusqlite::types::Value;

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::item::MemoryItem;
use crate::memory::core::request::SearchFilters;
use crate::memory::storage::filters::build_filter_clause;
use crate::memory::storage::memory_store::{RawRow, SqliteMemoryStore, StoreFuture};

/// A record matched by the text index with its raw rank signal.
///
/// FTS5 bm25 ranks are negative; smaller means more relevant. The raw value
/// is carried out so score normalization stays a search-engine concern.
#[derive(Clone, Debug)]
pub struct IndexedMatch {
    /// Matched record.
    pub item: MemoryItem,
    /// Backend-native rank, un-normalized.
    pub raw_rank: f64,
}

/// Inverted-text-index abstraction used by the exact-match engine.
pub trait TextIndex: Send + Sync {
    /// Run a match query and return the full ranked match set, best first.
    ///
    /// `match_query` is an already-built FTS5 MATCH expression; it is always
    /// passed as a bind parameter.
    ///
    /// # Errors
    /// Returns an error if the index cannot be queried.
    fn search_ranked(
        &self,
        match_query: String,
        filters: SearchFilters,
    ) -> StoreFuture<'_, MemoryResult<Vec<IndexedMatch>>>;
}

/// Build an FTS5 MATCH expression from query terms.
///
/// Each term is stripped of quote characters and double-quoted, so FTS5
/// operators in user input are matched literally. Terms joined by spaces
/// require all terms to match.
#[must_use]
pub fn build_match_query(terms: &[String]) -> String {
    terms
        .iter()
        .filter_map(|term| {
            let cleaned: String = term.chars().filter(|c| *c != '"' && *c != '\'').collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(format!("\"{cleaned}\""))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl TextIndex for SqliteMemoryStore {
    fn search_ranked(
        &self,
        match_query: String,
        filters: SearchFilters,
    ) -> StoreFuture<'_, MemoryResult<Vec<IndexedMatch>>> {
        Box::pin(async move {
            let table = self.table().to_string();
            let fts_table = self.fts_table().to_string();
            let clause = build_filter_clause(&filters, "m");

            let rows = self
                .connection()
                .call(move |conn| {
                    let sql = format!(
                        "SELECT m.id, m.value, m.summary, m.tags, m.embedding,
                                m.embedding_model, m.created_at, m.updated_at, {fts_table}.rank
                         FROM {table} m
                         JOIN {fts_table} ON m.id = {fts_table}.id
                         WHERE {fts_table} MATCH ?{}
                         ORDER BY {fts_table}.rank",
                        clause.sql
                    );
                    let mut params: Vec<Value> = vec![Value::Text(match_query)];
                    params.extend(clause.params);

                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                            let raw = RawRow::read(row)?;
                            let rank: f64 = row.get(8)?;
                            Ok((raw, rank))
                        })?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            rows.into_iter()
                .map(|(raw, rank)| {
                    Ok(IndexedMatch {
                        item: raw.into_item()?,
                        raw_rank: rank,
                    })
                })
                .collect()
        })
    }
}
