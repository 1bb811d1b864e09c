//! Memory record store backed by `SQLite`.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::{info, warn};

use crate::memory::core::config::StorageConfig;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::ids::MemoryId;
use crate::memory::core::item::{MemoryItem, decode_tags};
use crate::memory::core::request::SearchFilters;
use crate::memory::storage::filters::build_filter_clause;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-plus-mutate store abstraction for memory records.
///
/// Search engines only use `find`; mutation exists for the API layer and
/// tests. Each read sees a committed, self-consistent record snapshot.
pub trait MemoryStore: Send + Sync {
    /// Filtered scan returning candidate records, most recently updated
    /// first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    fn find(&self, filters: SearchFilters) -> StoreFuture<'_, MemoryResult<Vec<MemoryItem>>>;
    /// Fetch a single record by id.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    fn get(&self, id: MemoryId) -> StoreFuture<'_, MemoryResult<Option<MemoryItem>>>;
    /// Insert a new record.
    ///
    /// # Errors
    /// Returns an error if the record is invalid or cannot be persisted.
    fn insert(&self, item: MemoryItem) -> StoreFuture<'_, MemoryResult<()>>;
    /// Update an existing record.
    ///
    /// # Errors
    /// Returns an error if the record does not exist or cannot be persisted.
    fn update(&self, item: MemoryItem) -> StoreFuture<'_, MemoryResult<()>>;
    /// Delete a record by id; returns whether a record was removed.
    ///
    /// # Errors
    /// Returns an error if deletion fails.
    fn delete(&self, id: MemoryId) -> StoreFuture<'_, MemoryResult<bool>>;
    /// Total number of stored records.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    fn count(&self) -> StoreFuture<'_, MemoryResult<u64>>;
}

const SELECT_COLUMNS: &str =
    "id, value, summary, tags, embedding, embedding_model, created_at, updated_at";

/// Raw row as read from `SQLite`, decoded into a `MemoryItem` outside the
/// connection closure.
pub(crate) struct RawRow {
    pub(crate) id: String,
    pub(crate) value: String,
    pub(crate) summary: Option<String>,
    pub(crate) tags: String,
    pub(crate) embedding: Option<Vec<u8>>,
    pub(crate) embedding_model: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl RawRow {
    pub(crate) fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            value: row.get(1)?,
            summary: row.get(2)?,
            tags: row.get(3)?,
            embedding: row.get(4)?,
            embedding_model: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    /// Decode into a `MemoryItem`. Malformed tag JSON decodes to an empty
    /// tag list; a malformed embedding blob is dropped with a warning so the
    /// record still participates in non-semantic search.
    pub(crate) fn into_item(self) -> MemoryResult<MemoryItem> {
        let id = MemoryId::from_str(&self.id)
            .map_err(|err| MemoryError::InvalidRecord(format!("invalid memory id: {err}")))?;
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_timestamp(&self.updated_at)?;

        let tags = decode_tags(&self.tags);
        let (embedding, embedding_model) = match self.embedding {
            Some(blob) => match decode_embedding(&blob) {
                Some(vector) => (Some(vector), self.embedding_model),
                None => {
                    warn!("skipping malformed embedding blob for memory {id}");
                    (None, None)
                }
            },
            None => (None, None),
        };

        Ok(MemoryItem {
            id,
            value: self.value,
            summary: self.summary,
            tags,
            embedding,
            embedding_model,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> MemoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| MemoryError::InvalidRecord(format!("invalid timestamp: {err}")))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Encode an embedding vector as a little-endian f32 blob.
#[must_use]
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for component in vector {
        blob.extend_from_slice(&component.to_le_bytes());
    }
    blob
}

/// Decode a little-endian f32 blob; `None` if the length is not a multiple
/// of four bytes.
#[must_use]
pub fn decode_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }

    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// `SQLite` implementation of the memory store.
///
/// Creates the record table at startup, probes for FTS5 support once, and
/// when available maintains a synchronized FTS5 virtual table through
/// triggers.
#[derive(Clone)]
pub struct SqliteMemoryStore {
    conn: Connection,
    table: String,
    fts_table: String,
    fts5: bool,
}

impl SqliteMemoryStore {
    /// Open the database, create the schema, and probe FTS5 support.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub async fn new(config: &StorageConfig) -> MemoryResult<Self> {
        let conn = Connection::open(&config.sqlite_path).await?;
        Self::with_connection(conn, &config.memory_table).await
    }

    /// Build a store on an in-memory database. Used by tests.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn open_in_memory(table: &str) -> MemoryResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn, table).await
    }

    async fn with_connection(conn: Connection, table: &str) -> MemoryResult<Self> {
        let table = table.to_string();
        let fts_table = format!("{table}_fts");

        let table_name = table.clone();
        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    summary TEXT,
                    tags TEXT NOT NULL DEFAULT '[]',
                    embedding BLOB,
                    embedding_model TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_updated_at
                    ON {table_name} (updated_at);"
            ))?;
            Ok(())
        })
        .await?;

        let fts5 = probe_fts5(&conn).await;
        if fts5 {
            create_fts_schema(&conn, &table, &fts_table).await?;
            info!("FTS5 full-text index enabled on {fts_table}");
        } else {
            info!("FTS5 not available; exact search will use the fallback matcher");
        }

        Ok(Self {
            conn,
            table,
            fts_table,
            fts5,
        })
    }

    /// Whether the FTS5 index is available on this store.
    #[must_use]
    pub const fn fts5_available(&self) -> bool {
        self.fts5
    }

    pub(crate) const fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    pub(crate) fn fts_table(&self) -> &str {
        &self.fts_table
    }
}

/// One-shot capability probe: try to create and drop a throwaway FTS5 table.
async fn probe_fts5(conn: &Connection) -> bool {
    conn.call(|conn| {
        let supported = conn
            .execute_batch(
                "CREATE VIRTUAL TABLE IF NOT EXISTS fts5_probe USING fts5(content);
                 DROP TABLE fts5_probe;",
            )
            .is_ok();
        Ok(supported)
    })
    .await
    .unwrap_or(false)
}

async fn create_fts_schema(conn: &Connection, table: &str, fts_table: &str) -> MemoryResult<()> {
    let table = table.to_string();
    let fts_table = fts_table.to_string();
    conn.call(move |conn| {
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {fts_table} USING fts5(
                id UNINDEXED,
                value,
                summary,
                tags,
                tokenize='unicode61 remove_diacritics 2'
            );
            CREATE TRIGGER IF NOT EXISTS {fts_table}_insert
            AFTER INSERT ON {table}
            BEGIN
                INSERT INTO {fts_table}(id, value, summary, tags)
                VALUES (new.id, new.value, COALESCE(new.summary, ''), new.tags);
            END;
            CREATE TRIGGER IF NOT EXISTS {fts_table}_update
            AFTER UPDATE ON {table}
            BEGIN
                UPDATE {fts_table}
                SET value = new.value,
                    summary = COALESCE(new.summary, ''),
                    tags = new.tags
                WHERE id = new.id;
            END;
            CREATE TRIGGER IF NOT EXISTS {fts_table}_delete
            AFTER DELETE ON {table}
            BEGIN
                DELETE FROM {fts_table} WHERE id = old.id;
            END;"
        ))?;
        Ok(())
    })
    .await?;
    Ok(())
}

impl MemoryStore for SqliteMemoryStore {
    fn find(&self, filters: SearchFilters) -> StoreFuture<'_, MemoryResult<Vec<MemoryItem>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let clause = build_filter_clause(&filters, "m");
            let rows = self
                .conn
                .call(move |conn| {
                    let sql = format!(
                        "SELECT {SELECT_COLUMNS} FROM {table} m
                         WHERE 1=1{}
                         ORDER BY m.updated_at DESC",
                        clause.sql
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(rusqlite::params_from_iter(clause.params.iter()), |row| {
                            RawRow::read(row)
                        })?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            rows.into_iter().map(RawRow::into_item).collect()
        })
    }

    fn get(&self, id: MemoryId) -> StoreFuture<'_, MemoryResult<Option<MemoryItem>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let id_text = id.to_string();
            let row = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            &format!("SELECT {SELECT_COLUMNS} FROM {table} WHERE id = ?"),
                            rusqlite::params![id_text],
                            RawRow::read,
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;

            row.map(RawRow::into_item).transpose()
        })
    }

    fn insert(&self, item: MemoryItem) -> StoreFuture<'_, MemoryResult<()>> {
        Box::pin(async move {
            item.validate()?;
            let table = self.table.clone();
            let tags = item.tags_json()?;
            let blob = item.embedding.as_deref().map(encode_embedding);
            let created_at = format_timestamp(item.created_at);
            let updated_at = format_timestamp(item.updated_at);

            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table}
                             (id, value, summary, tags, embedding, embedding_model,
                              created_at, updated_at)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                        ),
                        rusqlite::params![
                            item.id.to_string(),
                            item.value,
                            item.summary,
                            tags,
                            blob,
                            item.embedding_model,
                            created_at,
                            updated_at,
                        ],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn update(&self, item: MemoryItem) -> StoreFuture<'_, MemoryResult<()>> {
        Box::pin(async move {
            item.validate()?;
            let table = self.table.clone();
            let tags = item.tags_json()?;
            let blob = item.embedding.as_deref().map(encode_embedding);
            let updated_at = format_timestamp(item.updated_at);
            let id_text = item.id.to_string();

            let changed = self
                .conn
                .call(move |conn| {
                    let changed = conn.execute(
                        &format!(
                            "UPDATE {table}
                             SET value = ?1, summary = ?2, tags = ?3, embedding = ?4,
                                 embedding_model = ?5, updated_at = ?6
                             WHERE id = ?7"
                        ),
                        rusqlite::params![
                            item.value,
                            item.summary,
                            tags,
                            blob,
                            item.embedding_model,
                            updated_at,
                            id_text,
                        ],
                    )?;
                    Ok(changed)
                })
                .await?;

            if changed == 0 {
                return Err(MemoryError::NotFound(item.id.to_string()));
            }
            Ok(())
        })
    }

    fn delete(&self, id: MemoryId) -> StoreFuture<'_, MemoryResult<bool>> {
        Box::pin(async move {
            let table = self.table.clone();
            let id_text = id.to_string();
            let deleted = self
                .conn
                .call(move |conn| {
                    let deleted = conn.execute(
                        &format!("DELETE FROM {table} WHERE id = ?"),
                        rusqlite::params![id_text],
                    )?;
                    Ok(deleted)
                })
                .await?;
            Ok(deleted > 0)
        })
    }

    fn count(&self) -> StoreFuture<'_, MemoryResult<u64>> {
        Box::pin(async move {
            let table = self.table.clone();
            let count = self
                .conn
                .call(move |conn| {
                    let count: i64 =
                        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                            row.get(0)
                        })?;
                    Ok(count)
                })
                .await?;
            u64::try_from(count)
                .map_err(|_| MemoryError::InvalidRecord("negative row count".to_string()))
        })
    }
}
