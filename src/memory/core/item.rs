//! Memory record model with validation helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::ids::MemoryId;

/// A stored memory record.
///
/// `embedding` and `embedding_model` are present together or not at all:
/// both are set when embedding generation previously succeeded for this
/// record. Records are read-only from the search engine's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique memory identifier.
    pub id: MemoryId,
    /// Memory content.
    pub value: String,
    /// Optional derived summary.
    pub summary: Option<String>,
    /// Tags, default empty. Order is irrelevant.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Stored embedding vector, if generation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Model that produced the embedding, present iff `embedding` is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MemoryItem {
    /// Create a new memory record with trimmed content.
    ///
    /// # Errors
    /// Returns an error if `value` is empty after trimming.
    pub fn new(value: impl Into<String>, summary: Option<String>, tags: Vec<String>) -> MemoryResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MemoryError::InvalidRecord("value is empty".to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id: MemoryId::new(),
            value: trimmed.to_string(),
            summary,
            tags,
            embedding: None,
            embedding_model: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach an embedding produced by the named model.
    #[must_use]
    pub fn with_embedding(mut self, vector: Vec<f32>, model: impl Into<String>) -> Self {
        self.embedding = Some(vector);
        self.embedding_model = Some(model.into());
        self
    }

    /// Serialized tag list, as stored in the database.
    ///
    /// # Errors
    /// Returns an error if the tags cannot be serialized.
    pub fn tags_json(&self) -> MemoryResult<String> {
        Ok(serde_json::to_string(&self.tags)?)
    }

    /// Searchable text: value, summary, and serialized tags concatenated.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        let summary = self.summary.as_deref().unwrap_or("");
        let tags = serde_json::to_string(&self.tags).unwrap_or_default();
        format!("{} {} {}", self.value, summary, tags)
    }

    /// Validate the record content.
    ///
    /// # Errors
    /// Returns an error if the content is empty or the embedding pair is
    /// inconsistent.
    pub fn validate(&self) -> MemoryResult<()> {
        if self.value.trim().is_empty() {
            return Err(MemoryError::InvalidRecord("value is empty".to_string()));
        }

        if self.embedding.is_some() != self.embedding_model.is_some() {
            return Err(MemoryError::InvalidRecord(
                "embedding and embedding_model must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

/// Decode the stored tag JSON. Malformed tag data is treated as an empty
/// tag list, never as an error.
#[must_use]
pub fn decode_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
