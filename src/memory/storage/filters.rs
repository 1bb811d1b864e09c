//! Parameterized SQL filter construction.
//!
//! Filters are always expressed as bind parameters. User input never gets
//! concatenated into query text; only fixed column references and
//! placeholders are.

use chrono::SecondsFormat;
use rusqlite::types::Value;

use crate::memory::core::request::SearchFilters;

/// A WHERE fragment with its bind parameters, in placeholder order.
#[derive(Debug, Default)]
pub struct FilterClause {
    /// SQL fragment, empty when no filters apply. Starts with " AND " when
    /// non-empty so it can be appended to an existing WHERE clause.
    pub sql: String,
    /// Bind values, one per `?` placeholder.
    pub params: Vec<Value>,
}

impl FilterClause {
    /// Whether any filter condition was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Build the tag and date-range filter clause for the given table alias.
///
/// Tags match any-of against the stored JSON array (`tags LIKE '%"tag"%'`);
/// date bounds are inclusive against `created_at`.
#[must_use]
pub fn build_filter_clause(filters: &SearchFilters, alias: &str) -> FilterClause {
    let mut sql = String::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(tags) = &filters.tags
        && !tags.is_empty()
    {
        let conditions: Vec<String> = tags
            .iter()
            .map(|_| format!("{alias}.tags LIKE ? ESCAPE '\\'"))
            .collect();
        sql.push_str(&format!(" AND ({})", conditions.join(" OR ")));
        for tag in tags {
            params.push(Value::Text(format!("%\"{}\"%", escape_like(tag))));
        }
    }

    if let Some(from) = filters.date_from {
        sql.push_str(&format!(" AND {alias}.created_at >= ?"));
        params.push(Value::Text(
            from.to_rfc3339_opts(SecondsFormat::Micros, true),
        ));
    }

    if let Some(to) = filters.date_to {
        sql.push_str(&format!(" AND {alias}.created_at <= ?"));
        params.push(Value::Text(to.to_rfc3339_opts(SecondsFormat::Micros, true)));
    }

    FilterClause { sql, params }
}

/// Escape LIKE metacharacters in a user-supplied tag so `%`, `_`, and the
/// escape character itself match literally under `ESCAPE '\'`.
fn escape_like(tag: &str) -> String {
    tag.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
