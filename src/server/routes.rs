//! HTTP route handlers for the memory API.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::memory::core::errors::MemoryError;
use crate::memory::core::ids::MemoryId;
use crate::memory::core::item::MemoryItem;
use crate::memory::core::request::{SearchFilters, SearchRequest};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/search", post(search_memories))
        .route("/api/memories", post(create_memory).get(list_memories))
        .route(
            "/api/memories/{id}",
            get(get_memory).put(update_memory).delete(delete_memory),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mnemo",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn map_error(err: &MemoryError) -> (StatusCode, String) {
    match err {
        MemoryError::Validation(_) | MemoryError::InvalidRecord(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        MemoryError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Handle search requests.
async fn search_memories(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let response = state
        .search
        .search(request)
        .await
        .map_err(|err| map_error(&err))?;
    Ok(Json(response))
}

/// Create-memory request body.
#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    /// Memory content.
    pub value: String,
    /// Optional summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Tags, default empty.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Handle memory creation.
async fn create_memory(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateMemoryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let item = MemoryItem::new(request.value, request.summary, request.tags)
        .map_err(|err| map_error(&err))?;
    state
        .store
        .insert(item.clone())
        .await
        .map_err(|err| map_error(&err))?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List all stored memories, most recently updated first.
async fn list_memories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let items = state
        .store
        .find(SearchFilters::default())
        .await
        .map_err(|err| map_error(&err))?;
    Ok(Json(items))
}

/// Update-memory request body. Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateMemoryRequest {
    /// Replacement content.
    #[serde(default)]
    pub value: Option<String>,
    /// Replacement summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Replacement tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Handle memory updates.
async fn update_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMemoryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = parse_id(&id)?;
    let mut item = state
        .store
        .get(id)
        .await
        .map_err(|err| map_error(&err))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("memory not found: {id}")))?;

    if let Some(value) = request.value {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err((StatusCode::BAD_REQUEST, "value cannot be empty".to_string()));
        }
        if trimmed != item.value {
            // The stored vector no longer describes the content.
            item.embedding = None;
            item.embedding_model = None;
        }
        item.value = trimmed.to_string();
    }
    if let Some(summary) = request.summary {
        item.summary = Some(summary);
    }
    if let Some(tags) = request.tags {
        item.tags = tags;
    }
    item.updated_at = Utc::now();

    state
        .store
        .update(item.clone())
        .await
        .map_err(|err| map_error(&err))?;
    Ok(Json(item))
}

fn parse_id(raw: &str) -> Result<MemoryId, (StatusCode, String)> {
    raw.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid memory id: {raw}")))
}

/// Fetch a memory by id.
async fn get_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = parse_id(&id)?;
    let item = state
        .store
        .get(id)
        .await
        .map_err(|err| map_error(&err))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("memory not found: {id}")))?;
    Ok(Json(item))
}

/// Delete a memory by id.
async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = parse_id(&id)?;
    let deleted = state
        .store
        .delete(id)
        .await
        .map_err(|err| map_error(&err))?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, format!("memory not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
