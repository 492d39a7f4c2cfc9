//! Credential routes — API key CRUD and validation.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/keys", get(list_keys).post(add_key))
        .route("/keys/{id}", put(update_key).delete(remove_key))
        .route("/keys/test", post(test_key))
}

#[derive(Debug, Deserialize)]
struct AddKeyRequest {
    name: String,
    key: String,
    provider: String,
}

#[derive(Debug, Deserialize)]
struct UpdateKeyRequest {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct TestKeyRequest {
    provider: String,
    #[serde(rename = "apiKey")]
    api_key: String,
}

async fn list_keys(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.key_store.read().list())
}

async fn add_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddKeyRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() || req.key.trim().is_empty() || req.provider.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "name, key, and provider are required" })),
        );
    }

    let record = state
        .key_store
        .write()
        .add(&req.name, &req.key, &req.provider);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "id": record.id,
            "name": record.name,
            "provider": record.provider,
            "enabled": record.enabled,
            "createdAt": record.created_at,
        })),
    )
}

async fn update_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateKeyRequest>,
) -> impl IntoResponse {
    match state.key_store.write().set_enabled(&id, req.enabled) {
        Some(record) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": record.id, "enabled": record.enabled })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Key not found" })),
        ),
    }
}

async fn remove_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.key_store.write().remove(&id) {
        (StatusCode::OK, Json(serde_json::json!({ "deleted": true })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Key not found" })),
        )
    }
}

async fn test_key(Json(req): Json<TestKeyRequest>) -> impl IntoResponse {
    match scenecast_provider::validate::validate_key(&req.provider, &req.api_key).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))),
        Err(e) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": false, "error": e })),
        ),
    }
}
