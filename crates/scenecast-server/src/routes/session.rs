//! Session routes — upload of upstream-authored render inputs.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::state::{AppState, CreateSessionRequest, RenderSession};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/session", post(create_session).get(get_session))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    if state.is_rendering() {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "Cannot replace the session while a render is running",
            })),
        );
    }

    if req.scenes.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Session needs at least one scene" })),
        );
    }

    let session = RenderSession {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        identity: req.identity,
        scenes: req.scenes,
        prompts: req.prompts,
        reference_images: req.reference_images,
        settings: req.settings,
    };
    let session_id = session.id.clone();
    let scene_count = session.scenes.len();

    state.install_session(session);
    info!("Session {} installed with {} scenes", session_id, scene_count);

    let jobs = state.registry().map(|r| r.snapshot()).unwrap_or_default();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "sessionId": session_id,
            "sceneCount": scene_count,
            "jobs": jobs,
        })),
    )
}

async fn get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.read().clone();
    match session {
        Some(s) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sessionId": s.id,
                "createdAt": s.created_at,
                "sceneCount": s.scenes.len(),
                "promptCount": s.prompts.len(),
                "identityLocked": s.identity.is_some(),
                "settings": s.settings,
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No session loaded" })),
        ),
    }
}
