//! Merge route — concatenate all completed clips into one output asset.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use scenecast_merge::MergeCoordinator;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/merge", post(run_merge))
}

async fn run_merge(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.is_rendering() {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Cannot merge while a render is running" })),
        );
    }

    let Some(registry) = state.registry() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No session loaded" })),
        );
    };

    let coordinator = MergeCoordinator::new(
        state.config.data_paths.scratch.clone(),
        state.config.data_paths.output.clone(),
        state.http.clone(),
    );

    // Merge failure leaves every job untouched; it can simply be retried.
    match coordinator.merge(&registry.snapshot()).await {
        Ok(path) => {
            info!("Merge produced {}", path.display());
            (
                StatusCode::OK,
                Json(serde_json::json!({ "outputPath": path.display().to_string() })),
            )
        }
        Err(e) => {
            error!("Merge failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}
