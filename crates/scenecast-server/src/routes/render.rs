//! Render routes — start/cancel/retry plus registry observation.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use scenecast_merge::MergeCoordinator;
use scenecast_provider::resolve_provider;
use scenecast_render::{RenderInput, RenderOrchestrator};

use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/render/status", get(get_status))
        .route("/render/events", get(stream_events))
        .route("/render/start", post(start_render))
        .route("/render/cancel", post(cancel_render))
        .route("/render/retry/{scene_id}", post(retry_scene))
}

// ---------------------------------------------------------------
// Observation
// ---------------------------------------------------------------

async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(registry) = state.registry() else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No session loaded" })),
        );
    };

    let jobs = registry.snapshot();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "jobs": jobs,
            "completedCount": registry.completed_count(),
            "totalCount": registry.len(),
            "allCompleted": registry.all_completed(),
            "rendering": state.is_rendering(),
        })),
    )
}

/// SSE stream of registry snapshots: the current one immediately, then one
/// per mutation.
async fn stream_events(State(state): State<Arc<AppState>>) -> Sse<SseStream> {
    let registry = state.registry();

    let stream: SseStream = Box::pin(async_stream::stream! {
        let Some(registry) = registry else {
            yield Ok::<_, Infallible>(Event::default().data("[]".to_string()));
            return;
        };

        let mut rx = registry.subscribe();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            yield Ok(Event::default().data(
                serde_json::to_string(&snapshot).unwrap_or_else(|_| "[]".into()),
            ));
            if rx.changed().await.is_err() {
                return;
            }
        }
    });

    Sse::new(stream)
}

// ---------------------------------------------------------------
// Control
// ---------------------------------------------------------------

async fn start_render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(session) = state.session.read().clone() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No session loaded" })),
        );
    };
    let Some(registry) = state.registry() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No session loaded" })),
        );
    };

    // Configuration errors surface here, before any job is touched.
    if session.identity.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Avatar identity missing. Cannot render." })),
        );
    }

    let credential = state.key_store.read().active_key(&session.settings.provider);
    let provider = match resolve_provider(&session.settings, credential.as_ref(), &state.http) {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            );
        }
    };

    let cancel = CancellationToken::new();
    if !state.begin_run(cancel.clone()) {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "A render is already running" })),
        );
    }

    let input = RenderInput {
        identity: session.identity.clone(),
        prompts: session.prompts.clone(),
        reference_images: session.reference_images.clone(),
        settings: session.settings.clone(),
    };
    let orchestrator = RenderOrchestrator::new(
        provider,
        registry.clone(),
        state.config.data_paths.clips.clone(),
    );
    let auto_merge = session.settings.auto_merge;
    let task_state = state.clone();

    tokio::spawn(async move {
        match orchestrator.run(&input, &cancel).await {
            Ok(outcome) => info!("Render run ended: {:?}", outcome),
            Err(e) => error!("Render run failed: {}", e),
        }
        task_state.end_run();

        if auto_merge && registry.all_completed() {
            let coordinator = MergeCoordinator::new(
                task_state.config.data_paths.scratch.clone(),
                task_state.config.data_paths.output.clone(),
                task_state.http.clone(),
            );
            match coordinator.merge(&registry.snapshot()).await {
                Ok(path) => info!("Auto-merge produced {}", path.display()),
                Err(e) => error!("Auto-merge failed: {}", e),
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "started": true })),
    )
}

async fn cancel_render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stopped = state.cancel_run();
    Json(serde_json::json!({ "stopped": stopped }))
}

async fn retry_scene(
    State(state): State<Arc<AppState>>,
    Path(scene_id): Path<u32>,
) -> impl IntoResponse {
    if state.is_rendering() {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Cannot retry while a render is running" })),
        );
    }

    let Some(registry) = state.registry() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No session loaded" })),
        );
    };

    if !registry.reset_to_pending(scene_id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("Scene {} is not in a failed state", scene_id),
            })),
        );
    }

    info!("Scene {} reset to pending for retry", scene_id);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "reset": true, "jobs": registry.snapshot() })),
    )
}
