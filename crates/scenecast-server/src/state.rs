//! Shared application state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use scenecast_core::{AvatarIdentity, ReferenceImage, RenderSettings, Scene, ScenecastConfig, ScenePrompt};
use scenecast_provider::KeyStore;
use scenecast_render::RenderRegistry;

/// Inputs for one orchestration session, produced by the upstream
/// authoring steps and uploaded in one piece.
#[derive(Debug, Clone)]
pub struct RenderSession {
    pub id: String,
    pub created_at: String,
    pub identity: Option<AvatarIdentity>,
    pub scenes: Vec<Scene>,
    pub prompts: Vec<ScenePrompt>,
    pub reference_images: Vec<ReferenceImage>,
    pub settings: RenderSettings,
}

/// Request body for creating a session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub identity: Option<AvatarIdentity>,
    pub scenes: Vec<Scene>,
    pub prompts: Vec<ScenePrompt>,
    #[serde(default, rename = "referenceImages")]
    pub reference_images: Vec<ReferenceImage>,
    #[serde(default)]
    pub settings: RenderSettings,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ScenecastConfig,
    pub http: reqwest::Client,
    pub key_store: RwLock<KeyStore>,
    pub session: RwLock<Option<RenderSession>>,
    registry: RwLock<Option<Arc<RenderRegistry>>>,
    rendering: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl AppState {
    pub fn new(config: ScenecastConfig) -> Self {
        let key_store = KeyStore::load(&config.data_paths.keys_file);

        Self {
            config,
            http: reqwest::Client::new(),
            key_store: RwLock::new(key_store),
            session: RwLock::new(None),
            registry: RwLock::new(None),
            rendering: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// Replace the session and seed a fresh registry from its scenes.
    /// Any prior session and its jobs are discarded.
    pub fn install_session(&self, session: RenderSession) {
        let registry = Arc::new(RenderRegistry::new(&session.scenes));
        *self.registry.write() = Some(registry);
        *self.session.write() = Some(session);
    }

    pub fn registry(&self) -> Option<Arc<RenderRegistry>> {
        self.registry.read().clone()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    /// Claim the single render slot. Returns false if a run is active.
    pub fn begin_run(&self, cancel: CancellationToken) -> bool {
        if self
            .rendering
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        *self.cancel.lock() = Some(cancel);
        true
    }

    pub fn end_run(&self) {
        *self.cancel.lock() = None;
        self.rendering.store(false, Ordering::SeqCst);
    }

    /// Signal cancellation to the active run, if any.
    pub fn cancel_run(&self) -> bool {
        match self.cancel.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}
