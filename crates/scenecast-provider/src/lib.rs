//! Video generation provider clients.
//!
//! One `submit`/`poll`/`fetch` contract over an official structured
//! long-running-operation backend and simpler mock backends. The render
//! loop drives every backend through the same trait.

pub mod keys;
pub mod mock;
pub mod official;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use scenecast_core::{ApiKey, ReferenceImage, RenderSettings, ScenePrompt};

pub use keys::KeyStore;
pub use mock::MockProvider;
pub use official::OfficialProvider;

/// Classified provider failure.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Per-minute or daily quota hit; retryable up to the backoff budget.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network hiccup or server-side 5xx; safe to retry.
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Validation or provider-side failure; not retryable.
    #[error("Fatal provider error: {0}")]
    Fatal(String),

    /// Asset download failed after a successful render.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transient(e.to_string())
    }
}

/// Opaque reference to a provider's in-flight render operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(pub String);

/// Result of polling an operation.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Still rendering; poll again after the configured interval.
    Pending,
    /// Finished. `result_ref` is absent when the provider reported done
    /// without an asset, which the caller must treat as fatal.
    Done { result_ref: Option<String> },
}

/// One render submission: prompt plus output-format parameters.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub prompt: String,
    pub reference_images: Vec<ReferenceImage>,
    pub resolution: String,
    pub aspect_ratio: String,
}

impl RenderRequest {
    /// Build a request from a scene's prompt payload. Structured payloads
    /// are stringified; plain-text payloads pass through unchanged.
    pub fn from_prompt(prompt: &ScenePrompt, reference_images: &[ReferenceImage]) -> Self {
        let text = match &prompt.prompt_content {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            prompt: text,
            reference_images: reference_images.to_vec(),
            resolution: "720p".into(),
            aspect_ratio: "16:9".into(),
        }
    }
}

/// Provider and model identifiers recorded on completed jobs.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub provider: String,
    pub model: String,
}

/// A video generation backend.
///
/// `submit` starts a render and returns an operation handle; `poll` reports
/// progress on that handle; `fetch` downloads the finished asset. Mock
/// backends complete on the first poll, so callers need no special-casing.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn descriptor(&self) -> ProviderDescriptor;

    async fn submit(&self, req: &RenderRequest) -> Result<OperationHandle, ProviderError>;

    async fn poll(&self, op: &OperationHandle) -> Result<PollOutcome, ProviderError>;

    async fn fetch(&self, result_ref: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Select and construct the backend for the given settings.
///
/// `official` + `veo-3.1` routes to the structured long-running backend;
/// every other provider/model combination uses the mock backend. A provider
/// without an enabled credential is a configuration error, surfaced before
/// any job is touched.
pub fn resolve_provider(
    settings: &RenderSettings,
    credential: Option<&ApiKey>,
    http: &reqwest::Client,
) -> scenecast_core::Result<Arc<dyn VideoProvider>> {
    let key = credential.map(|k| k.key.clone());

    if settings.provider == "official" && settings.target_model == "veo-3.1" {
        let key = key.ok_or_else(|| {
            scenecast_core::Error::Config(
                "No active API key found for provider: official".into(),
            )
        })?;
        return Ok(Arc::new(OfficialProvider::new(
            http.clone(),
            key,
            &settings.target_model,
        )));
    }

    if settings.provider != "official" && key.is_none() {
        return Err(scenecast_core::Error::Config(format!(
            "No active API key found for provider: {}",
            settings.provider
        )));
    }

    Ok(Arc::new(MockProvider::new(
        &settings.provider,
        &settings.target_model,
        Duration::from_secs(3),
    )))
}
