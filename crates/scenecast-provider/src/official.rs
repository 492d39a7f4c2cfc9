//! Official structured provider — long-running operation API over HTTP.
//!
//! Submit starts an asynchronous render operation, poll reads the operation
//! by name until it reports done, fetch downloads the finished asset with
//! the API key header.

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::{OperationHandle, PollOutcome, ProviderDescriptor, ProviderError, RenderRequest, VideoProvider};
use async_trait::async_trait;

const OFFICIAL_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Map the user-facing model name to the backend model identifier.
fn model_id(target_model: &str) -> String {
    match target_model {
        "veo-3.1" => "veo-3.1-generate-preview".into(),
        other => other.into(),
    }
}

/// Classify a non-success HTTP response from submit.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let quota_exceeded = status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("429")
        || body.contains("quota")
        || body.contains("RESOURCE_EXHAUSTED");
    if quota_exceeded {
        ProviderError::RateLimited(format!("API error {}: {}", status, body))
    } else if status.is_server_error() {
        ProviderError::Transient(format!("API error {}: {}", status, body))
    } else {
        ProviderError::Fatal(format!("API error {}: {}", status, body))
    }
}

/// Client for the official long-running render API.
pub struct OfficialProvider {
    http: Client,
    api_key: String,
    target_model: String,
    base_url: String,
}

impl OfficialProvider {
    pub fn new(http: Client, api_key: String, target_model: &str) -> Self {
        Self {
            http,
            api_key,
            target_model: target_model.to_string(),
            base_url: OFFICIAL_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VideoProvider for OfficialProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            provider: "official".into(),
            model: self.target_model.clone(),
        }
    }

    async fn submit(&self, req: &RenderRequest) -> Result<OperationHandle, ProviderError> {
        let reference_images: Vec<serde_json::Value> = req
            .reference_images
            .iter()
            .map(|img| {
                json!({
                    "image": {
                        "imageBytes": img.data_base64,
                        "mimeType": img.mime_type,
                    },
                    "referenceType": "ASSET",
                })
            })
            .collect();

        let body = json!({
            "instances": [{
                "prompt": req.prompt,
                "referenceImages": reference_images,
            }],
            "parameters": {
                "sampleCount": 1,
                "resolution": req.resolution,
                "aspectRatio": req.aspect_ratio,
            },
        });

        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url,
            model_id(&self.target_model)
        );
        debug!("Submitting render to {}", url);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Fatal(format!("Malformed submit response: {}", e)))?;

        match parsed["name"].as_str() {
            Some(name) => Ok(OperationHandle(name.to_string())),
            None => Err(ProviderError::Fatal(
                "Submit response carried no operation name".into(),
            )),
        }
    }

    async fn poll(&self, op: &OperationHandle) -> Result<PollOutcome, ProviderError> {
        let url = format!("{}/{}", self.base_url, op.0);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transient(format!(
                "Poll error {}: {}",
                status, body
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("Malformed poll response: {}", e)))?;

        if !parsed["done"].as_bool().unwrap_or(false) {
            return Ok(PollOutcome::Pending);
        }

        let result_ref = parsed["response"]["generatedVideos"][0]["video"]["uri"]
            .as_str()
            .map(|s| s.to_string());
        Ok(PollOutcome::Done { result_ref })
    }

    async fn fetch(&self, result_ref: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .http
            .get(result_ref)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::FetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::FetchFailed(format!(
                "Failed to fetch video: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::FetchFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
