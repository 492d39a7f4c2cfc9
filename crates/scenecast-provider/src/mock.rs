//! Mock provider — fixed delay, deterministic success.
//!
//! Stands in for backends without a structured long-running API. Completes
//! on the first poll, so the render loop's polling and backoff paths are
//! simply never exercised.

use std::time::Duration;

use async_trait::async_trait;

use crate::{OperationHandle, PollOutcome, ProviderDescriptor, ProviderError, RenderRequest, VideoProvider};

/// Reference asset returned for every mock render.
pub const MOCK_CLIP_REFERENCE: &str =
    "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4";

pub struct MockProvider {
    provider: String,
    model: String,
    delay: Duration,
}

impl MockProvider {
    pub fn new(provider: &str, model: &str, delay: Duration) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            delay,
        }
    }
}

#[async_trait]
impl VideoProvider for MockProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            provider: self.provider.clone(),
            model: self.model.clone(),
        }
    }

    async fn submit(&self, _req: &RenderRequest) -> Result<OperationHandle, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(OperationHandle("mock-operation".into()))
    }

    async fn poll(&self, _op: &OperationHandle) -> Result<PollOutcome, ProviderError> {
        Ok(PollOutcome::Done {
            result_ref: Some(MOCK_CLIP_REFERENCE.to_string()),
        })
    }

    async fn fetch(&self, result_ref: &str) -> Result<Vec<u8>, ProviderError> {
        // Deterministic stub bytes keep offline runs and tests self-contained.
        Ok(format!("SCENECAST-MOCK-CLIP {}", result_ref).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_render_completes_on_first_poll() {
        let provider = MockProvider::new("fal.ai", "sora-2", Duration::from_millis(1));
        let req = RenderRequest {
            prompt: "test".into(),
            reference_images: Vec::new(),
            resolution: "720p".into(),
            aspect_ratio: "16:9".into(),
        };

        let op = provider.submit(&req).await.unwrap();
        match provider.poll(&op).await.unwrap() {
            PollOutcome::Done { result_ref } => {
                assert_eq!(result_ref.as_deref(), Some(MOCK_CLIP_REFERENCE));
            }
            PollOutcome::Pending => panic!("mock poll should complete immediately"),
        }
    }

    #[tokio::test]
    async fn test_mock_fetch_is_deterministic() {
        let provider = MockProvider::new("kie.ai", "sora-2", Duration::from_millis(1));
        let a = provider.fetch("ref").await.unwrap();
        let b = provider.fetch("ref").await.unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }
}
