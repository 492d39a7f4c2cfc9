//! Shared types for the render pipeline.

use serde::{Deserialize, Serialize};

/// One timed segment of the source script, rendered into one clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: u32,
    pub scene_text: String,
}

/// Locked avatar descriptor consumed by every render job.
///
/// Produced upstream when the user locks the identity; the render pipeline
/// only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarIdentity {
    pub avatar_id: String,
    pub origin: String,
    pub face_shape: String,
    pub skin_tone: String,
    pub hair: String,
    pub gender_expression: String,
    pub age_range: String,
    pub facial_proportions: String,
    pub eye_shape: String,
    pub camera_framing: String,
    pub lighting_reference: String,
    pub identity_lock: bool,
}

/// Precomputed prompt payload for one scene. Joined to scenes by
/// `scene_id`, never by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenePrompt {
    pub scene_id: u32,
    pub prompt_content: serde_json::Value,
}

/// Reference image forwarded to the provider with every submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceImage {
    #[serde(rename = "dataBase64")]
    pub data_base64: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Failure propagation policy for a render run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// One fatal failure halts all not-yet-started scenes.
    Batch,
    /// A fatal failure does not block subsequent scenes.
    SceneByScene,
}

/// Render run settings selected upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    pub provider: String,
    #[serde(rename = "targetModel")]
    pub target_model: String,
    pub mode: RenderMode,
    #[serde(rename = "autoMerge")]
    pub auto_merge: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            provider: "official".into(),
            target_model: "veo-3.1".into(),
            mode: RenderMode::SceneByScene,
            auto_merge: false,
        }
    }
}

/// Lifecycle status of one scene's render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    Pending,
    Rendering,
    Completed,
    Failed,
}

/// One per scene; the registry's unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub scene_id: u32,
    pub status: RenderStatus,
    /// Opaque clip reference: a local file path for genuine renders, or the
    /// configured placeholder reference for fallback completions.
    #[serde(skip_serializing_if = "Option::is_none", rename = "resultRef")]
    pub result_ref: Option<String>,
    /// Last human-readable status or error line. Overwritten in place while
    /// rendering (retry notices, rate-governor waits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "durationSeconds")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "providerUsed")]
    pub provider_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "modelUsed")]
    pub model_used: Option<String>,
}

impl RenderJob {
    pub fn pending(scene_id: u32) -> Self {
        Self {
            scene_id,
            status: RenderStatus::Pending,
            result_ref: None,
            diagnostic: None,
            duration_seconds: None,
            provider_used: None,
            model_used: None,
        }
    }
}

/// Stored provider credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub key: String,
    pub provider: String,
    pub enabled: bool,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mode_serde() {
        let mode: RenderMode = serde_json::from_str("\"scene-by-scene\"").unwrap();
        assert_eq!(mode, RenderMode::SceneByScene);
        assert_eq!(serde_json::to_string(&RenderMode::Batch).unwrap(), "\"batch\"");
    }

    #[test]
    fn test_render_job_serialization_skips_empty() {
        let job = RenderJob::pending(1);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("resultRef").is_none());
        assert!(json.get("diagnostic").is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.provider, "official");
        assert_eq!(settings.mode, RenderMode::SceneByScene);
        assert!(!settings.auto_merge);
    }
}
