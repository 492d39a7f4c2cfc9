//! Fallback substitution for permanently quota-exhausted jobs.
//!
//! A deterministic placeholder lets the pipeline reach a terminal,
//! mergeable state instead of hanging. Downstream consumers treat the
//! substituted clip exactly like a real one; only the diagnostic marks it
//! as degraded output.

/// Placeholder asset used when the provider's quota is exhausted.
pub const PLACEHOLDER_CLIP_REFERENCE: &str =
    "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4";

/// Nominal duration recorded for placeholder clips.
pub const PLACEHOLDER_DURATION_SECONDS: f64 = 6.0;

/// Diagnostic attached to fallback completions.
pub const DEGRADED_DIAGNOSTIC: &str = "Quota exceeded. Used placeholder video.";

/// Substituted clip handed back to the orchestrator.
#[derive(Debug, Clone)]
pub struct FallbackClip {
    pub result_ref: String,
    pub duration_seconds: f64,
    pub diagnostic: String,
}

pub struct FallbackSubstituter {
    clip_reference: String,
    duration_seconds: f64,
}

impl Default for FallbackSubstituter {
    fn default() -> Self {
        Self {
            clip_reference: PLACEHOLDER_CLIP_REFERENCE.to_string(),
            duration_seconds: PLACEHOLDER_DURATION_SECONDS,
        }
    }
}

impl FallbackSubstituter {
    pub fn new(clip_reference: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            clip_reference: clip_reference.into(),
            duration_seconds,
        }
    }

    pub fn substitute(&self) -> FallbackClip {
        FallbackClip {
            result_ref: self.clip_reference.clone(),
            duration_seconds: self.duration_seconds,
            diagnostic: DEGRADED_DIAGNOSTIC.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_is_deterministic() {
        let substituter = FallbackSubstituter::default();
        let a = substituter.substitute();
        let b = substituter.substitute();
        assert_eq!(a.result_ref, b.result_ref);
        assert_eq!(a.result_ref, PLACEHOLDER_CLIP_REFERENCE);
        assert_eq!(a.duration_seconds, PLACEHOLDER_DURATION_SECONDS);
        assert_eq!(a.diagnostic, DEGRADED_DIAGNOSTIC);
    }

    #[test]
    fn test_custom_placeholder() {
        let substituter = FallbackSubstituter::new("file:///placeholder.mp4", 4.0);
        let clip = substituter.substitute();
        assert_eq!(clip.result_ref, "file:///placeholder.mp4");
        assert_eq!(clip.duration_seconds, 4.0);
    }
}
