//! Render orchestrator — the sequential control loop.
//!
//! One logical worker drives every scene in ascending order through
//! submit, poll, and fetch. Suspension points are the backoff cooldown,
//! the poll interval, and the inter-job delay; cancellation is checked
//! before each of them, never during a sleep.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use scenecast_core::{AvatarIdentity, Error, ReferenceImage, RenderSettings, RenderStatus, Result, ScenePrompt};
use scenecast_provider::{PollOutcome, ProviderError, RenderRequest, VideoProvider};

use crate::fallback::FallbackSubstituter;
use crate::pacing::{BackoffDecision, BackoffPolicy, RateGovernor};
use crate::registry::RenderRegistry;

/// Nominal per-clip duration recorded on completion.
const CLIP_NOMINAL_SECONDS: f64 = 6.0;

/// Timing knobs for a render run. The defaults match the provider's stated
/// quota window; tests shrink them to milliseconds.
#[derive(Debug, Clone)]
pub struct RenderTuning {
    /// Cooldown before resubmitting after a rate limit.
    pub rate_limit_cooldown: Duration,
    /// Total submission attempts per job before falling back.
    pub submit_attempts: u32,
    /// Interval between operation polls.
    pub poll_interval: Duration,
    /// Spacing after each successful job.
    pub inter_job_delay: Duration,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            rate_limit_cooldown: Duration::from_secs(60),
            submit_attempts: 3,
            poll_interval: Duration::from_secs(10),
            inter_job_delay: Duration::from_secs(30),
        }
    }
}

/// Inputs for one render run, produced by the upstream authoring steps.
#[derive(Debug, Clone)]
pub struct RenderInput {
    /// Locked identity; its absence fails the run before any job starts.
    pub identity: Option<AvatarIdentity>,
    /// Prompt payloads, joined to jobs by scene_id lookup.
    pub prompts: Vec<ScenePrompt>,
    /// Reference images forwarded with every submission.
    pub reference_images: Vec<ReferenceImage>,
    pub settings: RenderSettings,
}

/// How a run ended. Per-job errors never surface here; they live on the
/// job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every job was visited and is terminal.
    Finished,
    /// Cancellation was signaled; remaining jobs keep their status.
    Stopped,
    /// A batch-mode failure halted the remaining scenes.
    Aborted,
}

/// Terminal result of driving one scene.
enum SceneOutcome {
    Completed { result_ref: String },
    QuotaExhausted,
    Failed(String),
    Cancelled,
}

pub struct RenderOrchestrator {
    provider: Arc<dyn VideoProvider>,
    registry: Arc<RenderRegistry>,
    clips_dir: PathBuf,
    backoff: BackoffPolicy,
    governor: RateGovernor,
    fallback: FallbackSubstituter,
    poll_interval: Duration,
}

impl RenderOrchestrator {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        registry: Arc<RenderRegistry>,
        clips_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_tuning(provider, registry, clips_dir, RenderTuning::default())
    }

    pub fn with_tuning(
        provider: Arc<dyn VideoProvider>,
        registry: Arc<RenderRegistry>,
        clips_dir: impl Into<PathBuf>,
        tuning: RenderTuning,
    ) -> Self {
        Self {
            provider,
            registry,
            clips_dir: clips_dir.into(),
            backoff: BackoffPolicy {
                max_attempts: tuning.submit_attempts,
                cooldown: tuning.rate_limit_cooldown,
            },
            governor: RateGovernor {
                inter_job_delay: tuning.inter_job_delay,
            },
            fallback: FallbackSubstituter::default(),
            poll_interval: tuning.poll_interval,
        }
    }

    pub fn registry(&self) -> &Arc<RenderRegistry> {
        &self.registry
    }

    /// Drive all non-completed jobs to a terminal state, in ascending
    /// scene order. Re-invoking after a partial run resumes from the first
    /// non-completed job and never touches completed ones.
    pub async fn run(&self, input: &RenderInput, cancel: &CancellationToken) -> Result<RunOutcome> {
        if input.identity.is_none() {
            return Err(Error::Config("Avatar identity missing. Cannot render.".into()));
        }

        let descriptor = self.provider.descriptor();
        let scene_ids = self.registry.scene_ids();
        let total = scene_ids.len();
        info!(
            "Render run starting: {} scenes, provider={}, model={}",
            total, descriptor.provider, descriptor.model
        );

        for (idx, &scene_id) in scene_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Render cancelled before scene {}", scene_id);
                return Ok(RunOutcome::Stopped);
            }

            let Some(job) = self.registry.get(scene_id) else {
                continue;
            };
            if job.status == RenderStatus::Completed {
                continue;
            }

            self.registry.update(scene_id, |j| {
                j.status = RenderStatus::Rendering;
                j.diagnostic = None;
            });

            match self.render_scene(scene_id, input, cancel).await {
                SceneOutcome::Completed { result_ref } => {
                    self.registry.update(scene_id, |j| {
                        j.status = RenderStatus::Completed;
                        j.result_ref = Some(result_ref);
                        j.diagnostic = None;
                        j.duration_seconds = Some(CLIP_NOMINAL_SECONDS);
                        j.provider_used = Some(descriptor.provider.clone());
                        j.model_used = Some(descriptor.model.clone());
                    });
                    info!("Scene {} completed", scene_id);

                    if idx + 1 < total && !cancel.is_cancelled() {
                        self.governed_pause(scene_ids[idx + 1]).await;
                    }
                }
                SceneOutcome::QuotaExhausted => {
                    let clip = self.fallback.substitute();
                    self.registry.update(scene_id, |j| {
                        j.status = RenderStatus::Completed;
                        j.result_ref = Some(clip.result_ref);
                        j.diagnostic = Some(clip.diagnostic);
                        j.duration_seconds = Some(clip.duration_seconds);
                        j.provider_used = Some(descriptor.provider.clone());
                        j.model_used = Some(descriptor.model.clone());
                    });
                    warn!("Scene {} completed with placeholder after quota exhaustion", scene_id);
                }
                SceneOutcome::Failed(message) => {
                    self.registry.update(scene_id, |j| {
                        j.status = RenderStatus::Failed;
                        j.diagnostic = Some(message.clone());
                    });
                    warn!("Scene {} failed: {}", scene_id, message);

                    if input.settings.mode == scenecast_core::RenderMode::Batch {
                        info!("Batch mode: aborting remaining scenes");
                        return Ok(RunOutcome::Aborted);
                    }
                }
                SceneOutcome::Cancelled => {
                    // Status stays Rendering; a later run re-drives the job.
                    self.registry.update(scene_id, |j| {
                        j.diagnostic = Some("Render cancelled; job resumes on next run.".into());
                    });
                    info!("Render cancelled during scene {}", scene_id);
                    return Ok(RunOutcome::Stopped);
                }
            }
        }

        Ok(RunOutcome::Finished)
    }

    /// Inter-job delay after a success, surfaced as a diagnostic on the
    /// next job to be processed.
    async fn governed_pause(&self, next_scene_id: u32) {
        let pause = self.governor.pause();
        let already_completed = self
            .registry
            .get(next_scene_id)
            .map(|j| j.status == RenderStatus::Completed)
            .unwrap_or(true);
        if !already_completed {
            self.registry.update(next_scene_id, |j| {
                j.diagnostic = Some(format!(
                    "Waiting {}s to avoid rate limits...",
                    pause.as_secs()
                ));
            });
        }
        tokio::time::sleep(pause).await;
    }

    /// Drive one scene: submit with bounded rate-limit retry, poll to
    /// completion, fetch and persist the asset.
    async fn render_scene(
        &self,
        scene_id: u32,
        input: &RenderInput,
        cancel: &CancellationToken,
    ) -> SceneOutcome {
        // Prompts join by scene_id; a missing prompt fails closed.
        let Some(prompt) = input.prompts.iter().find(|p| p.scene_id == scene_id) else {
            return SceneOutcome::Failed(format!("No prompt available for scene {}", scene_id));
        };
        let request = RenderRequest::from_prompt(prompt, &input.reference_images);

        let mut attempt = 0u32;
        let handle = loop {
            attempt += 1;
            match self.provider.submit(&request).await {
                Ok(handle) => break handle,
                Err(ProviderError::RateLimited(message)) => {
                    match self.backoff.on_rate_limit(attempt) {
                        BackoffDecision::RetryAfter(cooldown) => {
                            warn!(
                                "Scene {} rate limited (attempt {}): {}",
                                scene_id, attempt, message
                            );
                            self.registry.update(scene_id, |j| {
                                j.diagnostic = Some(format!(
                                    "Rate limit hit. Retrying in {}s...",
                                    cooldown.as_secs()
                                ));
                            });
                            if cancel.is_cancelled() {
                                return SceneOutcome::Cancelled;
                            }
                            tokio::time::sleep(cooldown).await;
                        }
                        BackoffDecision::GiveUp => {
                            warn!(
                                "Scene {} still rate limited after {} attempts; degrading to placeholder",
                                scene_id, attempt
                            );
                            return SceneOutcome::QuotaExhausted;
                        }
                    }
                }
                Err(e) => return SceneOutcome::Failed(e.to_string()),
            }
        };

        // Clear any retry notice now that the operation is in flight.
        self.registry.update(scene_id, |j| j.diagnostic = None);

        let result_ref = loop {
            if cancel.is_cancelled() {
                return SceneOutcome::Cancelled;
            }
            tokio::time::sleep(self.poll_interval).await;

            match self.provider.poll(&handle).await {
                Ok(PollOutcome::Pending) => {}
                Ok(PollOutcome::Done { result_ref }) => match result_ref {
                    Some(r) => break r,
                    None => {
                        return SceneOutcome::Failed(
                            "No video URI returned from the provider.".into(),
                        )
                    }
                },
                // A transient polling hiccup must not fail an otherwise
                // successful render; try again next tick.
                Err(e) => warn!("Polling error for scene {} (will retry next tick): {}", scene_id, e),
            }
        };

        match self.provider.fetch(&result_ref).await {
            Ok(bytes) => {
                let path = self.clips_dir.join(format!("scene_{:03}.mp4", scene_id));
                match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => SceneOutcome::Completed {
                        result_ref: path.display().to_string(),
                    },
                    Err(e) => SceneOutcome::Failed(format!("Failed to store clip: {}", e)),
                }
            }
            Err(e) => SceneOutcome::Failed(e.to_string()),
        }
    }
}
