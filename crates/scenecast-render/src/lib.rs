//! Scene render orchestration.
//!
//! Drives N independent long-running provider renders to completion,
//! strictly in scene order, under rate limits, with bounded retry,
//! quota fallback, cooperative cancellation, and resume.

pub mod fallback;
pub mod orchestrator;
pub mod pacing;
pub mod registry;

pub use fallback::FallbackSubstituter;
pub use orchestrator::{RenderInput, RenderOrchestrator, RenderTuning, RunOutcome};
pub use pacing::{BackoffDecision, BackoffPolicy, RateGovernor};
pub use registry::RenderRegistry;
