//! Scenecast Core — shared data model, errors, configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DataPaths, ScenecastConfig};
pub use error::{Error, Result};
pub use types::*;
