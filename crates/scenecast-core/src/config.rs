//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all Scenecast data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Fetched scene clips (`data/clips/`).
    pub clips: PathBuf,
    /// Merge staging area (`data/scratch/`).
    pub scratch: PathBuf,
    /// Merged output assets (`data/output/`).
    pub output: PathBuf,
    /// Provider credentials (`data/api-keys.json`).
    pub keys_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            clips: root.join("clips"),
            scratch: root.join("scratch"),
            output: root.join("output"),
            keys_file: root.join("api-keys.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    /// Create all required directories.
    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.clips)?;
        std::fs::create_dir_all(&self.scratch)?;
        std::fs::create_dir_all(&self.output)?;
        Ok(())
    }
}

/// Top-level Scenecast configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenecastConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl ScenecastConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self { port, data_paths })
    }
}
