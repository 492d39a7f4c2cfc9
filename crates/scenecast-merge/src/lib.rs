//! Merge coordinator — ordered concatenation of completed clips.
//!
//! Stages every completed clip into a scratch directory in ascending scene
//! order, writes an ffmpeg concat manifest, and stream-copies the clips
//! into one output asset. Requires the full job set to be completed;
//! merging a partial set is rejected with no output produced. Stateless
//! across runs.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use scenecast_core::{Error, RenderJob, RenderStatus, Result};

const CONCAT_LIST_FILE: &str = "concat_list.txt";
const OUTPUT_FILE: &str = "merged_avatar_video.mp4";

/// Whether the system ffmpeg binary is available.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub struct MergeCoordinator {
    scratch_dir: PathBuf,
    output_dir: PathBuf,
    http: reqwest::Client,
}

impl MergeCoordinator {
    pub fn new(
        scratch_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            output_dir: output_dir.into(),
            http,
        }
    }

    /// Validate the merge precondition and return clip references in
    /// ascending scene order. Every job must be `Completed` with a result
    /// reference.
    pub fn ordered_refs(jobs: &[RenderJob]) -> Result<Vec<(u32, String)>> {
        if jobs.is_empty() {
            return Err(Error::Merge("No scenes to merge".into()));
        }

        let mut refs = Vec::with_capacity(jobs.len());
        for job in jobs {
            if job.status != RenderStatus::Completed {
                return Err(Error::Merge(format!(
                    "Scene {} is not completed; merging a partial set is not supported",
                    job.scene_id
                )));
            }
            let Some(result_ref) = &job.result_ref else {
                return Err(Error::Merge(format!(
                    "Scene {} has no clip reference",
                    job.scene_id
                )));
            };
            refs.push((job.scene_id, result_ref.clone()));
        }
        refs.sort_by_key(|(scene_id, _)| *scene_id);
        Ok(refs)
    }

    /// Concatenate all completed clips into one output asset and return
    /// its path.
    pub async fn merge(&self, jobs: &[RenderJob]) -> Result<PathBuf> {
        let refs = Self::ordered_refs(jobs)?;

        if !is_ffmpeg_on_path() {
            return Err(Error::Merge(
                "ffmpeg is required for merging, but was not found on PATH".into(),
            ));
        }

        let list_path = self.stage(&refs).await?;
        let out_path = self.output_dir.join(OUTPUT_FILE);

        info!("Merging {} clips into {}", refs.len(), out_path.display());

        let output = tokio::process::Command::new("ffmpeg")
            .current_dir(&self.scratch_dir)
            .args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy"])
            .arg(&out_path)
            .output()
            .await
            .map_err(|e| Error::Merge(format!("Failed to spawn ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Merge(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(out_path)
    }

    /// Copy or download each clip into the scratch area, in order, and
    /// write the concat manifest. Returns the manifest path.
    pub async fn stage(&self, refs: &[(u32, String)]) -> Result<PathBuf> {
        let mut concat_list = String::new();

        for (index, (scene_id, clip_ref)) in refs.iter().enumerate() {
            let file_name = format!("clip_{:03}.mp4", index);
            let dest = self.scratch_dir.join(&file_name);
            self.stage_clip(clip_ref, &dest).await?;
            debug!("Staged scene {} as {}", scene_id, file_name);
            concat_list.push_str(&format!("file '{}'\n", file_name));
        }

        let list_path = self.scratch_dir.join(CONCAT_LIST_FILE);
        std::fs::write(&list_path, concat_list)?;
        Ok(list_path)
    }

    async fn stage_clip(&self, clip_ref: &str, dest: &Path) -> Result<()> {
        if clip_ref.starts_with("http://") || clip_ref.starts_with("https://") {
            let response = self
                .http
                .get(clip_ref)
                .send()
                .await
                .map_err(|e| Error::Merge(format!("Failed to download clip '{}': {}", clip_ref, e)))?;
            if !response.status().is_success() {
                return Err(Error::Merge(format!(
                    "Failed to download clip '{}': status {}",
                    clip_ref,
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Merge(format!("Failed to download clip '{}': {}", clip_ref, e)))?;
            std::fs::write(dest, &bytes)?;
        } else {
            std::fs::copy(clip_ref, dest)
                .map_err(|e| Error::Merge(format!("Failed to stage clip '{}': {}", clip_ref, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_job(scene_id: u32, result_ref: &str) -> RenderJob {
        let mut job = RenderJob::pending(scene_id);
        job.status = RenderStatus::Completed;
        job.result_ref = Some(result_ref.to_string());
        job
    }

    #[test]
    fn test_ordered_refs_sorts_ascending() {
        let jobs = vec![
            completed_job(3, "c.mp4"),
            completed_job(1, "a.mp4"),
            completed_job(2, "b.mp4"),
        ];
        let refs = MergeCoordinator::ordered_refs(&jobs).unwrap();
        let ids: Vec<u32> = refs.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(refs[0].1, "a.mp4");
    }

    #[test]
    fn test_partial_set_is_rejected() {
        let mut jobs = vec![completed_job(1, "a.mp4"), completed_job(2, "b.mp4")];
        jobs.push(RenderJob::pending(3));

        let err = MergeCoordinator::ordered_refs(&jobs).unwrap_err();
        assert!(matches!(err, Error::Merge(_)));
        assert!(err.to_string().contains("Scene 3"));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let err = MergeCoordinator::ordered_refs(&[]).unwrap_err();
        assert!(matches!(err, Error::Merge(_)));
    }

    #[test]
    fn test_completed_without_ref_is_rejected() {
        let mut job = RenderJob::pending(1);
        job.status = RenderStatus::Completed;
        let err = MergeCoordinator::ordered_refs(&[job]).unwrap_err();
        assert!(err.to_string().contains("no clip reference"));
    }

    #[tokio::test]
    async fn test_stage_writes_manifest_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let output = dir.path().join("output");
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        let clip_a = dir.path().join("scene_a.mp4");
        let clip_b = dir.path().join("scene_b.mp4");
        std::fs::write(&clip_a, b"AAAA").unwrap();
        std::fs::write(&clip_b, b"BBBB").unwrap();

        let coordinator = MergeCoordinator::new(&scratch, &output, reqwest::Client::new());
        let refs = vec![
            (1, clip_a.display().to_string()),
            (2, clip_b.display().to_string()),
        ];

        let list_path = coordinator.stage(&refs).await.unwrap();
        let manifest = std::fs::read_to_string(&list_path).unwrap();
        assert_eq!(manifest, "file 'clip_000.mp4'\nfile 'clip_001.mp4'\n");

        assert_eq!(std::fs::read(scratch.join("clip_000.mp4")).unwrap(), b"AAAA");
        assert_eq!(std::fs::read(scratch.join("clip_001.mp4")).unwrap(), b"BBBB");
    }

    #[tokio::test]
    async fn test_stage_missing_local_clip_fails() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator =
            MergeCoordinator::new(dir.path(), dir.path(), reqwest::Client::new());

        let refs = vec![(1, dir.path().join("absent.mp4").display().to_string())];
        let err = coordinator.stage(&refs).await.unwrap_err();
        assert!(matches!(err, Error::Merge(_)));
    }
}
