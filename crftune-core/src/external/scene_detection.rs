//! Scene-change detection through ffmpeg's `select` and `metadata` filters.
//!
//! ffmpeg computes a scene score for every frame; frames at or above the
//! threshold are passed to `metadata=print`, which writes blocks like
//!
//! ```text
//! frame:12   pts:6144    pts_time:0.48
//! lavfi.scene_score=0.310000
//! ```
//!
//! to a side file that is parsed here.

use crate::error::{CoreResult, malformed_output_error};
use crate::external::ffmpeg::build_scene_command;
use crate::external::{FfmpegSpawner, SceneDetector};
use crate::processing::samples::{SceneScore, sort_by_score};
use crate::temp_files;

use std::fs;
use std::path::{Path, PathBuf};

const SCENE_COMMAND: &str = "ffmpeg (scene detection)";

/// Parses the output of `metadata=print`.
///
/// Score lines without a preceding frame header are rejected, as are
/// unparseable numbers.
pub fn parse_scene_metadata(text: &str) -> CoreResult<Vec<SceneScore>> {
    let mut scores = Vec::new();
    let mut current: Option<(Option<u64>, f64)> = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.starts_with("frame:") {
            let mut frame = None;
            let mut pts_time = None;
            for field in line.split_whitespace() {
                if let Some(value) = field.strip_prefix("frame:") {
                    frame = value.parse::<u64>().ok();
                } else if let Some(value) = field.strip_prefix("pts_time:") {
                    pts_time = value.parse::<f64>().ok();
                }
            }
            let pts_time = pts_time.ok_or_else(|| {
                malformed_output_error(SCENE_COMMAND, format!(
                    "scene metadata line {} has no pts_time: {line}",
                    line_no + 1
                ))
            })?;
            current = Some((frame, pts_time));
        } else if let Some(value) = line.strip_prefix("lavfi.scene_score=") {
            let (frame, timestamp) = current.take().ok_or_else(|| {
                malformed_output_error(SCENE_COMMAND, format!(
                    "scene score without frame header at line {}",
                    line_no + 1
                ))
            })?;
            let score = value.parse::<f64>().map_err(|e| {
                malformed_output_error(SCENE_COMMAND, format!(
                    "invalid scene score '{value}' at line {}: {e}",
                    line_no + 1
                ))
            })?;
            scores.push(SceneScore {
                timestamp,
                score,
                frame,
            });
        }
    }
    Ok(scores)
}

/// Scene detector running ffmpeg over the whole input.
pub struct FfmpegSceneDetector<S: FfmpegSpawner> {
    ffmpeg: PathBuf,
    spawner: S,
}

impl<S: FfmpegSpawner> FfmpegSceneDetector<S> {
    pub fn new(ffmpeg: impl Into<PathBuf>, spawner: S) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            spawner,
        }
    }
}

impl<S: FfmpegSpawner> SceneDetector for FfmpegSceneDetector<S> {
    fn detect(&self, video: &Path, threshold: f64) -> CoreResult<Vec<SceneScore>> {
        log::info!("Computing scene scores for {}", video.display());
        let metadata_file = temp_files::create_temp_file(&std::env::temp_dir(), "crftune_scenes", "txt")?;

        let cmd = build_scene_command(&self.ffmpeg, video, threshold, metadata_file.path());
        self.spawner.run(cmd, "scene detection")?;

        let text = fs::read_to_string(metadata_file.path())?;
        let mut scores = parse_scene_metadata(&text)?;
        sort_by_score(&mut scores);
        log::info!("Found {} scene-change candidates", scores.len());
        Ok(scores)
    }
}
