// ============================================================================
// crftune-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg, ffprobe and the file system
//
// This module defines the four collaborators the pipeline depends on (scene
// detection, transcoding, quality scoring, probing) as traits, together with
// their ffmpeg/ffprobe-backed implementations. All parsing of tool output is
// kept inside the adapter that runs the tool.
//
// KEY COMPONENTS:
// - SceneDetector / Transcoder / QualityScorer / Prober traits
// - Toolset: bundle of the four collaborators handed to the pipeline
// - FfmpegToolset: production implementation configured from ToolPaths
// - Dependency checking and file metadata access
//
// DESIGN PHILOSOPHY:
// Dependency injection throughout: tests provide their own implementations
// of the traits, the CLI provides FfmpegToolset.
//
// AI-ASSISTANT-INFO: External tool abstractions and adapters for ffmpeg/ffprobe

// ---- Internal crate imports ----
use crate::config::{EncodeMode, ToolPaths};
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::processing::samples::{ExtractWindow, SceneScore};
use crate::processing::search::{EncodedArtifact, QualityReport};
use crate::processing::video_properties::VideoProperties;

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Command-line construction for every ffmpeg step
pub mod ffmpeg;

/// Shared ffmpeg command setup and filter chains
pub mod ffmpeg_builder;

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// ffprobe-backed prober
pub mod ffprobe_executor;

/// Process execution with timeouts
pub mod process;

/// Scene-change detection adapter
pub mod scene_detection;

/// Extraction and encoding adapter
pub mod transcoder;

/// libvmaf adapter
pub mod vmaf;

#[cfg(test)]
pub(crate) mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::ComplexParams;
pub use ffmpeg_builder::{FfmpegCommandBuilder, VideoFilterChain};
pub use ffmpeg_executor::{FfmpegSpawner, SidecarSpawner};
pub use ffprobe_executor::FfprobeProber;
pub use process::ToolOutput;
pub use scene_detection::FfmpegSceneDetector;
pub use transcoder::FfmpegTranscoder;
pub use vmaf::VmafScorer;

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Produces per-frame scene-change scores for a video.
pub trait SceneDetector {
    /// Scores of every frame whose score is at least `threshold`.
    fn detect(&self, video: &Path, threshold: f64) -> CoreResult<Vec<SceneScore>>;
}

/// Cuts clips and encodes them.
pub trait Transcoder {
    /// Copies `window` of `input` into `output` without re-encoding.
    fn extract(&self, input: &Path, window: &ExtractWindow, output: &Path)
    -> CoreResult<EncodedArtifact>;

    /// Encodes `input` into `output` at `crf`.
    ///
    /// `complex` carries the source-derived settings used by
    /// [`EncodeMode::Complex`].
    fn encode(
        &self,
        input: &Path,
        output: &Path,
        crf: u8,
        mode: EncodeMode,
        complex: Option<&ComplexParams>,
    ) -> CoreResult<EncodedArtifact>;
}

/// Offsets scanned when aligning a candidate with its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSearch {
    /// Offsets below this many seconds are tried
    pub window_secs: f64,
    /// Frame rate of the reference; offsets advance one frame at a time
    pub frame_rate: f64,
}

impl SyncSearch {
    pub fn new(window_secs: f64, frame_rate: f64) -> Self {
        Self {
            window_secs,
            frame_rate,
        }
    }

    /// Number of candidate offsets, at least one.
    pub fn steps(&self) -> usize {
        if !(self.window_secs.is_finite() && self.frame_rate.is_finite()) || self.frame_rate <= 0.0 {
            return 1;
        }
        ((self.window_secs * self.frame_rate).ceil() as usize).max(1)
    }
}

/// Measures perceptual quality of a candidate against its reference.
pub trait QualityScorer {
    /// Scores `candidate` against `reference`, keeping the raw log at `log_path`.
    fn score(
        &self,
        reference: &Path,
        candidate: &Path,
        log_path: &Path,
        sync: Option<&SyncSearch>,
    ) -> CoreResult<QualityReport>;
}

/// Reads media properties.
pub trait Prober {
    fn probe(&self, video: &Path) -> CoreResult<VideoProperties>;
}

/// The four collaborators used by one pipeline run.
pub trait Toolset {
    fn detector(&self) -> &dyn SceneDetector;
    fn transcoder(&self) -> &dyn Transcoder;
    fn scorer(&self) -> &dyn QualityScorer;
    fn prober(&self) -> &dyn Prober;
}

/// Production toolset running the configured ffmpeg and ffprobe binaries.
pub struct FfmpegToolset {
    detector: FfmpegSceneDetector<SidecarSpawner>,
    transcoder: FfmpegTranscoder<SidecarSpawner>,
    scorer: VmafScorer<SidecarSpawner>,
    prober: FfprobeProber,
}

impl FfmpegToolset {
    /// Builds every adapter from `tools`, each invocation bounded by `timeout`.
    pub fn new(tools: &ToolPaths, timeout: Option<Duration>) -> Self {
        let spawner = SidecarSpawner::new(timeout);
        Self {
            detector: FfmpegSceneDetector::new(&tools.ffmpeg, spawner.clone()),
            transcoder: FfmpegTranscoder::new(&tools.ffmpeg, spawner.clone()),
            scorer: VmafScorer::new(&tools.ffmpeg, tools.vmaf_model.clone(), spawner),
            prober: FfprobeProber::new(&tools.ffprobe, timeout),
        }
    }

    /// Checks that both binaries start and that the VMAF model exists.
    pub fn verify(tools: &ToolPaths) -> CoreResult<()> {
        check_dependency(&tools.ffmpeg)?;
        check_dependency(&tools.ffprobe)?;
        if let Some(model) = &tools.vmaf_model {
            if !model.is_file() {
                return Err(CoreError::DependencyNotFound(format!(
                    "VMAF model {}",
                    model.display()
                )));
            }
        }
        Ok(())
    }
}

impl Toolset for FfmpegToolset {
    fn detector(&self) -> &dyn SceneDetector {
        &self.detector
    }

    fn transcoder(&self) -> &dyn Transcoder {
        &self.transcoder
    }

    fn scorer(&self) -> &dyn QualityScorer {
        &self.scorer
    }

    fn prober(&self) -> &dyn Prober {
        &self.prober
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that an external command can be started with `-version`.
///
/// A binary that cannot be found gives [`CoreError::DependencyNotFound`];
/// one that exists but fails to start gives [`CoreError::CommandStart`].
pub fn check_dependency(cmd: &Path) -> CoreResult<()> {
    let result = Command::new(cmd)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd.display());
            Err(CoreError::DependencyNotFound(cmd.display().to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check '{}': {}", cmd.display(), e);
            Err(command_start_error(cmd.display().to_string(), e))
        }
    }
}

// ============================================================================
// FILE METADATA ACCESS
// ============================================================================

/// Trait for abstracting file metadata access operations.
pub trait FileMetadataProvider {
    /// Gets the size of the file at the given path in bytes.
    fn get_size(&self, path: &Path) -> CoreResult<u64>;
}

/// Standard implementation of FileMetadataProvider using the standard library.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFsMetadataProvider;

impl FileMetadataProvider for StdFsMetadataProvider {
    fn get_size(&self, path: &Path) -> CoreResult<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}
