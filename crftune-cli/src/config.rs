// crftune-cli/src/config.rs
//
// Default values of CLI flags and the mapping from parsed arguments to the
// core library's configuration.

use crftune_core::config::{
    CoreConfig, CoreConfigBuilder, DEFAULT_CRF_STEP, DEFAULT_MAX_CRF, DEFAULT_MIN_CRF,
    DEFAULT_SAMPLE_COUNT, DEFAULT_VMAF_THRESHOLD, RunMode, ToolPaths,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{SearchArgs, StudyArgs, ToolArgs, TuneArgs};

pub const DEFAULT_FFMPEG: &str = crftune_core::config::DEFAULT_FFMPEG;
pub const DEFAULT_FFPROBE: &str = crftune_core::config::DEFAULT_FFPROBE;
pub const DEFAULT_OUTPUT_DIR: &str = crftune_core::config::DEFAULT_OUTPUT_DIR;
pub const DEFAULT_SCENE_THRESHOLD: f64 = crftune_core::config::DEFAULT_SCENE_THRESHOLD;

impl From<&ToolArgs> for ToolPaths {
    fn from(args: &ToolArgs) -> Self {
        ToolPaths {
            ffmpeg: args.ffmpeg.clone(),
            ffprobe: args.ffprobe.clone(),
            vmaf_model: args.vmaf_model.clone(),
        }
    }
}

/// Builder pre-filled with the flags shared by `search` and `study`.
fn tune_builder(tools: &ToolArgs, args: &TuneArgs, run_mode: RunMode) -> CoreConfigBuilder {
    let mut builder = CoreConfigBuilder::new()
        .tools(ToolPaths::from(tools))
        .output_dir(args.output_dir.clone())
        .keep_artifacts(args.keep_artifacts)
        .sample_count(args.samples.unwrap_or(DEFAULT_SAMPLE_COUNT))
        .quality_bounds(
            args.min_crf.unwrap_or(DEFAULT_MIN_CRF),
            args.max_crf.unwrap_or(DEFAULT_MAX_CRF),
        )
        .quality_step(args.step.unwrap_or(DEFAULT_CRF_STEP))
        .vmaf_threshold(args.threshold.unwrap_or(DEFAULT_VMAF_THRESHOLD))
        .scene_threshold(args.scene_threshold)
        .run_mode(run_mode);

    if !args.durations.is_empty() {
        builder = builder.extract_durations(args.durations.clone());
    }
    if !args.modes.is_empty() {
        builder = builder.modes(args.modes.clone());
    }
    if let Some(dir) = &args.work_dir {
        builder = builder.work_dir(dir.clone());
    }
    if let Some(window) = args.sync_window {
        builder = builder.sync_window(window);
    }
    if let Some(secs) = args.timeout {
        builder = builder.tool_timeout(Duration::from_secs(secs));
    }
    builder
}

/// Core configuration for `search`.
pub fn search_config(tools: &ToolArgs, args: &SearchArgs) -> CoreConfig {
    let mut builder =
        tune_builder(tools, &args.tune, RunMode::Search).accept_best_effort(args.best_effort);
    if let Some(output) = &args.encode_output {
        builder = builder.final_output(output.clone());
    }
    builder.build()
}

/// Core configuration for `study`.
pub fn study_config(tools: &ToolArgs, args: &StudyArgs) -> CoreConfig {
    tune_builder(tools, &args.tune, RunMode::Study)
        .omit_options(args.omit_options.clone())
        .build()
}

/// Log directory: `--log-dir`, else `<output_dir>/logs`.
pub fn log_dir(explicit: Option<&Path>, output_dir: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.join("logs"))
}
