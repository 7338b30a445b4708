//! Implementation of the `scenes` subcommand.

use crate::cli::{ScenesArgs, ToolArgs};
use crate::error::CliResult;
use crate::output::{print_scenes, print_status};

use crftune_core::CoreError;
use crftune_core::external::{FfmpegSceneDetector, SidecarSpawner, check_dependency};
use crftune_core::processing::SceneScore;
use crftune_core::processing::scene_cache::{SceneSource, load_or_detect, scene_cache_path};

use log::info;

/// Executes `crftune scenes`: reads the score file when it exists, otherwise
/// runs scene detection and writes it.
pub fn run_scenes(tools: &ToolArgs, args: ScenesArgs) -> CliResult<Vec<SceneScore>> {
    if !(0.0..=1.0).contains(&args.threshold) {
        return Err(CoreError::Config(format!(
            "Scene threshold must be between 0 and 1, got {}",
            args.threshold
        )));
    }
    if !args.input.is_file() {
        return Err(CoreError::PathError(format!(
            "Input video {} does not exist or is not a file",
            args.input.display()
        )));
    }
    let cache_path = match &args.output {
        Some(path) => path.clone(),
        None => scene_cache_path(&args.output_dir, &args.input)?,
    };

    if !cache_path.exists() {
        check_dependency(&tools.ffmpeg)?;
    }
    let detector = FfmpegSceneDetector::new(&tools.ffmpeg, SidecarSpawner::default());
    let (scores, source) = load_or_detect(&detector, &args.input, args.threshold, &cache_path)?;

    match source {
        SceneSource::Cache => info!("Read {} scene scores", scores.len()),
        SceneSource::Detected => info!("Detected {} scene scores", scores.len()),
    }
    print_status("Score file", &cache_path.display().to_string(), false);
    print_scenes(&scores, args.limit);
    Ok(scores)
}
