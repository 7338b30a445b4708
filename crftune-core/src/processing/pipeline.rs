// ============================================================================
// crftune-core/src/processing/pipeline.rs
// ============================================================================
//
// PIPELINE: CRF selection for one source video
//
// This module drives a whole run: it probes the source, loads or detects
// scene scores, cuts clips around representative scene changes, searches
// each clip for the coarsest CRF meeting the VMAF threshold and folds the
// per-clip results into a recommendation.
//
// KEY COMPONENTS:
// - process_video: entry point used by the CLI
// - RunSummary / SampleOutcome: serializable results of a run
//
// WORKFLOW:
// 1. Validate config and input, probe the source
// 2. Load the scene cache or run scene detection
// 3. Select samples and compute every extract window
// 4. Extract each clip into the work directory
// 5. Search (or sweep) each clip in each mode, streaming rows to the CSV log
// 6. Recommend a CRF and optionally encode the whole source with it
//
// AI-ASSISTANT-INFO: Main CRF selection orchestration

// ---- Internal crate imports ----
use crate::config::{CoreConfig, EncodeMode, RunMode};
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher};
use crate::external::{ComplexParams, SyncSearch, Toolset};
use crate::processing::samples::{ExtractWindow, SceneScore, compute_window, select_samples};
use crate::processing::scene_cache::{SceneSource, load_or_detect, scene_cache_path};
use crate::processing::search::{
    EncodeTrial, EncodedArtifact, SearchParams, SearchResult, search_with_observer, sweep,
};
use crate::processing::trial_log::{ClipContext, TrialLog, trial_log_path};
use crate::processing::video_properties::VideoProperties;
use crate::temp_files::create_temp_dir;
use crate::utils::{file_stem, format_bytes, get_filename_safe};

// ---- External crate imports ----
use log::{error, info, warn};
use serde::Serialize;
use tempfile::TempDir;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Results of every mode searched on one clip.
#[derive(Debug, Clone, Serialize)]
pub struct SampleOutcome {
    pub clip: String,
    pub scene: SceneScore,
    pub window: ExtractWindow,
    pub extract_path: PathBuf,
    pub extract_size: u64,
    pub results: Vec<SearchResult>,
}

impl SampleOutcome {
    /// The search run with `mode`, if that mode was configured.
    pub fn result_for(&self, mode: EncodeMode) -> Option<&SearchResult> {
        self.results.iter().find(|r| r.mode == mode)
    }
}

/// A sample dropped before any tool ran on it.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSample {
    pub scene: SceneScore,
    pub duration: f64,
    pub reason: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub run_mode: RunMode,
    pub video: VideoProperties,
    pub scene_source: SceneSource,
    pub scene_cache_path: PathBuf,
    pub samples: Vec<SampleOutcome>,
    pub skipped: Vec<SkippedSample>,
    /// Coarsest CRF meeting the threshold on every clip in the primary mode
    pub recommended_crf: Option<u8>,
    /// True when the recommendation includes a best-seen trial below the threshold
    pub best_effort: bool,
    pub trial_count: usize,
    pub log_path: PathBuf,
    /// Work directory left on disk, if any
    pub work_dir: Option<PathBuf>,
    pub final_encode: Option<EncodedArtifact>,
    pub elapsed: Duration,
}

// ============================================================================
// WORK DIRECTORY
// ============================================================================

/// Directory for extracts, encodes and VMAF logs.
enum WorkDir {
    Fixed(PathBuf),
    Temporary(TempDir),
}

impl WorkDir {
    fn prepare(config: &CoreConfig) -> CoreResult<Self> {
        match &config.work_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(WorkDir::Fixed(dir.clone()))
            }
            None => Ok(WorkDir::Temporary(create_temp_dir(
                &config.output_dir,
                "crftune_work",
            )?)),
        }
    }

    fn path(&self) -> &Path {
        match self {
            WorkDir::Fixed(dir) => dir,
            WorkDir::Temporary(dir) => dir.path(),
        }
    }

    /// Path left on disk after the run; a temporary directory is removed
    /// unless `keep` is set.
    fn finish(self, keep: bool) -> Option<PathBuf> {
        match self {
            WorkDir::Fixed(dir) => Some(dir),
            WorkDir::Temporary(dir) if keep => Some(dir.keep()),
            WorkDir::Temporary(_) => None,
        }
    }
}

/// A clip ready to be searched.
struct PlannedClip {
    name: String,
    scene: SceneScore,
    window: ExtractWindow,
}

// ============================================================================
// MAIN PROCESSING FUNCTION
// ============================================================================

/// Runs CRF selection on `input` with the collaborators in `tools`.
///
/// Every trial is appended to `<output_dir>/<stem>_vmaf-scores.csv` as soon
/// as it is scored. A failing tool aborts the run; rows written before the
/// failure stay in the log.
pub fn process_video(
    config: &CoreConfig,
    input: &Path,
    tools: &dyn Toolset,
    events: &EventDispatcher,
) -> CoreResult<RunSummary> {
    let run_start = Instant::now();
    config.validate()?;
    if !input.is_file() {
        return Err(CoreError::PathError(format!(
            "Input video {} does not exist or is not a file",
            input.display()
        )));
    }
    let stem = file_stem(input)?;
    fs::create_dir_all(&config.output_dir)?;
    info!(
        "Tuning {} into {}",
        get_filename_safe(input)?,
        config.output_dir.display()
    );

    let video = tools.prober().probe(input)?;
    events.emit(Event::RunStarted {
        input: input.to_path_buf(),
        output_dir: config.output_dir.clone(),
        run_mode: config.run_mode,
        video_duration: video.duration_secs,
        modes: config.modes.clone(),
        threshold: config.vmaf_threshold,
    });

    // ---- Scene scores ----
    let cache_path = scene_cache_path(&config.output_dir, input)?;
    let (scores, scene_source) =
        load_or_detect(tools.detector(), input, config.scene_threshold, &cache_path)?;
    events.emit(Event::ScenesLoaded {
        count: scores.len(),
        source: scene_source,
        cache_path: cache_path.clone(),
    });

    let selection = select_samples(&scores, config.sample_count);
    events.emit(Event::SamplesSelected {
        samples: selection.samples.clone(),
        duplicates: selection.duplicates,
    });
    if selection.duplicates {
        events.emit(Event::Warning {
            message: format!(
                "{} scene-change candidate(s) for {} requested sample(s)",
                scores.len(),
                config.sample_count
            ),
        });
    }

    // ---- Extract windows, all computed before any clip is cut ----
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    let mut planned = Vec::new();
    let mut skipped = Vec::new();
    for (index, scene) in selection.unique().into_iter().enumerate() {
        for &duration in &config.extract_durations {
            match compute_window(scene.timestamp, duration, video.duration_secs) {
                Ok(window) => planned.push(PlannedClip {
                    // index keeps scenes that round to the same timestamp apart
                    name: format!("{stem}.extract.s{index}.t{:.2}-{duration}s", scene.timestamp),
                    scene,
                    window,
                }),
                Err(e @ CoreError::InvalidDuration { .. }) => {
                    warn!("Skipping sample at {:.3}s: {e}", scene.timestamp);
                    events.emit(Event::SampleSkipped {
                        timestamp: scene.timestamp,
                        duration,
                        reason: e.to_string(),
                    });
                    skipped.push(SkippedSample {
                        scene,
                        duration,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ---- Shared encode settings ----
    let complex = config
        .modes
        .contains(&EncodeMode::Complex)
        .then(|| ComplexParams::from_properties(&video, &config.omit_options));
    let sync = match (config.sync_window, video.frame_rate) {
        (Some(window), Some(fps)) if fps > 0.0 => Some(SyncSearch::new(window, fps)),
        (Some(_), _) => {
            let message = "Frame rate unknown; VMAF sync offset search disabled".to_string();
            warn!("{message}");
            events.emit(Event::Warning { message });
            None
        }
        (None, _) => None,
    };

    let log_path = trial_log_path(&config.output_dir, input)?;
    let mut trial_log = TrialLog::create(&log_path, &config.omit_options)?;
    let work_dir = WorkDir::prepare(config)?;
    let params = SearchParams::new(config.quality_bounds, config.quality_step, config.vmaf_threshold);

    // ---- Extraction ----
    let mut clips = Vec::with_capacity(planned.len());
    for clip in planned {
        let extract_path = work_dir.path().join(format!("{}.{extension}", clip.name));
        let artifact = tools
            .transcoder()
            .extract(input, &clip.window, &extract_path)
            .inspect_err(|e| error!("Extraction of {} failed: {e}", clip.name))?;
        info!(
            "Extracted {} ({})",
            extract_path.display(),
            format_bytes(artifact.size_bytes)
        );
        events.emit(Event::ExtractCreated {
            path: extract_path.clone(),
            window: clip.window,
            size_bytes: artifact.size_bytes,
        });
        clips.push((clip, extract_path, artifact.size_bytes));
    }

    // ---- Trials ----
    let mut samples = Vec::with_capacity(clips.len());
    for (clip, extract_path, extract_size) in clips {
        let context = ClipContext {
            scene: clip.scene,
            window: clip.window,
            extract_size,
        };
        let mut results = Vec::with_capacity(config.modes.len());
        for &mode in &config.modes {
            let result = run_clip_search(
                tools,
                events,
                config.run_mode,
                &params,
                mode,
                &clip.name,
                &extract_path,
                work_dir.path(),
                complex.as_ref(),
                sync.as_ref(),
                &context,
                &mut trial_log,
            )
            .inspect_err(|e| error!("Search on {} ({mode}) failed: {e}", clip.name))?;

            events.emit(Event::SearchFinished {
                clip: clip.name.clone(),
                mode,
                found_crf: result.found_quality(),
                best_vmaf: result.best_effort().map(|t| t.measured_quality),
                trials: result.trials.len(),
            });
            results.push(result);
        }
        samples.push(SampleOutcome {
            clip: clip.name,
            scene: clip.scene,
            window: clip.window,
            extract_path,
            extract_size,
            results,
        });
    }

    // ---- Recommendation ----
    let (recommended_crf, best_effort) =
        recommend_crf(&samples, config.primary_mode(), config.accept_best_effort);
    if samples.is_empty() {
        let message = "No clip could be extracted; no CRF recommended".to_string();
        warn!("{message}");
        events.emit(Event::Warning { message });
    }

    // ---- Optional final encode ----
    let final_encode = match (&config.final_output, recommended_crf) {
        (Some(output), Some(crf)) => {
            let mode = config.primary_mode();
            let complex = match mode {
                EncodeMode::Complex => complex.clone(),
                EncodeMode::Simple => None,
            };
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }
            info!("Encoding {} at CRF {crf} ({mode})", input.display());
            let artifact = tools
                .transcoder()
                .encode(input, output, crf, mode, complex.as_ref())
                .inspect_err(|e| error!("Final encode failed: {e}"))?;
            events.emit(Event::FinalEncodeComplete {
                output: artifact.path.clone(),
                crf,
                mode,
                size_bytes: artifact.size_bytes,
                elapsed: artifact.elapsed,
            });
            Some(artifact)
        }
        (Some(output), None) => {
            let message = format!(
                "No CRF recommended; {} was not encoded",
                output.display()
            );
            warn!("{message}");
            events.emit(Event::Warning { message });
            None
        }
        (None, _) => None,
    };

    let trial_count = trial_log.rows();
    let work_dir = work_dir.finish(config.keep_artifacts);
    let elapsed = run_start.elapsed();
    events.emit(Event::RunComplete {
        recommended_crf,
        trials: trial_count,
        log_path: log_path.clone(),
        elapsed,
    });

    Ok(RunSummary {
        input: input.to_path_buf(),
        run_mode: config.run_mode,
        video,
        scene_source,
        scene_cache_path: cache_path,
        samples,
        skipped,
        recommended_crf,
        best_effort,
        trial_count,
        log_path,
        work_dir,
        final_encode,
        elapsed,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_clip_search(
    tools: &dyn Toolset,
    events: &EventDispatcher,
    run_mode: RunMode,
    params: &SearchParams,
    mode: EncodeMode,
    clip: &str,
    extract_path: &Path,
    work_dir: &Path,
    complex: Option<&ComplexParams>,
    sync: Option<&SyncSearch>,
    context: &ClipContext,
    trial_log: &mut TrialLog,
) -> CoreResult<SearchResult> {
    let transcoder = tools.transcoder();
    let scorer = tools.scorer();

    let encode_fn = |extract: &Path, crf: u8| {
        events.emit(Event::TrialStarted {
            clip: clip.to_string(),
            crf,
            mode,
        });
        let output = work_dir.join(format!("{clip}.crf{crf}.{mode}.mp4"));
        transcoder.encode(extract, &output, crf, mode, complex)
    };
    let score_fn = |extract: &Path, artifact: &EncodedArtifact| {
        let log_path = artifact.path.with_extension("json");
        scorer.score(extract, &artifact.path, &log_path, sync)
    };
    let observer = |trial: &EncodeTrial| -> CoreResult<()> {
        trial_log.record(context, trial)?;
        events.emit(Event::TrialCompleted {
            clip: clip.to_string(),
            crf: trial.quality_param,
            mode,
            vmaf: trial.measured_quality,
            passed: trial.measured_quality >= params.threshold,
            size_bytes: trial.output_size_bytes,
            encode_time: trial.elapsed_time,
            score_time: trial.score_time,
        });
        Ok(())
    };

    match run_mode {
        RunMode::Search => {
            search_with_observer(extract_path, params, mode, encode_fn, score_fn, observer)
        }
        RunMode::Study => sweep(extract_path, params, mode, encode_fn, score_fn, observer),
    }
}

/// Folds per-clip results of `mode` into one CRF.
///
/// Every clip must meet the threshold, so the finest (lowest) found CRF
/// wins. An exhausted clip yields `None` unless `accept_best_effort` is set,
/// in which case its best-seen trial stands in. The flag returned is true
/// when such a stand-in was used.
pub fn recommend_crf(
    samples: &[SampleOutcome],
    mode: EncodeMode,
    accept_best_effort: bool,
) -> (Option<u8>, bool) {
    let mut recommended: Option<u8> = None;
    let mut used_best_effort = false;

    for result in samples.iter().filter_map(|s| s.result_for(mode)) {
        let crf = match result.found_quality() {
            Some(crf) => crf,
            None if accept_best_effort => match result.best_effort() {
                Some(trial) => {
                    used_best_effort = true;
                    trial.quality_param
                }
                None => return (None, false),
            },
            None => return (None, false),
        };
        recommended = Some(recommended.map_or(crf, |current| current.min(crf)));
    }

    (recommended, used_best_effort)
}
