//! CRF search driven by a VMAF threshold.
//!
//! A search walks the CRF ladder from the coarsest value (`bounds.max`)
//! towards the finest (`bounds.min`). Each rung encodes the extract, scores
//! the encode against the extract and records an [`EncodeTrial`]. The first
//! trial whose harmonic-mean VMAF is at least the threshold ends the search.
//! Running out of rungs is a reportable outcome, not an error.
//!
//! Encoding and scoring are injected as closures so the state machine can be
//! exercised without any external tool. Failures of either closure stop the
//! search immediately; encodes are deterministic, so nothing is retried.

use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::{EncodeMode, QualityBounds};
use crate::error::{CoreError, CoreResult};

/// File produced by one trial encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Wall time of the encode as measured by the transcoder
    pub elapsed: Duration,
    /// Command line that produced the file
    pub command: String,
}

/// Quality measured for one encode against its reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QualityReport {
    /// Harmonic mean of the per-frame VMAF scores. Drives the threshold.
    pub harmonic_mean: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(skip)]
    pub frame_scores: Vec<f64>,
    /// Seconds the candidate was shifted to line up with the reference
    pub offset: Option<f64>,
    /// Average PSNR at the chosen offset
    pub psnr: Option<f64>,
}

impl QualityReport {
    /// A report carrying only the harmonic mean.
    pub fn from_harmonic_mean(harmonic_mean: f64) -> Self {
        Self {
            harmonic_mean,
            ..Self::default()
        }
    }
}

/// One (extract, CRF, mode) encode-and-score run. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeTrial {
    pub quality_param: u8,
    pub mode: EncodeMode,
    pub measured_quality: f64,
    pub report: QualityReport,
    /// Wall time of the encode
    pub elapsed_time: Duration,
    /// Wall time of the quality measurement
    pub score_time: Duration,
    pub output_size_bytes: u64,
    pub output_path: PathBuf,
    pub command: String,
}

/// Parameters of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchParams {
    pub bounds: QualityBounds,
    pub step: u8,
    /// Inclusive VMAF target
    pub threshold: f64,
}

impl SearchParams {
    pub fn new(bounds: QualityBounds, step: u8, threshold: f64) -> Self {
        Self {
            bounds,
            step,
            threshold,
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.bounds.min > self.bounds.max {
            return Err(CoreError::Config(format!(
                "Quality bounds are inverted: min {} > max {}",
                self.bounds.min, self.bounds.max
            )));
        }
        if self.step == 0 {
            return Err(CoreError::Config("Quality step must be at least 1".to_string()));
        }
        if !self.threshold.is_finite() {
            return Err(CoreError::Config(format!(
                "Quality threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// CRF values in trial order, coarsest first.
    pub fn ladder(&self) -> Vec<u8> {
        let min = i32::from(self.bounds.min);
        let step = i32::from(self.step.max(1));
        let mut values = Vec::new();
        let mut quality = i32::from(self.bounds.max);
        while quality >= min {
            values.push(quality as u8);
            quality -= step;
        }
        values
    }

    /// Number of trials an exhausted search runs: `(max - min) / step + 1`,
    /// or 0 for inverted bounds.
    pub fn max_trials(&self) -> usize {
        self.bounds
            .max
            .checked_sub(self.bounds.min)
            .map_or(0, |span| usize::from(span / self.step.max(1)) + 1)
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SearchOutcome {
    /// The threshold was met by this trial.
    Found(EncodeTrial),
    /// No CRF in bounds met the threshold. `best` is the highest-scoring trial.
    Exhausted { best: Option<EncodeTrial> },
}

/// Outcome plus every trial run, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub mode: EncodeMode,
    pub outcome: SearchOutcome,
    pub trials: Vec<EncodeTrial>,
}

impl SearchResult {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, SearchOutcome::Found(_))
    }

    /// CRF of the passing trial, if any.
    pub fn found_quality(&self) -> Option<u8> {
        match &self.outcome {
            SearchOutcome::Found(trial) => Some(trial.quality_param),
            SearchOutcome::Exhausted { .. } => None,
        }
    }

    /// The passing trial, or the best-seen one when exhausted.
    pub fn best_effort(&self) -> Option<&EncodeTrial> {
        match &self.outcome {
            SearchOutcome::Found(trial) => Some(trial),
            SearchOutcome::Exhausted { best } => best.as_ref(),
        }
    }
}

/// Searches for the coarsest CRF whose encode meets `params.threshold`.
///
/// `encode_fn(extract, crf)` must produce the encoded artifact and
/// `score_fn(extract, artifact)` must measure it against the extract.
pub fn search<E, S>(
    extract_path: &Path,
    params: &SearchParams,
    mode: EncodeMode,
    encode_fn: E,
    score_fn: S,
) -> CoreResult<SearchResult>
where
    E: FnMut(&Path, u8) -> CoreResult<EncodedArtifact>,
    S: FnMut(&Path, &EncodedArtifact) -> CoreResult<QualityReport>,
{
    search_with_observer(extract_path, params, mode, encode_fn, score_fn, |_| Ok(()))
}

/// Same as [`search`], handing every trial to `observer` as soon as it exists.
pub fn search_with_observer<E, S, O>(
    extract_path: &Path,
    params: &SearchParams,
    mode: EncodeMode,
    encode_fn: E,
    score_fn: S,
    observer: O,
) -> CoreResult<SearchResult>
where
    E: FnMut(&Path, u8) -> CoreResult<EncodedArtifact>,
    S: FnMut(&Path, &EncodedArtifact) -> CoreResult<QualityReport>,
    O: FnMut(&EncodeTrial) -> CoreResult<()>,
{
    run_ladder(extract_path, params, mode, true, encode_fn, score_fn, observer)
}

/// Encodes and scores every CRF in bounds without stopping at the threshold.
///
/// The outcome is the first passing trial in ladder order, if any.
pub fn sweep<E, S, O>(
    extract_path: &Path,
    params: &SearchParams,
    mode: EncodeMode,
    encode_fn: E,
    score_fn: S,
    observer: O,
) -> CoreResult<SearchResult>
where
    E: FnMut(&Path, u8) -> CoreResult<EncodedArtifact>,
    S: FnMut(&Path, &EncodedArtifact) -> CoreResult<QualityReport>,
    O: FnMut(&EncodeTrial) -> CoreResult<()>,
{
    run_ladder(extract_path, params, mode, false, encode_fn, score_fn, observer)
}

fn run_ladder<E, S, O>(
    extract_path: &Path,
    params: &SearchParams,
    mode: EncodeMode,
    stop_at_threshold: bool,
    mut encode_fn: E,
    mut score_fn: S,
    mut observer: O,
) -> CoreResult<SearchResult>
where
    E: FnMut(&Path, u8) -> CoreResult<EncodedArtifact>,
    S: FnMut(&Path, &EncodedArtifact) -> CoreResult<QualityReport>,
    O: FnMut(&EncodeTrial) -> CoreResult<()>,
{
    params.validate()?;

    debug!(
        "CRF ladder for {} ({}): {:?}, threshold {}",
        extract_path.display(),
        mode,
        params.ladder(),
        params.threshold
    );

    let mut trials: Vec<EncodeTrial> = Vec::with_capacity(params.max_trials());
    let mut first_pass: Option<usize> = None;

    for quality in params.ladder() {
        let encode_start = Instant::now();
        let artifact = encode_fn(extract_path, quality)?;
        let elapsed_time = if artifact.elapsed.is_zero() {
            encode_start.elapsed()
        } else {
            artifact.elapsed
        };

        let score_start = Instant::now();
        let report = score_fn(extract_path, &artifact)?;
        let score_time = score_start.elapsed();

        let trial = EncodeTrial {
            quality_param: quality,
            mode,
            measured_quality: report.harmonic_mean,
            report,
            elapsed_time,
            score_time,
            output_size_bytes: artifact.size_bytes,
            output_path: artifact.path,
            command: artifact.command,
        };
        let passed = trial.measured_quality >= params.threshold;
        info!(
            "CRF {} ({}): VMAF {:.3} [{}]",
            quality,
            mode,
            trial.measured_quality,
            if passed { "pass" } else { "below threshold" }
        );

        observer(&trial)?;
        trials.push(trial);

        if passed && first_pass.is_none() {
            first_pass = Some(trials.len() - 1);
            if stop_at_threshold {
                break;
            }
        }
    }

    let outcome = match first_pass {
        Some(index) => SearchOutcome::Found(trials[index].clone()),
        None => {
            let best = trials
                .iter()
                .max_by(|a, b| a.measured_quality.total_cmp(&b.measured_quality))
                .cloned();
            info!(
                "No CRF in {}..={} reached VMAF {} for {} ({})",
                params.bounds.min,
                params.bounds.max,
                params.threshold,
                extract_path.display(),
                mode
            );
            SearchOutcome::Exhausted { best }
        }
    };

    Ok(SearchResult {
        mode,
        outcome,
        trials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn artifact(quality: u8) -> EncodedArtifact {
        EncodedArtifact {
            path: PathBuf::from(format!("clip.crf{quality}.mp4")),
            size_bytes: 1_000 * u64::from(60 - quality),
            elapsed: Duration::from_millis(5),
            command: format!("ffmpeg -crf {quality}"),
        }
    }

    fn crf_from_path(path: &Path) -> u8 {
        let name = path.to_string_lossy();
        let start = name.find("crf").unwrap() + 3;
        let end = name[start..].find('.').unwrap() + start;
        name[start..end].parse().unwrap()
    }

    fn params(min: u8, max: u8, step: u8, threshold: f64) -> SearchParams {
        SearchParams::new(QualityBounds::new(min, max), step, threshold)
    }

    #[test]
    fn finds_first_crf_meeting_threshold() {
        let p = params(23, 30, 1, 85.0);
        let result = search(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| Ok(artifact(q)),
            |_, a| {
                let q = crf_from_path(&a.path);
                Ok(QualityReport::from_harmonic_mean(if q <= 27 { 90.0 } else { 80.0 }))
            },
        )
        .unwrap();

        assert!(result.is_found());
        assert_eq!(result.found_quality(), Some(27));
        let tried: Vec<u8> = result.trials.iter().map(|t| t.quality_param).collect();
        assert_eq!(tried, vec![30, 29, 28, 27]);
    }

    #[test]
    fn exhausted_after_exact_trial_count() {
        for (min, max, step) in [(23, 30, 1), (23, 30, 2), (23, 30, 3), (20, 20, 1), (0, 51, 5)] {
            let p = params(min, max, step, 85.0);
            let calls = RefCell::new(0usize);
            let result = search(
                Path::new("clip.mov"),
                &p,
                EncodeMode::Complex,
                |_, q| {
                    *calls.borrow_mut() += 1;
                    Ok(artifact(q))
                },
                |_, _| Ok(QualityReport::from_harmonic_mean(50.0)),
            )
            .unwrap();

            let expected = usize::from((max - min) / step) + 1;
            assert!(!result.is_found());
            assert_eq!(result.trials.len(), expected, "bounds {min}..={max} step {step}");
            assert_eq!(*calls.borrow(), expected);
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let p = params(23, 30, 1, 85.0);
        let result = search(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| Ok(artifact(q)),
            |_, _| Ok(QualityReport::from_harmonic_mean(85.0)),
        )
        .unwrap();
        assert_eq!(result.found_quality(), Some(30));
        assert_eq!(result.trials.len(), 1);
    }

    #[test]
    fn exhausted_reports_best_seen_trial() {
        let p = params(25, 28, 1, 95.0);
        let result = search(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| Ok(artifact(q)),
            |_, a| Ok(QualityReport::from_harmonic_mean(100.0 - f64::from(crf_from_path(&a.path)))),
        )
        .unwrap();
        match &result.outcome {
            SearchOutcome::Exhausted { best: Some(best) } => {
                assert_eq!(best.quality_param, 25);
                assert_eq!(best.measured_quality, 75.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(result.best_effort().map(|t| t.quality_param), Some(25));
    }

    #[test]
    fn encode_failure_stops_the_search() {
        let p = params(23, 30, 1, 85.0);
        let scored = RefCell::new(0usize);
        let err = search(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| {
                if q == 28 {
                    Err(CoreError::ToolInvocation {
                        command: "ffmpeg -crf 28".to_string(),
                        status: "exit status: 1".to_string(),
                        output: "Unknown encoder".to_string(),
                    })
                } else {
                    Ok(artifact(q))
                }
            },
            |_, _| {
                *scored.borrow_mut() += 1;
                Ok(QualityReport::from_harmonic_mean(10.0))
            },
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::ToolInvocation { ref command, .. } if command.contains("28")));
        assert_eq!(*scored.borrow(), 2);
    }

    #[test]
    fn score_failure_stops_the_search() {
        let p = params(23, 30, 1, 85.0);
        let encodes = RefCell::new(0usize);
        let result = search(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| {
                *encodes.borrow_mut() += 1;
                Ok(artifact(q))
            },
            |_, _| Err(CoreError::VmafParse("missing pooled_metrics".to_string())),
        );
        assert!(matches!(result, Err(CoreError::VmafParse(_))));
        assert_eq!(*encodes.borrow(), 1);
    }

    #[test]
    fn observer_sees_every_trial_before_a_failure() {
        let p = params(23, 30, 1, 85.0);
        let seen = RefCell::new(Vec::new());
        let result = search_with_observer(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| Ok(artifact(q)),
            |_, a| {
                if crf_from_path(&a.path) == 27 {
                    Err(CoreError::VmafParse("truncated log".to_string()))
                } else {
                    Ok(QualityReport::from_harmonic_mean(70.0))
                }
            },
            |trial| {
                seen.borrow_mut().push(trial.quality_param);
                Ok(())
            },
        );
        assert!(result.is_err());
        assert_eq!(*seen.borrow(), vec![30, 29, 28]);
    }

    #[test]
    fn sweep_runs_every_rung() {
        let p = params(23, 30, 1, 85.0);
        let result = sweep(
            Path::new("clip.mov"),
            &p,
            EncodeMode::Simple,
            |_, q| Ok(artifact(q)),
            |_, a| {
                let q = crf_from_path(&a.path);
                Ok(QualityReport::from_harmonic_mean(if q <= 27 { 90.0 } else { 80.0 }))
            },
            |_| Ok(()),
        )
        .unwrap();
        assert_eq!(result.trials.len(), 8);
        assert_eq!(result.found_quality(), Some(27));
    }

    #[test]
    fn invalid_params_fail_before_any_encode() {
        let encodes = RefCell::new(0usize);
        for p in [params(30, 23, 1, 85.0), params(23, 30, 0, 85.0), params(23, 30, 1, f64::NAN)] {
            let result = search(
                Path::new("clip.mov"),
                &p,
                EncodeMode::Simple,
                |_, q| {
                    *encodes.borrow_mut() += 1;
                    Ok(artifact(q))
                },
                |_, _| Ok(QualityReport::from_harmonic_mean(99.0)),
            );
            assert!(matches!(result, Err(CoreError::Config(_))));
        }
        assert_eq!(*encodes.borrow(), 0);
    }

    #[test]
    fn ladder_starts_coarse_and_respects_step() {
        assert_eq!(params(23, 30, 3, 85.0).ladder(), vec![30, 27, 24]);
        assert_eq!(params(0, 2, 1, 85.0).ladder(), vec![2, 1, 0]);
        assert_eq!(params(0, 2, 1, 85.0).max_trials(), 3);
    }

    #[test]
    fn inverted_bounds_have_no_trials() {
        let inverted = params(30, 23, 1, 85.0);
        assert_eq!(inverted.max_trials(), 0);
        assert!(inverted.ladder().is_empty());
        assert!(inverted.validate().is_err());
        assert_eq!(params(23, 30, 3, 85.0).max_trials(), params(23, 30, 3, 85.0).ladder().len());
    }
}
