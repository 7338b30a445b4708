//! Semicolon-delimited log of every trial.
//!
//! One row per encode, written and flushed as soon as the trial exists, so a
//! run that stops on a tool failure keeps every row produced before it.

use crate::config::EncodeMode;
use crate::error::CoreResult;
use crate::processing::samples::{ExtractWindow, SceneScore};
use crate::processing::search::EncodeTrial;
use crate::utils::{file_stem, size_percentage};

use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// `<output_dir>/<stem>_vmaf-scores.csv`
pub fn trial_log_path(output_dir: &Path, input: &Path) -> CoreResult<PathBuf> {
    Ok(output_dir.join(format!("{}_vmaf-scores.csv", file_stem(input)?)))
}

/// The clip a trial was run on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipContext {
    pub scene: SceneScore,
    pub window: ExtractWindow,
    pub extract_size: u64,
}

#[derive(Debug, Serialize)]
struct TrialRow<'a> {
    #[serde(rename = "Scene score")]
    scene_score: f64,
    #[serde(rename = "Time")]
    scene_time: f64,
    #[serde(rename = "Duration")]
    duration: f64,
    #[serde(rename = "Start")]
    start: f64,
    #[serde(rename = "End")]
    end: f64,
    #[serde(rename = "CRF value")]
    crf: u8,
    #[serde(rename = "Encoding method")]
    mode: EncodeMode,
    #[serde(rename = "Options removed")]
    options_removed: &'a str,
    #[serde(rename = "Encoding time (s)")]
    encoding_time: String,
    #[serde(rename = "VMAF offset")]
    offset: Option<f64>,
    #[serde(rename = "VMAF PSNR")]
    psnr: Option<f64>,
    #[serde(rename = "VMAF mean")]
    vmaf_mean: Option<f64>,
    #[serde(rename = "VMAF harmonic mean")]
    vmaf_harmonic_mean: f64,
    #[serde(rename = "VMAF computation time (s)")]
    vmaf_time: String,
    #[serde(rename = "Filesize")]
    filesize: u64,
    #[serde(rename = "Compression %")]
    compression: String,
    #[serde(rename = "Encoding command")]
    command: &'a str,
}

/// Open trial log.
pub struct TrialLog {
    path: PathBuf,
    writer: Writer<File>,
    options_removed: String,
    rows: usize,
}

impl TrialLog {
    /// Creates (or truncates) the log at `path`.
    ///
    /// `omit_options` is recorded on every row.
    pub fn create(path: &Path, omit_options: &[String]) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_path(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            options_removed: omit_options.join(" "),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Appends one row and flushes it to disk.
    pub fn record(&mut self, clip: &ClipContext, trial: &EncodeTrial) -> CoreResult<()> {
        let row = TrialRow {
            scene_score: clip.scene.score,
            scene_time: clip.scene.timestamp,
            duration: clip.window.duration,
            start: clip.window.start,
            end: clip.window.end(),
            crf: trial.quality_param,
            mode: trial.mode,
            options_removed: &self.options_removed,
            encoding_time: format!("{:.3}", trial.elapsed_time.as_secs_f64()),
            offset: trial.report.offset,
            psnr: trial.report.psnr,
            vmaf_mean: trial.report.mean,
            vmaf_harmonic_mean: trial.measured_quality,
            vmaf_time: format!("{:.3}", trial.score_time.as_secs_f64()),
            filesize: trial.output_size_bytes,
            compression: format!(
                "{:.2}",
                size_percentage(trial.output_size_bytes, clip.extract_size)
            ),
            command: &trial.command,
        };
        self.writer.serialize(row)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}
