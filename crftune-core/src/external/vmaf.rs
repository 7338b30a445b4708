// ============================================================================
// crftune-core/src/external/vmaf.rs
// ============================================================================
//
// VMAF SCORING: Perceptual quality of an encode against its reference
//
// Runs ffmpeg's libvmaf filter with a JSON log and reads the pooled harmonic
// mean back from that log. When the pooled block is missing the harmonic
// mean is computed from the per-frame scores. Optionally the candidate is
// first aligned with the reference by scanning small offsets and keeping the
// one with the best PSNR.
//
// KEY COMPONENTS:
// - VmafScorer: QualityScorer backed by ffmpeg + libvmaf
// - parse_vmaf_log: JSON log to QualityReport
// - parse_psnr_average / harmonic_mean: measurement helpers
//
// AI-ASSISTANT-INFO: VMAF measurement, log parsing and sync offset search

use crate::error::{CoreError, CoreResult, malformed_output_error};
use crate::external::ffmpeg::{build_psnr_command, build_vmaf_command};
use crate::external::process::describe_command;
use crate::external::{FfmpegSpawner, QualityScorer, SyncSearch};
use crate::processing::search::QualityReport;

use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct VmafLog {
    #[serde(default)]
    frames: Vec<VmafFrame>,
    #[serde(default)]
    pooled_metrics: HashMap<String, PooledMetric>,
}

#[derive(Debug, Deserialize)]
struct VmafFrame {
    #[serde(default)]
    metrics: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct PooledMetric {
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
    harmonic_mean: Option<f64>,
}

/// Harmonic mean of `values`; zero when any value is zero.
pub fn harmonic_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    if values.iter().any(|v| *v <= 0.0) {
        return Some(0.0);
    }
    let inverse_sum: f64 = values.iter().map(|v| 1.0 / v).sum();
    Some(values.len() as f64 / inverse_sum)
}

fn arithmetic_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Reads a libvmaf JSON log.
///
/// The pooled `vmaf` block is preferred; per-frame `vmaf` scores are always
/// collected and used to fill in whatever the pooled block lacks.
pub fn parse_vmaf_log(json: &str) -> CoreResult<QualityReport> {
    let log: VmafLog = serde_json::from_str(json)
        .map_err(|e| CoreError::VmafParse(format!("invalid VMAF log: {e}")))?;

    let frame_scores: Vec<f64> = log
        .frames
        .iter()
        .filter_map(|f| f.metrics.get("vmaf").copied())
        .collect();
    let pooled = log.pooled_metrics.get("vmaf");

    let harmonic = pooled
        .and_then(|p| p.harmonic_mean)
        .or_else(|| harmonic_mean(&frame_scores))
        .ok_or_else(|| {
            CoreError::VmafParse("log has neither pooled nor per-frame VMAF scores".to_string())
        })?;

    Ok(QualityReport {
        harmonic_mean: harmonic,
        mean: pooled.and_then(|p| p.mean).or_else(|| arithmetic_mean(&frame_scores)),
        min: pooled
            .and_then(|p| p.min)
            .or_else(|| frame_scores.iter().copied().reduce(f64::min)),
        max: pooled
            .and_then(|p| p.max)
            .or_else(|| frame_scores.iter().copied().reduce(f64::max)),
        frame_scores,
        offset: None,
        psnr: None,
    })
}

/// Extracts the `average:` value from the psnr filter's summary line.
pub fn parse_psnr_average(stderr: &str) -> Option<f64> {
    stderr
        .lines()
        .rev()
        .filter(|line| line.contains("PSNR "))
        .find_map(|line| {
            let rest = &line[line.find("average:")? + "average:".len()..];
            rest.split_whitespace().next()?.parse::<f64>().ok()
        })
}

/// Quality scorer running libvmaf through ffmpeg.
pub struct VmafScorer<S: FfmpegSpawner> {
    ffmpeg: PathBuf,
    model: Option<PathBuf>,
    spawner: S,
}

impl<S: FfmpegSpawner> VmafScorer<S> {
    pub fn new(ffmpeg: impl Into<PathBuf>, model: Option<PathBuf>, spawner: S) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            model,
            spawner,
        }
    }

    /// PSNR of `candidate` shifted by `offset` seconds.
    fn psnr_at(&self, reference: &Path, candidate: &Path, offset: f64) -> CoreResult<f64> {
        let mut cmd = build_psnr_command(&self.ffmpeg, reference, candidate, offset);
        let command = describe_command(cmd.as_inner());
        let output = self.spawner.run(cmd, "psnr sync")?;
        parse_psnr_average(&output.stderr).ok_or_else(|| {
            malformed_output_error(
                command,
                format!(
                    "no PSNR summary for {} at offset {offset:.3}s",
                    candidate.display()
                ),
            )
        })
    }

    /// Offset with the highest PSNR among `0, 1/fps, 2/fps, ..` below the window.
    pub fn sync_offset(
        &self,
        reference: &Path,
        candidate: &Path,
        sync: &SyncSearch,
    ) -> CoreResult<(f64, f64)> {
        let steps = sync.steps();
        let mut best: Option<(f64, f64)> = None;
        for step in 0..steps {
            let offset = step as f64 / sync.frame_rate;
            let psnr = self.psnr_at(reference, candidate, offset)?;
            debug!("Sync offset {offset:.3}s: PSNR {psnr:.3}");
            if best.is_none_or(|(_, best_psnr)| psnr > best_psnr) {
                best = Some((offset, psnr));
            }
        }
        best.ok_or_else(|| CoreError::Config("Sync window shorter than one frame".to_string()))
    }
}

impl<S: FfmpegSpawner> QualityScorer for VmafScorer<S> {
    fn score(
        &self,
        reference: &Path,
        candidate: &Path,
        log_path: &Path,
        sync: Option<&SyncSearch>,
    ) -> CoreResult<QualityReport> {
        let alignment = match sync {
            Some(sync) => Some(self.sync_offset(reference, candidate, sync)?),
            None => None,
        };
        if let Some((offset, psnr)) = alignment {
            info!(
                "Aligned {} by {offset:.3}s (PSNR {psnr:.2})",
                candidate.display()
            );
        }

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut cmd = build_vmaf_command(
            &self.ffmpeg,
            reference,
            candidate,
            log_path,
            self.model.as_deref(),
            alignment.map(|(offset, _)| offset),
        );
        let command = describe_command(cmd.as_inner());
        self.spawner.run(cmd, "vmaf")?;

        let json = fs::read_to_string(log_path).map_err(|e| {
            malformed_output_error(
                command.as_str(),
                format!("cannot read VMAF log {}: {e}", log_path.display()),
            )
        })?;
        let mut report = parse_vmaf_log(&json)
            .map_err(|e| malformed_output_error(command.as_str(), e.to_string()))?;
        if let Some((offset, psnr)) = alignment {
            report.offset = Some(offset);
            report.psnr = Some(psnr);
        }
        Ok(report)
    }
}
