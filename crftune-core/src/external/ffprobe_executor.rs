//! FFprobe integration for media analysis
//!
//! This module runs `ffprobe -print_format json -show_format -show_streams`
//! on the configured binary and turns its output into [`VideoProperties`].
//! Parsing is kept separate from execution so it can be tested on captured
//! output.

use crate::error::{CoreError, CoreResult, malformed_output_error};
use crate::external::Prober;
use crate::external::process::{describe_command, run_command};
use crate::processing::video_properties::VideoProperties;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    coded_width: Option<i64>,
    coded_height: Option<i64>,
    r_frame_rate: Option<String>,
    sample_aspect_ratio: Option<String>,
    sample_rate: Option<String>,
    channels: Option<i64>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Prober backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe: PathBuf,
    timeout: Option<Duration>,
}

impl FfprobeProber {
    pub fn new(ffprobe: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            timeout,
        }
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, video: &Path) -> CoreResult<VideoProperties> {
        log::debug!("Running ffprobe for video properties on: {}", video.display());
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-hide_banner", "-print_format", "json"])
            .args(["-show_format", "-show_streams"])
            .arg(video);
        let command = describe_command(&cmd);
        let output = run_command(&mut cmd, self.timeout)?;
        parse_probe_output(&output.stdout).map_err(|e| {
            log::error!("Unusable ffprobe output for {}: {}", video.display(), e);
            malformed_output_error(command, format!("{}: {e}", video.display()))
        })
    }
}

/// Parses `"30000/1001"` or `"25"` into frames per second.
fn parse_rational(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0 && num > 0.0).then(|| num / den)
        }
        None => value.trim().parse().ok().filter(|v: &f64| *v > 0.0),
    }
}

/// Parses `"4:3"`; square (`1:1`), unknown (`0:1`) and `N/A` give `None`.
fn parse_sample_aspect_ratio(value: &str) -> Option<(u32, u32)> {
    let (num, den) = value.split_once(':')?;
    let num: u32 = num.trim().parse().ok()?;
    let den: u32 = den.trim().parse().ok()?;
    (num > 0 && den > 0 && num != den).then_some((num, den))
}

fn positive_dimension(value: Option<i64>) -> Option<u32> {
    value.filter(|v| *v > 0).and_then(|v| u32::try_from(v).ok())
}

/// Builds [`VideoProperties`] from ffprobe's JSON output.
///
/// Fails with [`CoreError::ProbeParse`] when there is no video stream, no
/// usable dimensions or no positive duration.
pub fn parse_probe_output(json: &str) -> CoreResult<VideoProperties> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| CoreError::ProbeParse(format!("invalid ffprobe JSON: {e}")))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| CoreError::ProbeParse("no video stream found".to_string()))?;
    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let width = positive_dimension(video.width)
        .or_else(|| positive_dimension(video.coded_width))
        .ok_or_else(|| CoreError::ProbeParse("video stream has no width".to_string()))?;
    let height = positive_dimension(video.height)
        .or_else(|| positive_dimension(video.coded_height))
        .ok_or_else(|| CoreError::ProbeParse("video stream has no height".to_string()))?;

    let duration_secs = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| CoreError::ProbeParse("no usable duration".to_string()))?;

    Ok(VideoProperties {
        duration_secs,
        width,
        height,
        frame_rate: video.r_frame_rate.as_deref().and_then(parse_rational),
        sample_aspect_ratio: video
            .sample_aspect_ratio
            .as_deref()
            .and_then(parse_sample_aspect_ratio),
        sample_rate: audio
            .and_then(|a| a.sample_rate.as_deref())
            .and_then(|r| r.parse().ok()),
        channels: audio
            .and_then(|a| a.channels)
            .filter(|c| *c > 0)
            .and_then(|c| u32::try_from(c).ok()),
        video_codec: video.codec_name.clone(),
    })
}
