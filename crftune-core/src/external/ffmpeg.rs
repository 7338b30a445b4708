//! FFmpeg command building for extraction, trial encodes and measurements
//!
//! Every ffmpeg command line crftune runs is assembled here, so the argument
//! layout of each step can be inspected without launching ffmpeg. Execution
//! lives in the adapters that call these builders.

use crate::config::EncodeMode;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegCommandBuilder, VideoFilterChain};
use crate::processing::samples::ExtractWindow;
use crate::processing::video_properties::VideoProperties;

use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;

/// Keyframe interval of the complex encode.
const GOP_SIZE: &str = "300";

/// Seconds of each clip compared when searching for the sync offset.
pub const SYNC_PROBE_SECONDS: f64 = 3.0;

/// Source-derived settings of the complex encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexParams {
    /// Even output width, corrected for non-square pixels
    pub width: u32,
    /// Even output height
    pub height: u32,
    pub frame_rate: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    /// Flags removed, with their value, from the argument list
    pub omit_options: Vec<String>,
}

impl ComplexParams {
    /// Derives the complex encode settings from probed properties.
    pub fn from_properties(props: &VideoProperties, omit_options: &[String]) -> Self {
        let (width, height) = props.target_resolution();
        Self {
            width,
            height,
            frame_rate: props.frame_rate,
            sample_rate: props.sample_rate,
            channels: props.channels,
            omit_options: omit_options.to_vec(),
        }
    }

    /// Display aspect ratio passed to `-aspect`.
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }

    /// Output-side arguments of the complex encode at `crf`.
    pub fn args(&self, crf: u8) -> Vec<String> {
        let mut args: Vec<String> = vec!["-c:a".into(), "aac".into()];
        if let Some(rate) = self.sample_rate {
            args.extend(["-ar".into(), rate.to_string()]);
        }
        if let Some(channels) = self.channels {
            args.extend(["-ac".into(), channels.to_string()]);
        }

        args.extend(
            [
                "-c:v", "libx264",
                "-sws_flags", "lanczos",
                "-pix_fmt", "yuv420p",
                "-threads", "0",
                "-movflags", "+faststart",
                "-b-pyramid", "none",
                "-b_strategy", "2",
            ]
            .map(String::from),
        );
        if let Some(fps) = self.frame_rate {
            args.extend(["-r".into(), format_number(fps)]);
        }
        args.extend(
            [
                "-g", GOP_SIZE,
                "-keyint_min", "1",
                "-preset", "veryfast",
                "-refs", "4",
                "-me_method", "hex",
                "-me_range", "32",
                "-qcomp", "0.6",
                "-qmin", "3",
                "-subq", "4",
            ]
            .map(String::from),
        );
        args.extend(["-crf".into(), crf.to_string()]);

        let filters = VideoFilterChain::new()
            .add_scale(self.width, self.height)
            .add_square_pixels()
            .build();
        if self.width > 0 && self.height > 0 {
            args.extend(["-aspect".into(), format_number(self.aspect())]);
        }
        if let Some(filters) = filters {
            args.extend(["-vf".into(), filters]);
        }

        remove_options(args, &self.omit_options)
    }
}

/// Removes each flag in `omit` together with the value that follows it.
///
/// The value is only dropped when it is not itself a flag.
pub fn remove_options(args: Vec<String>, omit: &[String]) -> Vec<String> {
    if omit.is_empty() {
        return args;
    }
    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        if omit.iter().any(|o| *o == arg) {
            if iter.peek().is_some_and(|next| !next.starts_with('-') || next.parse::<f64>().is_ok()) {
                iter.next();
            }
            continue;
        }
        kept.push(arg);
    }
    kept
}

/// Formats a float without a trailing `.0` for integral values.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `ffmpeg -i input -ss start -t duration -c copy output`
pub fn build_extract_command(
    ffmpeg: &Path,
    input: &Path,
    window: &ExtractWindow,
    output: &Path,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommandBuilder::new(ffmpeg).build();
    cmd.input(path_arg(input));
    cmd.args(["-ss", &format_number(window.start)]);
    cmd.args(["-t", &format_number(window.duration)]);
    cmd.args(["-c", "copy"]);
    cmd.output(path_arg(output));
    cmd
}

/// Trial (or final) encode of `input` at `crf`.
///
/// Complex mode needs the parameters derived from the probed source.
pub fn build_encode_command(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    crf: u8,
    mode: EncodeMode,
    complex: Option<&ComplexParams>,
) -> CoreResult<FfmpegCommand> {
    let mut cmd = FfmpegCommandBuilder::new(ffmpeg).build();
    cmd.input(path_arg(input));
    match mode {
        EncodeMode::Simple => {
            cmd.args(["-crf", &crf.to_string()]);
        }
        EncodeMode::Complex => {
            let params = complex.ok_or_else(|| {
                CoreError::Config("Complex encode requested without source properties".to_string())
            })?;
            cmd.args(params.args(crf));
        }
    }
    cmd.output(path_arg(output));
    Ok(cmd)
}

/// libvmaf comparison of `distorted` against `reference`, logged as JSON.
///
/// `offset` seeks into the distorted input to line it up with the reference.
pub fn build_vmaf_command(
    ffmpeg: &Path,
    reference: &Path,
    distorted: &Path,
    log_path: &Path,
    model: Option<&Path>,
    offset: Option<f64>,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommandBuilder::new(ffmpeg).build();
    cmd.input(path_arg(reference));
    if let Some(offset) = offset.filter(|o| *o > 0.0) {
        cmd.args(["-ss", &format_number(offset)]);
    }
    cmd.input(path_arg(distorted));

    let mut vmaf = format!(
        "libvmaf=log_fmt=json:log_path={}",
        escape_filter_path(log_path)
    );
    if let Some(model) = model {
        vmaf.push_str(&format!(":model_path={}", escape_filter_path(model)));
    }
    let graph = format!(
        "[0:v]setpts=PTS-STARTPTS[ref];[1:v]setpts=PTS-STARTPTS[dist];[dist][ref]{vmaf}"
    );
    cmd.args(["-lavfi", &graph]);
    cmd.args(["-threads", "0"]);
    cmd.args(["-f", "null", "-"]);
    cmd
}

/// PSNR of the first [`SYNC_PROBE_SECONDS`] of `distorted` shifted by `offset`.
pub fn build_psnr_command(
    ffmpeg: &Path,
    reference: &Path,
    distorted: &Path,
    offset: f64,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommandBuilder::new(ffmpeg).build();
    cmd.input(path_arg(reference));
    if offset > 0.0 {
        cmd.args(["-ss", &format_number(offset)]);
    }
    cmd.input(path_arg(distorted));
    let probe = format_number(SYNC_PROBE_SECONDS);
    let graph = format!(
        "[0:v]trim=duration={probe},setpts=PTS-STARTPTS[ref];\
         [1:v]trim=duration={probe},setpts=PTS-STARTPTS[dist];[dist][ref]psnr"
    );
    cmd.args(["-lavfi", &graph]);
    cmd.args(["-f", "null", "-"]);
    cmd
}

/// Scene-change scores of every frame at or above `threshold`, written by
/// the metadata filter to `metadata_path`.
pub fn build_scene_command(
    ffmpeg: &Path,
    input: &Path,
    threshold: f64,
    metadata_path: &Path,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommandBuilder::new(ffmpeg).build();
    cmd.input(path_arg(input));
    let filters = VideoFilterChain::new()
        .add_filter(format!("select=gte(scene\\,{})", format_number(threshold)))
        .add_filter(format!(
            "metadata=print:file={}",
            escape_filter_path(metadata_path)
        ))
        .build()
        .unwrap_or_default();
    cmd.args(["-vf", &filters]);
    cmd.arg("-an");
    cmd.args(["-f", "null", "-"]);
    cmd
}

/// Escapes a path for use as a filter option value.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace(',', "\\,")
        .replace('\'', "\\'")
}
