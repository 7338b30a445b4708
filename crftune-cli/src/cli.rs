// crftune-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use crftune_core::EncodeMode;
use std::path::PathBuf;

use crate::config::{
    DEFAULT_FFMPEG, DEFAULT_FFPROBE, DEFAULT_OUTPUT_DIR, DEFAULT_SCENE_THRESHOLD,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "crftune: CRF selection by VMAF threshold",
    long_about = "Encodes short clips around scene changes at decreasing CRF values and \
                  scores them with libvmaf to find the coarsest CRF meeting a quality target."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Enable debug logging (every ffmpeg command line)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Directory for log files (defaults to OUTPUT_DIR/logs)
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Locations of the external tools, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// ffmpeg binary built with libvmaf
    #[arg(long, global = true, value_name = "PATH", env = "CRFTUNE_FFMPEG", default_value = DEFAULT_FFMPEG)]
    pub ffmpeg: PathBuf,

    /// ffprobe binary
    #[arg(long, global = true, value_name = "PATH", env = "CRFTUNE_FFPROBE", default_value = DEFAULT_FFPROBE)]
    pub ffprobe: PathBuf,

    /// VMAF model file (libvmaf's built-in model when omitted)
    #[arg(long, global = true, value_name = "PATH", env = "CRFTUNE_VMAF_MODEL")]
    pub vmaf_model: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Finds the coarsest CRF meeting the VMAF threshold on every sample
    Search(SearchArgs),
    /// Encodes and scores every CRF in range for every sample
    Study(StudyArgs),
    /// Computes (or reads cached) scene-change scores
    Scenes(ScenesArgs),
    /// Probes a video and prints the derived encode parameters
    Info(InfoArgs),
}

impl Commands {
    /// Short name used in log file names.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Search(_) => "search",
            Commands::Study(_) => "study",
            Commands::Scenes(_) => "scenes",
            Commands::Info(_) => "info",
        }
    }
}

/// Arguments shared by `search` and `study`.
#[derive(Args, Debug, Clone)]
pub struct TuneArgs {
    /// Source video
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory for the scene cache and the trial log
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Directory for extracts, encodes and VMAF logs (kept after the run)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Finest CRF tried
    #[arg(long, value_name = "CRF", value_parser = clap::value_parser!(u8).range(0..=51))]
    pub min_crf: Option<u8>,

    /// Coarsest CRF tried, and the first one
    #[arg(long, value_name = "CRF", value_parser = clap::value_parser!(u8).range(0..=51))]
    pub max_crf: Option<u8>,

    /// CRF decrement between trials
    #[arg(long, value_name = "STEP", value_parser = clap::value_parser!(u8).range(1..=51))]
    pub step: Option<u8>,

    /// Minimum VMAF harmonic mean (inclusive)
    #[arg(short, long, value_name = "VMAF")]
    pub threshold: Option<f64>,

    /// Number of scene-change samples
    #[arg(short, long, value_name = "COUNT")]
    pub samples: Option<usize>,

    /// Extract duration in seconds; repeat or comma-separate for several
    #[arg(short, long = "duration", value_name = "SECONDS", value_delimiter = ',')]
    pub durations: Vec<f64>,

    /// Encode mode; repeat or comma-separate for several (first one drives the result)
    #[arg(short, long = "mode", value_name = "MODE", value_delimiter = ',')]
    pub modes: Vec<EncodeMode>,

    /// Minimum scene score kept by scene detection (0.0-1.0)
    #[arg(long, value_name = "SCORE", default_value_t = DEFAULT_SCENE_THRESHOLD)]
    pub scene_threshold: f64,

    /// Seconds of offsets scanned to align each encode with its extract before VMAF
    #[arg(long, value_name = "SECONDS")]
    pub sync_window: Option<f64>,

    /// Kill any single ffmpeg/ffprobe run after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Keep the temporary work directory after the run
    #[arg(long, default_value_t = false)]
    pub keep_artifacts: bool,

    /// Emit progress events and the summary as JSON lines on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub tune: TuneArgs,

    /// Use the best-seen CRF for samples that never reach the threshold
    #[arg(long, default_value_t = false)]
    pub best_effort: bool,

    /// Encode the whole input at the recommended CRF into this file
    #[arg(long, value_name = "PATH")]
    pub encode_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StudyArgs {
    #[command(flatten)]
    pub tune: TuneArgs,

    /// ffmpeg flag removed (with its value) from the complex encode; repeatable
    #[arg(long = "omit-option", value_name = "FLAG", allow_hyphen_values = true)]
    pub omit_options: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ScenesArgs {
    /// Source video
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Scene score file to read or write (defaults to OUTPUT_DIR/<stem>-scenescore.json)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Minimum scene score kept (0.0-1.0)
    #[arg(short, long, value_name = "SCORE", default_value_t = DEFAULT_SCENE_THRESHOLD)]
    pub threshold: f64,

    /// Directory holding the default scene cache
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Print at most this many of the strongest scene changes
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Video to probe
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// ffmpeg flag removed from the printed complex arguments; repeatable
    #[arg(long = "omit-option", value_name = "FLAG", allow_hyphen_values = true)]
    pub omit_options: Vec<String>,

    /// Print the probed properties as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
