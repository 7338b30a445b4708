//! Configuration structures and constants for the crftune-core library.
//!
//! Everything the pipeline needs is passed in through [`CoreConfig`]: tool
//! locations, the CRF range to explore, the VMAF target, and which clips to
//! cut. Nothing is read from the process environment here; the CLI is
//! responsible for turning flags and environment variables into a config.

mod builder;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

pub use builder::CoreConfigBuilder;

// Default constants

/// Lowest (finest) CRF value explored by default.
pub const DEFAULT_MIN_CRF: u8 = 23;

/// Highest (coarsest) CRF value explored by default. The search starts here.
pub const DEFAULT_MAX_CRF: u8 = 30;

/// Highest CRF accepted by libx264.
pub const MAX_ENCODER_CRF: u8 = 51;

/// Default CRF decrement between two trials.
pub const DEFAULT_CRF_STEP: u8 = 1;

/// Default minimum VMAF harmonic mean an encode must reach.
pub const DEFAULT_VMAF_THRESHOLD: f64 = 85.0;

/// Default number of scene-change samples taken per video.
pub const DEFAULT_SAMPLE_COUNT: usize = 3;

/// Default extract duration in seconds.
pub const DEFAULT_EXTRACT_DURATION: f64 = 45.0;

/// Default minimum scene score kept by the scene detector (0 keeps every frame).
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.0;

/// Default ffmpeg binary (must be built with libvmaf).
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Default ffprobe binary.
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Default directory for scene caches and trial logs.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Locations of the external binaries and models used by the adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    /// ffmpeg binary used for extraction, encoding, scene detection and VMAF
    pub ffmpeg: PathBuf,

    /// ffprobe binary used for media properties
    pub ffprobe: PathBuf,

    /// Optional VMAF model file; libvmaf's built-in model is used when absent
    pub vmaf_model: Option<PathBuf>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            ffprobe: PathBuf::from(DEFAULT_FFPROBE),
            vmaf_model: None,
        }
    }
}

/// How a trial encode is parameterised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeMode {
    /// Only `-crf` is passed; every other setting is ffmpeg's default.
    Simple,
    /// Full libx264/aac parameter set derived from the probed source.
    Complex,
}

impl EncodeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EncodeMode::Simple => "simple",
            EncodeMode::Complex => "complex",
        }
    }
}

impl fmt::Display for EncodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodeMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(EncodeMode::Simple),
            "complex" => Ok(EncodeMode::Complex),
            other => Err(CoreError::Config(format!(
                "Unknown encode mode '{other}' (expected 'simple' or 'complex')"
            ))),
        }
    }
}

/// Inclusive CRF range explored by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityBounds {
    /// Finest quality parameter tried last
    pub min: u8,
    /// Coarsest quality parameter tried first
    pub max: u8,
}

impl QualityBounds {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }
}

impl Default for QualityBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_CRF,
            max: DEFAULT_MAX_CRF,
        }
    }
}

/// Whether each clip stops at the first passing CRF or explores every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Stop at the first CRF meeting the threshold.
    #[default]
    Search,
    /// Encode and score every CRF in the bounds.
    Study,
}

/// Main configuration structure for the crftune-core library.
///
/// # Examples
///
/// ```rust
/// use crftune_core::config::{CoreConfigBuilder, EncodeMode};
///
/// let config = CoreConfigBuilder::new()
///     .output_dir("/tmp/crftune")
///     .quality_bounds(23, 30)
///     .vmaf_threshold(85.0)
///     .modes(vec![EncodeMode::Simple])
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// External binaries and model
    pub tools: ToolPaths,

    /// Directory holding the scene cache and the trial log
    pub output_dir: PathBuf,

    /// Directory for extracts, encodes and VMAF logs. A temporary directory
    /// under `output_dir` is used when unset.
    pub work_dir: Option<PathBuf>,

    /// Keep the temporary work directory after the run
    pub keep_artifacts: bool,

    /// Number of scene-change samples to extract
    pub sample_count: usize,

    /// Extract durations (seconds) tried for each sample
    pub extract_durations: Vec<f64>,

    /// CRF range explored per clip
    pub quality_bounds: QualityBounds,

    /// CRF decrement between trials
    pub quality_step: u8,

    /// Minimum VMAF harmonic mean (inclusive)
    pub vmaf_threshold: f64,

    /// Encode modes tried per clip; the first one drives the recommendation
    pub modes: Vec<EncodeMode>,

    /// Minimum scene score kept by the detector (0.0-1.0)
    pub scene_threshold: f64,

    /// Seconds of candidate offsets scanned to align encodes before VMAF
    pub sync_window: Option<f64>,

    /// Flags removed (with their value) from the complex encode arguments
    pub omit_options: Vec<String>,

    /// Upper bound on any single external tool invocation
    pub tool_timeout: Option<Duration>,

    /// Use the best-seen trial when a clip never reaches the threshold
    pub accept_best_effort: bool,

    /// Search or study
    pub run_mode: RunMode,

    /// Encode the whole source at the recommended CRF into this file
    pub final_output: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            work_dir: None,
            keep_artifacts: false,
            sample_count: DEFAULT_SAMPLE_COUNT,
            extract_durations: vec![DEFAULT_EXTRACT_DURATION],
            quality_bounds: QualityBounds::default(),
            quality_step: DEFAULT_CRF_STEP,
            vmaf_threshold: DEFAULT_VMAF_THRESHOLD,
            modes: vec![EncodeMode::Simple, EncodeMode::Complex],
            scene_threshold: DEFAULT_SCENE_THRESHOLD,
            sync_window: None,
            omit_options: Vec::new(),
            tool_timeout: None,
            accept_best_effort: false,
            run_mode: RunMode::Search,
            final_output: None,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration with default values writing to `output_dir`.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Self::default()
        }
    }

    /// Checks every field for values the pipeline cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        let QualityBounds { min, max } = self.quality_bounds;
        if min > max {
            return Err(CoreError::Config(format!(
                "Minimum CRF ({min}) is greater than maximum CRF ({max})"
            )));
        }
        if max > MAX_ENCODER_CRF {
            return Err(CoreError::Config(format!(
                "Maximum CRF ({max}) exceeds the encoder limit of {MAX_ENCODER_CRF}"
            )));
        }
        if self.quality_step == 0 {
            return Err(CoreError::Config("CRF step must be at least 1".to_string()));
        }
        if !self.vmaf_threshold.is_finite() || !(0.0..=100.0).contains(&self.vmaf_threshold) {
            return Err(CoreError::Config(format!(
                "VMAF threshold must be between 0 and 100, got {}",
                self.vmaf_threshold
            )));
        }
        if self.sample_count == 0 {
            return Err(CoreError::Config("Sample count must be at least 1".to_string()));
        }
        if self.extract_durations.is_empty() {
            return Err(CoreError::Config(
                "At least one extract duration is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .extract_durations
            .iter()
            .find(|d| !d.is_finite() || **d <= 0.0)
        {
            return Err(CoreError::Config(format!(
                "Extract durations must be positive, got {bad}"
            )));
        }
        if self.modes.is_empty() {
            return Err(CoreError::Config("At least one encode mode is required".to_string()));
        }
        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(CoreError::Config(format!(
                "Scene threshold must be between 0 and 1, got {}",
                self.scene_threshold
            )));
        }
        if let Some(window) = self.sync_window {
            if !window.is_finite() || window <= 0.0 {
                return Err(CoreError::Config(format!(
                    "Sync window must be positive, got {window}"
                )));
            }
        }
        if self.tool_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config("Tool timeout must be non-zero".to_string()));
        }
        if self.omit_options.iter().any(|o| !o.starts_with('-')) {
            return Err(CoreError::Config(
                "Omitted options must be ffmpeg flags starting with '-'".to_string(),
            ));
        }
        Ok(())
    }

    /// The mode whose results drive the recommended CRF.
    pub fn primary_mode(&self) -> EncodeMode {
        self.modes.first().copied().unwrap_or(EncodeMode::Simple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let config = CoreConfig {
            quality_bounds: QualityBounds::new(30, 23),
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn zero_step_is_rejected() {
        let config = CoreConfig {
            quality_step: 0,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn crf_above_encoder_limit_is_rejected() {
        let config = CoreConfig {
            quality_bounds: QualityBounds::new(40, 60),
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let config = CoreConfig {
            extract_durations: vec![30.0, 0.0],
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn omitted_options_must_be_flags() {
        let config = CoreConfig {
            omit_options: vec!["preset".to_string()],
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn encode_mode_parses_case_insensitively() {
        assert_eq!("Simple".parse::<EncodeMode>().unwrap(), EncodeMode::Simple);
        assert_eq!("COMPLEX".parse::<EncodeMode>().unwrap(), EncodeMode::Complex);
        assert!("fast".parse::<EncodeMode>().is_err());
    }

    #[test]
    fn primary_mode_is_first_configured() {
        let config = CoreConfig {
            modes: vec![EncodeMode::Complex, EncodeMode::Simple],
            ..CoreConfig::default()
        };
        assert_eq!(config.primary_mode(), EncodeMode::Complex);
    }
}
