// ============================================================================
// crftune-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating configurations in code and tests.
// Validation is left to CoreConfig::validate so that the builder stays
// infallible.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

use std::path::PathBuf;
use std::time::Duration;

use super::{CoreConfig, EncodeMode, QualityBounds, RunMode, ToolPaths};

/// Builder for creating [`CoreConfig`] instances.
///
/// # Examples
///
/// ```rust
/// use crftune_core::config::{CoreConfigBuilder, EncodeMode, RunMode};
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg("/opt/ffmpeg/bin/ffmpeg")
///     .output_dir("/tmp/crftune")
///     .sample_count(3)
///     .extract_durations(vec![30.0, 45.0])
///     .quality_bounds(23, 30)
///     .quality_step(1)
///     .vmaf_threshold(85.0)
///     .modes(vec![EncodeMode::Simple, EncodeMode::Complex])
///     .tool_timeout(Duration::from_secs(600))
///     .run_mode(RunMode::Study)
///     .build();
/// assert_eq!(config.quality_bounds.max, 30);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tools.ffmpeg = path.into();
        self
    }

    pub fn ffprobe(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tools.ffprobe = path.into();
        self
    }

    pub fn vmaf_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tools.vmaf_model = Some(path.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Sets a persistent work directory instead of a temporary one.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.config.keep_artifacts = keep;
        self
    }

    pub fn sample_count(mut self, count: usize) -> Self {
        self.config.sample_count = count;
        self
    }

    pub fn extract_durations(mut self, durations: Vec<f64>) -> Self {
        self.config.extract_durations = durations;
        self
    }

    /// Sets the inclusive CRF range; the search starts at `max`.
    pub fn quality_bounds(mut self, min: u8, max: u8) -> Self {
        self.config.quality_bounds = QualityBounds::new(min, max);
        self
    }

    pub fn quality_step(mut self, step: u8) -> Self {
        self.config.quality_step = step;
        self
    }

    pub fn vmaf_threshold(mut self, threshold: f64) -> Self {
        self.config.vmaf_threshold = threshold;
        self
    }

    pub fn modes(mut self, modes: Vec<EncodeMode>) -> Self {
        self.config.modes = modes;
        self
    }

    pub fn scene_threshold(mut self, threshold: f64) -> Self {
        self.config.scene_threshold = threshold;
        self
    }

    pub fn sync_window(mut self, seconds: f64) -> Self {
        self.config.sync_window = Some(seconds);
        self
    }

    pub fn omit_options(mut self, options: Vec<String>) -> Self {
        self.config.omit_options = options;
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.config.tool_timeout = Some(timeout);
        self
    }

    pub fn accept_best_effort(mut self, accept: bool) -> Self {
        self.config.accept_best_effort = accept;
        self
    }

    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.config.run_mode = mode;
        self
    }

    pub fn final_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.final_output = Some(path.into());
        self
    }

    /// Returns the configured [`CoreConfig`].
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = CoreConfigBuilder::new()
            .ffprobe("/usr/local/bin/ffprobe")
            .vmaf_model("/models/vmaf_v0.6.1.json")
            .quality_bounds(20, 28)
            .quality_step(2)
            .sync_window(0.5)
            .build();

        assert_eq!(config.tools.ffprobe, PathBuf::from("/usr/local/bin/ffprobe"));
        assert_eq!(
            config.tools.vmaf_model,
            Some(PathBuf::from("/models/vmaf_v0.6.1.json"))
        );
        assert_eq!(config.quality_bounds, QualityBounds::new(20, 28));
        assert_eq!(config.quality_step, 2);
        assert_eq!(config.sync_window, Some(0.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_keeps_unset_defaults() {
        let config = CoreConfigBuilder::new().build();
        assert_eq!(config.sample_count, super::super::DEFAULT_SAMPLE_COUNT);
        assert_eq!(config.run_mode, RunMode::Search);
        assert!(config.final_output.is_none());
    }
}
