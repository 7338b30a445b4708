//! FFmpeg command builder utilities
//!
//! This module provides a builder for the ffmpeg invocations shared by every
//! adapter (binary path, banner, stdin handling, overwrite) and a small
//! builder for `-vf` filter chains.

use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;

/// Builder for creating `FFmpeg` commands with common configurations
pub struct FfmpegCommandBuilder {
    cmd: FfmpegCommand,
    hide_banner: bool,
    no_stdin: bool,
    overwrite: bool,
}

impl FfmpegCommandBuilder {
    /// Creates a builder for the ffmpeg binary at `ffmpeg_path`
    #[must_use]
    pub fn new(ffmpeg_path: &Path) -> Self {
        Self {
            cmd: FfmpegCommand::new_with_path(ffmpeg_path),
            hide_banner: true,
            no_stdin: true,
            overwrite: true,
        }
    }

    /// Sets whether to hide the `FFmpeg` banner
    #[must_use]
    pub fn with_hide_banner(mut self, hide: bool) -> Self {
        self.hide_banner = hide;
        self
    }

    /// Sets whether existing outputs are overwritten (`-y`)
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Builds the `FFmpeg` command with all configured options
    #[must_use]
    pub fn build(mut self) -> FfmpegCommand {
        if self.hide_banner {
            self.cmd.hide_banner();
        }
        if self.no_stdin {
            self.cmd.arg("-nostdin");
        }
        if self.overwrite {
            self.cmd.overwrite();
        }
        self.cmd
    }
}

/// Builder for constructing video filter chains
#[derive(Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scale filter to the chain
    #[must_use]
    pub fn add_scale(mut self, width: u32, height: u32) -> Self {
        if width > 0 && height > 0 {
            self.filters.push(format!("scale={width}x{height}"));
        }
        self
    }

    /// Forces square pixels on the output
    #[must_use]
    pub fn add_square_pixels(mut self) -> Self {
        self.filters.push("setsar=1/1".to_string());
        self
    }

    /// Adds a custom filter to the chain
    #[must_use]
    pub fn add_filter(mut self, filter: String) -> Self {
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Builds the filter chain into a single filter string
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}
