// ============================================================================
// crftune-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides the seam between command construction and process
// execution. Adapters build an `FfmpegCommand` and hand it to a spawner,
// which runs it to completion. Tests substitute a spawner that records the
// arguments instead of launching ffmpeg.
//
// KEY COMPONENTS:
// - FfmpegSpawner: Trait for running ffmpeg commands to completion
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
//
// AI-ASSISTANT-INFO: FFmpeg process management and execution abstraction

use crate::error::{CoreResult, command_start_error};
use crate::external::process::{ToolOutput, describe_command, wait_with_timeout};
use ffmpeg_sidecar::command::FfmpegCommand;
use std::time::{Duration, Instant};

/// Trait representing something that can run an ffmpeg command.
pub trait FfmpegSpawner {
    /// Runs `cmd` until it exits. `label` names the step in logs.
    fn run(&self, cmd: FfmpegCommand, label: &str) -> CoreResult<ToolOutput>;
}

impl<S: FfmpegSpawner + ?Sized> FfmpegSpawner for &S {
    fn run(&self, cmd: FfmpegCommand, label: &str) -> CoreResult<ToolOutput> {
        (**self).run(cmd, label)
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner {
    timeout: Option<Duration>,
}

impl SidecarSpawner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl FfmpegSpawner for SidecarSpawner {
    fn run(&self, mut cmd: FfmpegCommand, label: &str) -> CoreResult<ToolOutput> {
        let command_line = describe_command(cmd.as_inner());
        log::debug!("Running ffmpeg ({label}): {command_line}");

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error(command_line.clone(), e))?;

        let mut output = wait_with_timeout(child.as_inner_mut(), &command_line, self.timeout)?;
        output.elapsed = start.elapsed();
        log::debug!(
            "ffmpeg ({label}) finished in {:.2}s",
            output.elapsed.as_secs_f64()
        );
        Ok(output)
    }
}
