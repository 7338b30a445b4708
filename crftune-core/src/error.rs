// ============================================================================
// crftune-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the crftune core library
//
// This module defines the single error enum used across crftune-core and the
// helper constructors that build the external-tool variants in one place.
//
// KEY COMPONENTS:
// - CoreError: every failure the library can surface
// - CoreResult: result alias used by all fallible functions
// - command_*_error helpers: uniform construction of tool failures
//
// AI-ASSISTANT-INFO: Error types and helpers for crftune-core

use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the crftune core library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested extract window does not fit in the source video.
    #[error(
        "Invalid extract duration: requested {requested:.3}s but the video only lasts {available:.3}s"
    )]
    InvalidDuration { requested: f64, available: f64 },

    /// An external tool exited unsuccessfully or produced unusable output.
    #[error("External tool failed ({status}): {command}\n{output}")]
    ToolInvocation {
        command: String,
        status: String,
        output: String,
    },

    /// An external tool did not finish within the configured timeout.
    #[error("External tool timed out after {}s: {command}\n{output}", timeout.as_secs_f64())]
    ToolTimeout {
        command: String,
        timeout: Duration,
        output: String,
    },

    #[error("Failed to start command '{command}': {source}")]
    CommandStart {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed while waiting for command '{command}': {source}")]
    CommandWait {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse ffprobe output: {0}")]
    ProbeParse(String),

    #[error("Failed to parse VMAF output: {0}")]
    VmafParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result alias used throughout crftune-core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Number of trailing output lines kept in tool failure messages.
const OUTPUT_TAIL_LINES: usize = 20;

/// Builds a [`CoreError::CommandStart`] for a command that could not be spawned.
pub fn command_start_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandStart {
        command: command.into(),
        source,
    }
}

/// Builds a [`CoreError::CommandWait`] for a command whose exit could not be collected.
pub fn command_wait_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandWait {
        command: command.into(),
        source,
    }
}

/// Builds a [`CoreError::ToolInvocation`] for a non-zero exit, keeping only
/// the tail of the captured output.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    output: impl AsRef<str>,
) -> CoreError {
    CoreError::ToolInvocation {
        command: command.into(),
        status: status.to_string(),
        output: output_tail(output.as_ref()),
    }
}

/// Builds a [`CoreError::ToolInvocation`] for output that could not be parsed.
pub fn malformed_output_error(command: impl Into<String>, reason: impl AsRef<str>) -> CoreError {
    CoreError::ToolInvocation {
        command: command.into(),
        status: "malformed output".to_string(),
        output: output_tail(reason.as_ref()),
    }
}

/// Builds a [`CoreError::ToolTimeout`].
pub fn tool_timeout_error(
    command: impl Into<String>,
    timeout: Duration,
    output: impl AsRef<str>,
) -> CoreError {
    CoreError::ToolTimeout {
        command: command.into(),
        timeout,
        output: output_tail(output.as_ref()),
    }
}

/// Keeps the last [`OUTPUT_TAIL_LINES`] lines of a tool's output.
pub(crate) fn output_tail(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    lines[start..].join("\n")
}
