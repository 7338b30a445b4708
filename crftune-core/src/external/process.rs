// ============================================================================
// crftune-core/src/external/process.rs
// ============================================================================
//
// PROCESS EXECUTION: Running external tools with an optional timeout
//
// Every ffmpeg and ffprobe invocation ends up here. The child's stdout and
// stderr are drained on helper threads so a chatty tool cannot block on a
// full pipe, while the calling thread waits for the exit status. When a
// timeout is configured the child is polled and killed once the deadline
// passes.
//
// KEY COMPONENTS:
// - ToolOutput: captured streams, status and wall time of a finished tool
// - run_command: spawn + wait for a std Command
// - wait_with_timeout: wait for an already spawned child
//
// AI-ASSISTANT-INFO: External process execution with timeout and output capture

use crate::error::{
    CoreResult, command_failed_error, command_start_error, command_wait_error, tool_timeout_error,
};
use log::{debug, error};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between two exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Output of an external tool that exited successfully.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Renders a command as a shell-like line for logs and error messages.
pub fn describe_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|arg| {
        let arg = arg.to_string_lossy();
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            format!("'{arg}'")
        } else {
            arg.into_owned()
        }
    }));
    parts.join(" ")
}

/// Spawns `cmd` with piped output and waits for it.
///
/// Non-zero exits become [`crate::CoreError::ToolInvocation`], a missing
/// binary becomes [`crate::CoreError::CommandStart`] and an expired timeout
/// becomes [`crate::CoreError::ToolTimeout`].
pub fn run_command(cmd: &mut Command, timeout: Option<Duration>) -> CoreResult<ToolOutput> {
    let command_line = describe_command(cmd);
    debug!("Running: {command_line}");

    let start = Instant::now();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            error!("Failed to start '{command_line}': {e}");
            command_start_error(command_line.clone(), e)
        })?;

    let mut output = wait_with_timeout(&mut child, &command_line, timeout)?;
    output.elapsed = start.elapsed();
    Ok(output)
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> Option<JoinHandle<String>> {
    reader.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Waits for a spawned child, killing it when `timeout` expires.
///
/// The child's stdout and stderr must be piped (or null). Whatever the child
/// wrote to stderr is attached to the returned error on failure.
pub fn wait_with_timeout(
    child: &mut Child,
    command_line: &str,
    timeout: Option<Duration>,
) -> CoreResult<ToolOutput> {
    let start = Instant::now();
    drop(child.stdin.take());
    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let status = match timeout {
        None => child
            .wait()
            .map_err(|e| command_wait_error(command_line, e))?,
        Some(limit) => loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if start.elapsed() >= limit => {
                    error!(
                        "Killing '{command_line}' after {:.1}s timeout",
                        limit.as_secs_f64()
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = collect(stdout_handle);
                    let stderr = collect(stderr_handle);
                    return Err(tool_timeout_error(command_line, limit, stderr));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(command_wait_error(command_line, e)),
            }
        },
    };

    let stdout = collect(stdout_handle);
    let stderr = collect(stderr_handle);

    if !status.success() {
        error!("'{command_line}' failed with {status}");
        return Err(command_failed_error(command_line, status, &stderr));
    }

    Ok(ToolOutput {
        status,
        stdout,
        stderr,
        elapsed: start.elapsed(),
    })
}
