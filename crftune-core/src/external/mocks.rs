// crftune-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

use super::FfmpegSpawner;
use crate::error::CoreResult;
use crate::external::process::ToolOutput;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::cell::RefCell;
use std::fs;
use std::process::ExitStatus;
use std::time::Duration;

type Hook = Box<dyn Fn(&[String]) -> CoreResult<ToolOutput>>;

/// Successful output with the given stderr text.
pub(crate) fn ok_output(stderr: &str) -> ToolOutput {
    ToolOutput {
        status: ExitStatus::default(),
        stdout: String::new(),
        stderr: stderr.to_string(),
        elapsed: Duration::from_millis(1),
    }
}

/// Spawner that records every command instead of running ffmpeg.
///
/// Commands matching a registered pattern are answered by that hook. Any
/// other command succeeds and gets a placeholder file written to its output
/// path (the last argument, unless it is `-`).
#[derive(Default)]
pub(crate) struct RecordingSpawner {
    calls: RefCell<Vec<Vec<String>>>,
    hooks: Vec<(String, Hook)>,
}

impl RecordingSpawner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers commands whose joined arguments contain `pattern`.
    pub(crate) fn on<F>(mut self, pattern: &str, hook: F) -> Self
    where
        F: Fn(&[String]) -> CoreResult<ToolOutput> + 'static,
    {
        self.hooks.push((pattern.to_string(), Box::new(hook)));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl FfmpegSpawner for RecordingSpawner {
    fn run(&self, mut cmd: FfmpegCommand, _label: &str) -> CoreResult<ToolOutput> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.borrow_mut().push(args.clone());

        let joined = args.join(" ");
        if let Some((_, hook)) = self.hooks.iter().find(|(p, _)| joined.contains(p.as_str())) {
            return hook(&args);
        }

        if let Some(last) = args.last().filter(|a| a.as_str() != "-") {
            fs::write(last, b"placeholder")?;
        }
        Ok(ok_output(""))
    }
}
