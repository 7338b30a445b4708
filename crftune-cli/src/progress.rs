// ============================================================================
// crftune-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Spinner for trial encodes
//
// This module provides an event handler that shows an indicatif spinner
// while a trial is encoding and scoring, and prints one line per finished
// trial above it.
//
// KEY COMPONENTS:
// - SpinnerProgress: EventHandler driving a single spinner
// - trial_line: text of a finished trial
//
// AI-ASSISTANT-INFO: CLI-specific progress reporting utilities

// ---- External crate imports ----
use crftune_core::events::{Event, EventHandler};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::sync::Mutex;
use std::time::Duration;

/// Text printed for a finished trial.
pub fn trial_line(clip: &str, crf: u8, mode: &str, vmaf: f64, passed: bool, encode_secs: f64) -> String {
    format!(
        "{clip}  CRF {crf:>2} {mode:<7}  VMAF {vmaf:>7.3}  {}  ({encode_secs:.1}s)",
        if passed { "pass" } else { "fail" }
    )
}

/// Spinner shown during trials.
pub struct SpinnerProgress {
    bar: Mutex<Option<ProgressBar>>,
    use_color: bool,
}

impl SpinnerProgress {
    pub fn new(use_color: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            use_color,
        }
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

impl EventHandler for SpinnerProgress {
    fn handle(&self, event: &Event) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        match event {
            Event::TrialStarted { clip, crf, mode } => {
                let bar = guard.get_or_insert_with(Self::spinner);
                bar.set_message(format!("Encoding {clip} at CRF {crf} ({mode})"));
            }
            Event::TrialCompleted {
                clip,
                crf,
                mode,
                vmaf,
                passed,
                encode_time,
                ..
            } => {
                let line = trial_line(clip, *crf, mode.as_str(), *vmaf, *passed, encode_time.as_secs_f64());
                let line = match (self.use_color, *passed) {
                    (true, true) => line.green().to_string(),
                    (true, false) => line.yellow().to_string(),
                    (false, _) => line,
                };
                match guard.as_ref() {
                    Some(bar) => bar.println(format!("    {line}")),
                    None => eprintln!("    {line}"),
                }
            }
            Event::SearchFinished { .. } | Event::RunComplete { .. } => {
                if let Some(bar) = guard.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_line_marks_pass_and_fail() {
        let line = trial_line("movie.extract.s1.t12.00-45s", 27, "simple", 86.1234, true, 3.25);
        assert!(line.contains("CRF 27"));
        assert!(line.contains("VMAF  86.123"));
        assert!(line.contains("pass"));
        assert!(trial_line("clip", 30, "complex", 80.0, false, 1.0).contains("fail"));
    }

    #[test]
    fn spinner_is_dropped_when_search_finishes() {
        let progress = SpinnerProgress::new(false);
        progress.handle(&Event::TrialStarted {
            clip: "clip".to_string(),
            crf: 30,
            mode: crftune_core::EncodeMode::Simple,
        });
        assert!(progress.bar.lock().unwrap().is_some());
        progress.handle(&Event::SearchFinished {
            clip: "clip".to_string(),
            mode: crftune_core::EncodeMode::Simple,
            found_crf: Some(30),
            best_vmaf: Some(90.0),
            trials: 1,
        });
        assert!(progress.bar.lock().unwrap().is_none());
    }
}
