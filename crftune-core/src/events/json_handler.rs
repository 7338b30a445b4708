//! JSON progress handler for structured progress output
//!
//! This module provides a JSON-based event handler that writes one JSON
//! object per line for consumption by scripts wrapping crftune.

use super::{Event, EventHandler};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that outputs progress events as structured JSON to stdout
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonProgressHandler {
    /// Create a new JSON progress handler that writes to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON progress handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Write a JSON progress event to the output
    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &Event) {
        let timestamp = Self::get_timestamp();

        let value = match event {
            Event::RunStarted {
                input,
                output_dir,
                run_mode,
                video_duration,
                modes,
                threshold,
            } => json!({
                "type": "run_started",
                "input": input,
                "output_dir": output_dir,
                "run_mode": run_mode,
                "video_duration": video_duration,
                "modes": modes,
                "threshold": threshold,
                "timestamp": timestamp
            }),

            Event::ScenesLoaded {
                count,
                source,
                cache_path,
            } => json!({
                "type": "scenes_loaded",
                "count": count,
                "source": source,
                "cache_path": cache_path,
                "timestamp": timestamp
            }),

            Event::SamplesSelected { samples, duplicates } => json!({
                "type": "samples_selected",
                "samples": samples,
                "duplicates": duplicates,
                "timestamp": timestamp
            }),

            Event::SampleSkipped {
                timestamp: sample_time,
                duration,
                reason,
            } => json!({
                "type": "sample_skipped",
                "sample_time": sample_time,
                "duration": duration,
                "reason": reason,
                "timestamp": timestamp
            }),

            Event::ExtractCreated {
                path,
                window,
                size_bytes,
            } => json!({
                "type": "extract_created",
                "path": path,
                "start": window.start,
                "duration": window.duration,
                "size_bytes": size_bytes,
                "timestamp": timestamp
            }),

            // Spinners only; nothing worth a JSON line
            Event::TrialStarted { .. } => return,

            Event::TrialCompleted {
                clip,
                crf,
                mode,
                vmaf,
                passed,
                size_bytes,
                encode_time,
                score_time,
            } => json!({
                "type": "trial_completed",
                "clip": clip,
                "crf": crf,
                "mode": mode,
                "vmaf": vmaf,
                "passed": passed,
                "size_bytes": size_bytes,
                "encode_seconds": encode_time.as_secs_f64(),
                "score_seconds": score_time.as_secs_f64(),
                "timestamp": timestamp
            }),

            Event::SearchFinished {
                clip,
                mode,
                found_crf,
                best_vmaf,
                trials,
            } => json!({
                "type": "search_finished",
                "clip": clip,
                "mode": mode,
                "found_crf": found_crf,
                "best_vmaf": best_vmaf,
                "trials": trials,
                "timestamp": timestamp
            }),

            Event::FinalEncodeComplete {
                output,
                crf,
                mode,
                size_bytes,
                elapsed,
            } => json!({
                "type": "final_encode_complete",
                "output": output,
                "crf": crf,
                "mode": mode,
                "size_bytes": size_bytes,
                "duration_seconds": elapsed.as_secs_f64(),
                "timestamp": timestamp
            }),

            Event::RunComplete {
                recommended_crf,
                trials,
                log_path,
                elapsed,
            } => json!({
                "type": "run_complete",
                "recommended_crf": recommended_crf,
                "trials": trials,
                "log_path": log_path,
                "duration_seconds": elapsed.as_secs_f64(),
                "timestamp": timestamp
            }),

            Event::Warning { message } => json!({
                "type": "warning",
                "message": message,
                "timestamp": timestamp
            }),
        };
        self.write_json(value);
    }
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
