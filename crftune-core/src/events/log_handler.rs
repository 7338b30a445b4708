//! Event handler that forwards events to the `log` facade.

use super::{Event, EventHandler};
use crate::utils::{format_bytes, format_duration};
use log::{info, warn};

/// Writes a human-readable line per event through `log`.
#[derive(Debug, Default)]
pub struct LogEventHandler;

impl EventHandler for LogEventHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::RunStarted {
                input,
                run_mode,
                video_duration,
                modes,
                threshold,
                ..
            } => {
                let modes: Vec<&str> = modes.iter().map(|m| m.as_str()).collect();
                info!(
                    "{:?} run on {} ({}), modes [{}], VMAF target {threshold}",
                    run_mode,
                    input.display(),
                    format_duration(*video_duration),
                    modes.join(", ")
                );
            }
            Event::ScenesLoaded {
                count,
                source,
                cache_path,
            } => info!(
                "{count} scene scores ({source:?}) in {}",
                cache_path.display()
            ),
            Event::SamplesSelected { samples, duplicates } => {
                for sample in samples {
                    info!(
                        "Sample at {:.3}s (scene score {:.4})",
                        sample.timestamp, sample.score
                    );
                }
                if *duplicates {
                    warn!("Fewer scene candidates than requested samples");
                }
            }
            Event::SampleSkipped {
                timestamp,
                duration,
                reason,
            } => warn!("Skipping {duration}s sample at {timestamp:.3}s: {reason}"),
            Event::ExtractCreated {
                path,
                window,
                size_bytes,
            } => info!(
                "Extracted {:.3}s..{:.3}s to {} ({})",
                window.start,
                window.end(),
                path.display(),
                format_bytes(*size_bytes)
            ),
            Event::TrialStarted { .. } => {}
            Event::TrialCompleted { .. } => {}
            Event::SearchFinished {
                clip,
                mode,
                found_crf,
                best_vmaf,
                trials,
            } => match found_crf {
                Some(crf) => info!("{clip} ({mode}): CRF {crf} after {trials} trial(s)"),
                None => warn!(
                    "{clip} ({mode}): threshold not reached in {trials} trial(s), best VMAF {}",
                    best_vmaf.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
                ),
            },
            Event::FinalEncodeComplete {
                output,
                crf,
                mode,
                size_bytes,
                elapsed,
            } => info!(
                "Encoded {} at CRF {crf} ({mode}): {} in {}",
                output.display(),
                format_bytes(*size_bytes),
                format_duration(elapsed.as_secs_f64())
            ),
            Event::RunComplete {
                recommended_crf,
                trials,
                log_path,
                elapsed,
            } => {
                match recommended_crf {
                    Some(crf) => info!("Recommended CRF: {crf}"),
                    None => warn!("No CRF met the threshold on every sample"),
                }
                info!(
                    "{trials} trial(s) in {}, log: {}",
                    format_duration(elapsed.as_secs_f64()),
                    log_path.display()
                );
            }
            Event::Warning { message } => warn!("{message}"),
        }
    }
}
