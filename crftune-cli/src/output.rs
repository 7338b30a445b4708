//! Terminal output for command results.
//!
//! Results go through `log::info!` so they land in both the console and the
//! log file, in the same hierarchical layout used for progress messages.

use crftune_core::config::EncodeMode;
use crftune_core::external::ComplexParams;
use crftune_core::processing::{RunSummary, SceneScore, SearchOutcome, VideoProperties};
use crftune_core::{format_bytes, format_duration};

use console::style;
use log::info;
use owo_colors::OwoColorize;

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a section header
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", title.to_uppercase().cyan().bold());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
}

/// Print a label/value line with the label padded to a fixed width
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label_width: usize = 18;
    let padding = label_width.saturating_sub(label.len()).max(1);

    if should_use_color() && highlight {
        info!("  {}:{} {}", label, " ".repeat(padding), style(value).bold());
    } else {
        info!("  {}:{} {}", label, " ".repeat(padding), value);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    if should_use_color() {
        info!("  ✓ {}", message.green());
    } else {
        info!("  ✓ {}", message);
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ⚠ {}", message.yellow());
    } else {
        info!("  ⚠ {}", message);
    }
}

/// Prints probed properties.
pub fn print_properties(props: &VideoProperties) {
    print_section("Video");
    print_status("Duration", &format_duration(props.duration_secs), false);
    print_status("Resolution", &format!("{}x{}", props.width, props.height), false);
    if let Some((num, den)) = props.sample_aspect_ratio {
        print_status("Sample aspect", &format!("{num}:{den}"), false);
    }
    if let Some(fps) = props.frame_rate {
        print_status("Frame rate", &format!("{fps:.3}"), false);
    }
    if let Some(codec) = &props.video_codec {
        print_status("Video codec", codec, false);
    }
    if let Some(rate) = props.sample_rate {
        print_status("Audio rate", &format!("{rate} Hz"), false);
    }
    if let Some(channels) = props.channels {
        print_status("Audio channels", &channels.to_string(), false);
    }
}

/// Prints the complex encode settings and argument list at `crf`.
pub fn print_complex_params(params: &ComplexParams, crf: u8) {
    print_section("Complex encode");
    print_status("Target size", &format!("{}x{}", params.width, params.height), true);
    print_status("Aspect", &format!("{:.4}", params.aspect()), false);
    if !params.omit_options.is_empty() {
        print_status("Omitted", &params.omit_options.join(" "), false);
    }
    print_status("Arguments", &params.args(crf).join(" "), false);
}

/// Prints the strongest `limit` scene changes.
pub fn print_scenes(scores: &[SceneScore], limit: Option<usize>) {
    print_section("Scene changes");
    print_status("Frames scored", &scores.len().to_string(), false);
    for score in scores.iter().take(limit.unwrap_or(scores.len())) {
        info!("    {:>10.3}s  {:.6}", score.timestamp, score.score);
    }
}

/// Prints the per-clip results and the recommendation.
pub fn print_run_summary(summary: &RunSummary, primary: EncodeMode) {
    print_section("Results");
    for sample in &summary.samples {
        info!(
            "  {} ({:.2}s..{:.2}s, {})",
            sample.clip,
            sample.window.start,
            sample.window.end(),
            format_bytes(sample.extract_size)
        );
        for result in &sample.results {
            let text = match &result.outcome {
                SearchOutcome::Found(trial) => format!(
                    "{}: CRF {} (VMAF {:.3}, {}) after {} trial(s)",
                    result.mode,
                    trial.quality_param,
                    trial.measured_quality,
                    format_bytes(trial.output_size_bytes),
                    result.trials.len()
                ),
                SearchOutcome::Exhausted { best } => format!(
                    "{}: threshold not reached in {} trial(s), best {}",
                    result.mode,
                    result.trials.len(),
                    best.as_ref().map_or_else(
                        || "n/a".to_string(),
                        |t| format!("CRF {} (VMAF {:.3})", t.quality_param, t.measured_quality)
                    )
                ),
            };
            info!("    {}", text);
        }
    }
    for skipped in &summary.skipped {
        print_warning(&format!(
            "Skipped {}s sample at {:.3}s: {}",
            skipped.duration, skipped.scene.timestamp, skipped.reason
        ));
    }

    print_section("Summary");
    print_status("Trials", &summary.trial_count.to_string(), false);
    print_status("Trial log", &summary.log_path.display().to_string(), false);
    if let Some(dir) = &summary.work_dir {
        print_status("Work directory", &dir.display().to_string(), false);
    }
    print_status("Elapsed", &format_duration(summary.elapsed.as_secs_f64()), false);
    match summary.recommended_crf {
        Some(crf) if summary.best_effort => {
            print_status(&format!("CRF ({primary})"), &crf.to_string(), true);
            print_warning("Below the threshold on at least one sample (best effort)");
        }
        Some(crf) => {
            print_status(&format!("CRF ({primary})"), &crf.to_string(), true);
            print_success("Every sample meets the threshold");
        }
        None => print_warning("No CRF in range meets the threshold on every sample"),
    }
    if let Some(encode) = &summary.final_encode {
        print_success(&format!(
            "Encoded {} ({})",
            encode.path.display(),
            format_bytes(encode.size_bytes)
        ));
    }
}
