// crftune-core/tests/search_properties_tests.rs

use crftune_core::config::{EncodeMode, QualityBounds};
use crftune_core::error::CoreError;
use crftune_core::processing::{
    EncodedArtifact, QualityReport, SceneScore, SearchOutcome, SearchParams, compute_window,
    search, select_samples, sweep,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn artifact(crf: u8) -> EncodedArtifact {
    EncodedArtifact {
        path: PathBuf::from(format!("clip.crf{crf}.simple.mp4")),
        size_bytes: u64::from(crf) * 100,
        elapsed: Duration::from_millis(5),
        command: String::new(),
    }
}

/// VMAF for a CRF parsed back out of the artifact name.
fn vmaf_from(artifact: &EncodedArtifact, vmaf: impl Fn(u8) -> f64) -> QualityReport {
    let name = artifact.path.file_name().unwrap().to_string_lossy().to_string();
    let crf: u8 = name
        .trim_start_matches("clip.crf")
        .trim_end_matches(".simple.mp4")
        .parse()
        .unwrap();
    QualityReport::from_harmonic_mean(vmaf(crf))
}

#[test]
fn test_window_always_fits_inside_video() {
    let video_duration = 120.0;
    for duration in [1.0, 10.0, 45.0, 119.5, 120.0] {
        for tenths in 0..=1200 {
            let timestamp = f64::from(tenths) / 10.0;
            let window = compute_window(timestamp, duration, video_duration).unwrap();
            assert!(window.start >= 0.0, "start < 0 for t={timestamp} d={duration}");
            assert!(
                window.end() <= video_duration,
                "end past video for t={timestamp} d={duration}"
            );
            assert_eq!(window.duration, duration);
        }
    }
}

#[test]
fn test_window_end_exact_for_awkward_decimals() {
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };
    for _ in 0..20_000 {
        let video_duration = (1.0 + next() * 499.0 * 1000.0).round() / 1000.0;
        let duration = ((next() * video_duration * 1000.0).round() / 1000.0).max(0.001);
        let timestamp = next() * video_duration;
        let window = compute_window(timestamp, duration, video_duration).unwrap();
        assert!(window.start >= 0.0);
        assert!(
            window.end() <= video_duration,
            "end {} past video {video_duration} (t={timestamp}, d={duration})",
            window.end()
        );
    }
    let window = compute_window(172.198, 40.057, 172.198).unwrap();
    assert!(window.end() <= 172.198);
}

#[test]
fn test_window_centered_when_room_on_both_sides() {
    let window = compute_window(60.0, 20.0, 120.0).unwrap();
    assert_eq!(window.start, 50.0);
    assert_eq!(window.end(), 70.0);
}

#[test]
fn test_window_longer_than_video_is_invalid() {
    match compute_window(10.0, 121.0, 120.0) {
        Err(CoreError::InvalidDuration {
            requested,
            available,
        }) => {
            assert_eq!(requested, 121.0);
            assert_eq!(available, 120.0);
        }
        other => panic!("expected InvalidDuration, got {other:?}"),
    }
}

#[test]
fn test_window_reference_cases() {
    assert!(compute_window(5.0, 45.0, 40.0).is_err());
    let w = compute_window(5.0, 10.0, 100.0).unwrap();
    assert_eq!((w.start, w.duration), (0.0, 10.0));
    let w = compute_window(50.0, 10.0, 100.0).unwrap();
    assert_eq!((w.start, w.duration), (45.0, 10.0));
}

#[test]
fn test_search_found_where_score_first_reaches_threshold() {
    let params = SearchParams::new(QualityBounds::new(23, 30), 1, 85.0);
    let result = search(
        Path::new("clip.mov"),
        &params,
        EncodeMode::Simple,
        |_, crf| Ok(artifact(crf)),
        |_, a| Ok(vmaf_from(a, |crf| if crf <= 27 { 90.0 } else { 80.0 })),
    )
    .unwrap();

    match result.outcome {
        SearchOutcome::Found(trial) => {
            assert_eq!(trial.quality_param, 27);
            assert_eq!(trial.measured_quality, 90.0);
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[test]
fn test_search_stops_at_first_passing_crf() {
    let params = SearchParams::new(QualityBounds::new(23, 30), 1, 85.0);
    // 30 -> 79, 29 -> 81, ... 27 -> 85
    let vmaf = |crf: u8| 139.0 - 2.0 * f64::from(crf);

    let result = search(
        Path::new("clip.mov"),
        &params,
        EncodeMode::Simple,
        |_, crf| Ok(artifact(crf)),
        |_, a| Ok(vmaf_from(a, vmaf)),
    )
    .unwrap();

    assert_eq!(result.found_quality(), Some(27));
    let crfs: Vec<u8> = result.trials.iter().map(|t| t.quality_param).collect();
    assert_eq!(crfs, vec![30, 29, 28, 27]);
    assert!(result.trials.iter().rev().skip(1).all(|t| t.measured_quality < 85.0));
}

#[test]
fn test_exhausted_search_runs_every_rung() {
    for (min, max, step) in [(23u8, 30u8, 1u8), (18, 30, 4), (20, 20, 1), (0, 51, 5)] {
        let params = SearchParams::new(QualityBounds::new(min, max), step, 99.0);
        let result = search(
            Path::new("clip.mov"),
            &params,
            EncodeMode::Complex,
            |_, crf| Ok(artifact(crf)),
            |_, _| Ok(QualityReport::from_harmonic_mean(50.0)),
        )
        .unwrap();

        let expected = usize::from((max - min) / step) + 1;
        assert_eq!(result.trials.len(), expected, "bounds {min}..{max} step {step}");
        assert_eq!(params.max_trials(), expected);
        assert!(matches!(result.outcome, SearchOutcome::Exhausted { best: Some(_) }));
    }
}

#[test]
fn test_encoder_error_propagates() {
    let params = SearchParams::new(QualityBounds::new(23, 30), 1, 85.0);
    let err = search(
        Path::new("clip.mov"),
        &params,
        EncodeMode::Simple,
        |_, crf| {
            if crf == 29 {
                Err(CoreError::ToolInvocation {
                    command: "ffmpeg".to_string(),
                    status: "exit status: 1".to_string(),
                    output: String::new(),
                })
            } else {
                Ok(artifact(crf))
            }
        },
        |_, _| Ok(QualityReport::from_harmonic_mean(10.0)),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::ToolInvocation { .. }));
}

#[test]
fn test_sweep_keeps_going_past_the_threshold() {
    let params = SearchParams::new(QualityBounds::new(23, 30), 1, 85.0);
    let vmaf = |crf: u8| 139.0 - 2.0 * f64::from(crf);
    let mut observed = Vec::new();

    let result = sweep(
        Path::new("clip.mov"),
        &params,
        EncodeMode::Simple,
        |_, crf| Ok(artifact(crf)),
        |_, a| Ok(vmaf_from(a, vmaf)),
        |trial| {
            observed.push(trial.quality_param);
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(observed, vec![30, 29, 28, 27, 26, 25, 24, 23]);
    assert_eq!(result.trials.len(), 8);
    assert_eq!(result.found_quality(), Some(27));
}

#[test]
fn test_selection_ignores_input_order() {
    let scores = vec![
        SceneScore::new(10.0, 0.15),
        SceneScore::new(25.0, 0.90),
        SceneScore::new(40.0, 0.40),
        SceneScore::new(60.0, 0.55),
        SceneScore::new(80.0, 0.05),
    ];
    let mut reversed = scores.clone();
    reversed.reverse();

    let a = select_samples(&scores, 3);
    let b = select_samples(&reversed, 3);
    assert_eq!(a.samples, b.samples);
    assert_eq!(select_samples(&a.samples, 3).samples, a.samples);

    let timestamps: Vec<f64> = a.samples.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![25.0, 40.0, 80.0]);
}
