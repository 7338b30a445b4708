// ============================================================================
// crftune-core/src/processing/samples.rs
// ============================================================================
//
// SCENE SAMPLES: Representative scene-change selection and extract windows
//
// This module picks a handful of scene-change candidates spread across the
// score distribution (strongest cut, weakest cut, and evenly spaced points in
// between) and turns each picked timestamp into an extract window that stays
// inside the source video.
//
// KEY COMPONENTS:
// - SceneScore: one scene-change candidate (timestamp + score)
// - select_samples: deterministic spread selection over sorted scores
// - ExtractWindow / compute_window: bounded clip around a timestamp
//
// AI-ASSISTANT-INFO: Scene sample selection and extract window computation

use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{CoreError, CoreResult};

/// A scene-change candidate produced by the scene detector.
///
/// Serialised with the `pts_time` key used by the scene cache files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneScore {
    /// Presentation time of the frame, in seconds
    #[serde(rename = "pts_time")]
    pub timestamp: f64,

    /// Scene-change likelihood, higher means a stronger cut
    pub score: f64,

    /// Frame index when the detector reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
}

impl SceneScore {
    pub fn new(timestamp: f64, score: f64) -> Self {
        Self {
            timestamp,
            score,
            frame: None,
        }
    }
}

/// Descending by score, ties broken by ascending timestamp.
fn by_score_desc(a: &SceneScore, b: &SceneScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.timestamp.total_cmp(&b.timestamp))
}

/// Sorts scores strongest cut first. Deterministic for equal scores.
pub fn sort_by_score(scores: &mut [SceneScore]) {
    scores.sort_by(by_score_desc);
}

/// Result of [`select_samples`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSelection {
    /// Picked candidates, strongest cut first. Always `requested` long unless
    /// the input was empty.
    pub samples: Vec<SceneScore>,

    /// Positions of the picked candidates in the score-sorted list
    pub positions: Vec<usize>,

    /// Number of samples asked for
    pub requested: usize,

    /// True when fewer distinct candidates than requested were available
    pub duplicates: bool,
}

impl SampleSelection {
    /// Picked candidates with repeated positions removed, order preserved.
    pub fn unique(&self) -> Vec<SceneScore> {
        let mut seen = Vec::with_capacity(self.positions.len());
        self.positions
            .iter()
            .zip(&self.samples)
            .filter_map(|(pos, sample)| {
                if seen.contains(pos) {
                    None
                } else {
                    seen.push(*pos);
                    Some(*sample)
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Index in a list of `len` sorted candidates for pick `i` of `count`.
fn spread_position(i: usize, count: usize, len: usize) -> usize {
    if count <= 1 || len <= 1 {
        return 0;
    }
    let last = (len - 1) as f64;
    let pos = (i as f64 * last / (count - 1) as f64).round() as usize;
    pos.min(len - 1)
}

/// Picks `count` representative candidates from `scores`.
///
/// The input order does not matter: a copy is sorted by score before picking.
/// Picks are spread evenly from the strongest cut to the weakest one, so
/// `count = 3` yields the best, median and worst candidates. When fewer than
/// `count` candidates exist, positions repeat and the selection is flagged.
pub fn select_samples(scores: &[SceneScore], count: usize) -> SampleSelection {
    let mut sorted = scores.to_vec();
    sort_by_score(&mut sorted);

    if sorted.is_empty() || count == 0 {
        if count > 0 {
            warn!("No scene-change candidates available; {count} sample(s) requested");
        }
        return SampleSelection {
            samples: Vec::new(),
            positions: Vec::new(),
            requested: count,
            duplicates: count > 0,
        };
    }

    let positions: Vec<usize> = (0..count)
        .map(|i| spread_position(i, count, sorted.len()))
        .collect();
    let samples = positions.iter().map(|&p| sorted[p]).collect();

    let duplicates = sorted.len() < count;
    if duplicates {
        warn!(
            "Only {} scene-change candidate(s) for {} requested sample(s); samples repeat",
            sorted.len(),
            count
        );
    }

    SampleSelection {
        samples,
        positions,
        requested: count,
        duplicates,
    }
}

/// A clip of the source video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractWindow {
    pub start: f64,
    pub duration: f64,
}

impl ExtractWindow {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Centers a window of `requested_duration` on `timestamp`, shifted so it
/// stays within `[0, video_duration]`.
///
/// Fails with [`CoreError::InvalidDuration`] when the window cannot fit.
pub fn compute_window(
    timestamp: f64,
    requested_duration: f64,
    video_duration: f64,
) -> CoreResult<ExtractWindow> {
    if !requested_duration.is_finite() || requested_duration <= 0.0 {
        return Err(CoreError::InvalidDuration {
            requested: requested_duration,
            available: video_duration,
        });
    }
    if !video_duration.is_finite() || requested_duration > video_duration {
        return Err(CoreError::InvalidDuration {
            requested: requested_duration,
            available: video_duration,
        });
    }
    if !timestamp.is_finite() {
        return Err(CoreError::Config(format!(
            "Scene timestamp must be finite, got {timestamp}"
        )));
    }

    let mut start = (timestamp - requested_duration / 2.0).max(0.0);
    if start + requested_duration > video_duration {
        start = video_duration - requested_duration;
        // The subtraction can round up, leaving the end one ulp past the video
        while start > 0.0 && start + requested_duration > video_duration {
            start = start.next_down();
        }
        start = start.max(0.0);
    }

    Ok(ExtractWindow {
        start,
        duration: requested_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(f64, f64)]) -> Vec<SceneScore> {
        values.iter().map(|&(t, s)| SceneScore::new(t, s)).collect()
    }

    #[test]
    fn window_near_start_clamps_to_zero() {
        let w = compute_window(5.0, 10.0, 100.0).unwrap();
        assert_eq!(w, ExtractWindow { start: 0.0, duration: 10.0 });
    }

    #[test]
    fn window_centered_on_timestamp() {
        let w = compute_window(50.0, 10.0, 100.0).unwrap();
        assert_eq!(w, ExtractWindow { start: 45.0, duration: 10.0 });
    }

    #[test]
    fn window_near_end_shifts_back() {
        let w = compute_window(98.0, 10.0, 100.0).unwrap();
        assert_eq!(w.start, 90.0);
        assert_eq!(w.end(), 100.0);
    }

    #[test]
    fn window_longer_than_video_fails() {
        let err = compute_window(5.0, 45.0, 40.0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidDuration { requested, available } if requested == 45.0 && available == 40.0
        ));
    }

    #[test]
    fn window_equal_to_video_covers_everything() {
        let w = compute_window(12.0, 40.0, 40.0).unwrap();
        assert_eq!(w, ExtractWindow { start: 0.0, duration: 40.0 });
    }

    #[test]
    fn window_stays_in_bounds_over_a_grid() {
        let video = 37.5;
        for ts in (0..=80).map(|i| i as f64 * 0.5) {
            for duration in [0.5, 1.0, 10.0, 20.0, 37.5] {
                let w = compute_window(ts, duration, video).unwrap();
                assert!(w.start >= 0.0, "start {} for ts {ts} dur {duration}", w.start);
                assert!(w.end() <= video, "end {} for ts {ts} dur {duration}", w.end());
            }
        }
    }

    #[test]
    fn window_clamped_to_end_never_overshoots_after_rounding() {
        let video = 172.198;
        let w = compute_window(172.198, 40.057, video).unwrap();
        assert_eq!(w.duration, 40.057);
        assert!(w.end() <= video, "end {} > video {video}", w.end());
        assert!(video - w.end() < 1e-9);
    }

    #[test]
    fn non_positive_duration_fails() {
        assert!(compute_window(5.0, 0.0, 40.0).is_err());
        assert!(compute_window(5.0, -3.0, 40.0).is_err());
    }

    #[test]
    fn select_three_yields_best_median_worst() {
        let input = scores(&[
            (1.0, 0.1),
            (2.0, 0.9),
            (3.0, 0.5),
            (4.0, 0.3),
            (5.0, 0.7),
        ]);
        let sel = select_samples(&input, 3);
        let picked: Vec<f64> = sel.samples.iter().map(|s| s.score).collect();
        assert_eq!(picked, vec![0.9, 0.5, 0.1]);
        assert!(!sel.duplicates);
    }

    #[test]
    fn selection_ignores_input_order() {
        let mut input = scores(&[(1.0, 0.2), (2.0, 0.8), (3.0, 0.4), (4.0, 0.6)]);
        let a = select_samples(&input, 2);
        input.reverse();
        let b = select_samples(&input, 2);
        assert_eq!(a, b);
        assert_eq!(a.samples[0].score, 0.8);
        assert_eq!(a.samples[1].score, 0.2);
    }

    #[test]
    fn selection_is_idempotent() {
        let input = scores(&[(0.5, 0.3), (1.5, 0.3), (2.5, 0.9), (3.5, 0.0)]);
        assert_eq!(select_samples(&input, 3), select_samples(&input, 3));
    }

    #[test]
    fn too_few_candidates_are_flagged_not_fatal() {
        let input = scores(&[(1.0, 0.4), (2.0, 0.6)]);
        let sel = select_samples(&input, 3);
        assert_eq!(sel.samples.len(), 3);
        assert!(sel.duplicates);
        assert_eq!(sel.unique().len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_flagged_selection() {
        let sel = select_samples(&[], 3);
        assert!(sel.is_empty());
        assert!(sel.duplicates);
    }

    #[test]
    fn single_sample_is_strongest_cut() {
        let input = scores(&[(1.0, 0.2), (7.0, 0.95), (3.0, 0.4)]);
        let sel = select_samples(&input, 1);
        assert_eq!(sel.samples, vec![SceneScore::new(7.0, 0.95)]);
    }

    #[test]
    fn equal_scores_tie_break_on_timestamp() {
        let input = scores(&[(9.0, 0.5), (3.0, 0.5), (6.0, 0.5)]);
        let sel = select_samples(&input, 3);
        let times: Vec<f64> = sel.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![3.0, 6.0, 9.0]);
    }

    #[test]
    fn scene_score_uses_pts_time_key() {
        let json = r#"{"frame": 12, "pts": 6144, "pts_time": 0.48, "score": 0.31}"#;
        let score: SceneScore = serde_json::from_str(json).unwrap();
        assert_eq!(score.timestamp, 0.48);
        assert_eq!(score.frame, Some(12));
        let back = serde_json::to_string(&SceneScore::new(1.0, 0.5)).unwrap();
        assert_eq!(back, r#"{"pts_time":1.0,"score":0.5}"#);
    }
}
