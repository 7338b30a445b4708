//! Persistent scene-score cache.
//!
//! Scene detection decodes the whole source, so its result is stored next to
//! the trial log as `<stem>-scenescore.json` and reused by later runs.

use crate::error::{CoreError, CoreResult};
use crate::external::SceneDetector;
use crate::processing::samples::{SceneScore, sort_by_score};
use crate::utils::file_stem;

use log::info;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Where scene scores came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneSource {
    Cache,
    Detected,
}

/// `<output_dir>/<stem>-scenescore.json`
pub fn scene_cache_path(output_dir: &Path, input: &Path) -> CoreResult<PathBuf> {
    Ok(output_dir.join(format!("{}-scenescore.json", file_stem(input)?)))
}

/// Reads a cache file, `None` when it does not exist.
pub fn read_scene_cache(path: &Path) -> CoreResult<Option<Vec<SceneScore>>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let mut scores: Vec<SceneScore> = serde_json::from_str(&text).map_err(|e| {
        CoreError::OperationFailed(format!(
            "Scene cache {} is corrupt ({e}); delete it to recompute",
            path.display()
        ))
    })?;
    sort_by_score(&mut scores);
    Ok(Some(scores))
}

/// Writes scores sorted strongest first as an indented JSON array.
pub fn write_scene_cache(path: &Path, scores: &[SceneScore]) -> CoreResult<()> {
    let mut sorted = scores.to_vec();
    sort_by_score(&mut sorted);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    sorted.serialize(&mut ser)?;
    fs::write(path, buf)?;
    Ok(())
}

/// Returns cached scores when `cache_path` exists, otherwise runs the
/// detector and writes the cache.
pub fn load_or_detect(
    detector: &dyn SceneDetector,
    input: &Path,
    threshold: f64,
    cache_path: &Path,
) -> CoreResult<(Vec<SceneScore>, SceneSource)> {
    if let Some(scores) = read_scene_cache(cache_path)? {
        info!("Reading scene scores from {}", cache_path.display());
        return Ok((scores, SceneSource::Cache));
    }

    let scores = detector.detect(input, threshold)?;
    info!("Writing scene scores to {}", cache_path.display());
    write_scene_cache(cache_path, &scores)?;
    let mut scores = scores;
    sort_by_score(&mut scores);
    Ok((scores, SceneSource::Detected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    struct CountingDetector {
        calls: Cell<usize>,
    }

    impl SceneDetector for CountingDetector {
        fn detect(&self, _video: &Path, _threshold: f64) -> CoreResult<Vec<SceneScore>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![SceneScore::new(1.0, 0.2), SceneScore::new(2.0, 0.9)])
        }
    }

    #[test]
    fn cache_path_uses_input_stem() {
        let path = scene_cache_path(Path::new("/out"), Path::new("/videos/My Movie.mov")).unwrap();
        assert_eq!(path, PathBuf::from("/out/My Movie-scenescore.json"));
    }

    #[test]
    fn second_load_reads_the_cache() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("movie-scenescore.json");
        let detector = CountingDetector { calls: Cell::new(0) };

        let (first, source) = load_or_detect(&detector, Path::new("movie.mov"), 0.0, &cache).unwrap();
        assert_eq!(source, SceneSource::Detected);
        let (second, source) = load_or_detect(&detector, Path::new("movie.mov"), 0.0, &cache).unwrap();
        assert_eq!(source, SceneSource::Cache);

        assert_eq!(detector.calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].score, 0.9);
    }

    #[test]
    fn cache_file_is_sorted_json_with_pts_time() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("nested/clip-scenescore.json");
        write_scene_cache(&cache, &[SceneScore::new(3.0, 0.1), SceneScore::new(4.0, 0.7)]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(value[0]["pts_time"], 4.0);
        assert_eq!(value[1]["score"], 0.1);
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("bad-scenescore.json");
        fs::write(&cache, "[{").unwrap();
        assert!(read_scene_cache(&cache).is_err());
    }
}
