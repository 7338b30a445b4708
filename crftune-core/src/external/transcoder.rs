//! ffmpeg-backed extraction and encoding.

use crate::config::EncodeMode;
use crate::error::{CoreResult, malformed_output_error};
use crate::external::ffmpeg::{ComplexParams, build_encode_command, build_extract_command};
use crate::external::process::describe_command;
use crate::external::{FfmpegSpawner, FileMetadataProvider, StdFsMetadataProvider, Transcoder};
use crate::processing::samples::ExtractWindow;
use crate::processing::search::EncodedArtifact;

use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::{Path, PathBuf};

/// Transcoder that shells out to ffmpeg through a spawner.
pub struct FfmpegTranscoder<S: FfmpegSpawner, M: FileMetadataProvider = StdFsMetadataProvider> {
    ffmpeg: PathBuf,
    spawner: S,
    metadata: M,
}

impl<S: FfmpegSpawner> FfmpegTranscoder<S> {
    pub fn new(ffmpeg: impl Into<PathBuf>, spawner: S) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            spawner,
            metadata: StdFsMetadataProvider,
        }
    }
}

impl<S: FfmpegSpawner, M: FileMetadataProvider> FfmpegTranscoder<S, M> {
    pub fn with_metadata<N: FileMetadataProvider>(self, metadata: N) -> FfmpegTranscoder<S, N> {
        FfmpegTranscoder {
            ffmpeg: self.ffmpeg,
            spawner: self.spawner,
            metadata,
        }
    }

    fn run_to_artifact(&self, mut cmd: FfmpegCommand, output: &Path, label: &str) -> CoreResult<EncodedArtifact> {
        let command = describe_command(cmd.as_inner());
        let result = self.spawner.run(cmd, label)?;
        if !output.exists() {
            return Err(malformed_output_error(
                command,
                format!("ffmpeg reported success but {} was not created", output.display()),
            ));
        }
        Ok(EncodedArtifact {
            path: output.to_path_buf(),
            size_bytes: self.metadata.get_size(output)?,
            elapsed: result.elapsed,
            command,
        })
    }
}

impl<S: FfmpegSpawner, M: FileMetadataProvider> Transcoder for FfmpegTranscoder<S, M> {
    fn extract(&self, input: &Path, window: &ExtractWindow, output: &Path) -> CoreResult<EncodedArtifact> {
        log::debug!(
            "Extracting {:.3}s..{:.3}s of {} to {}",
            window.start,
            window.end(),
            input.display(),
            output.display()
        );
        let cmd = build_extract_command(&self.ffmpeg, input, window, output);
        self.run_to_artifact(cmd, output, "extract")
    }

    fn encode(
        &self,
        input: &Path,
        output: &Path,
        crf: u8,
        mode: EncodeMode,
        complex: Option<&ComplexParams>,
    ) -> CoreResult<EncodedArtifact> {
        let cmd = build_encode_command(&self.ffmpeg, input, output, crf, mode, complex)?;
        self.run_to_artifact(cmd, output, &format!("encode crf {crf} {mode}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::external::mocks::{RecordingSpawner, ok_output};
    use tempfile::tempdir;

    struct FixedSize(u64);

    impl FileMetadataProvider for FixedSize {
        fn get_size(&self, _path: &Path) -> CoreResult<u64> {
            Ok(self.0)
        }
    }

    #[test]
    fn encode_reports_artifact() {
        let dir = tempdir().unwrap();
        let spawner = RecordingSpawner::new();
        let transcoder = FfmpegTranscoder::new("/usr/bin/ffmpeg", &spawner).with_metadata(FixedSize(4096));
        let output = dir.path().join("clip.crf28.simple.mp4");

        let artifact = transcoder
            .encode(Path::new("clip.mov"), &output, 28, EncodeMode::Simple, None)
            .unwrap();

        assert_eq!(artifact.path, output);
        assert_eq!(artifact.size_bytes, 4096);
        assert!(artifact.command.starts_with("/usr/bin/ffmpeg"));
        assert!(artifact.command.contains("-crf 28"));
        assert_eq!(spawner.calls().len(), 1);
    }

    #[test]
    fn extract_measures_real_file_size() {
        let dir = tempdir().unwrap();
        let spawner = RecordingSpawner::new();
        let transcoder = FfmpegTranscoder::new("ffmpeg", &spawner);
        let output = dir.path().join("movie_10.mov");
        let window = ExtractWindow { start: 10.0, duration: 5.0 };

        let artifact = transcoder.extract(Path::new("movie.mov"), &window, &output).unwrap();

        // the recording spawner writes a small placeholder file
        assert_eq!(artifact.size_bytes, std::fs::metadata(&output).unwrap().len());
        let args = &spawner.calls()[0];
        assert!(args.contains(&"copy".to_string()));
    }

    #[test]
    fn missing_output_is_tool_invocation() {
        let dir = tempdir().unwrap();
        let spawner = RecordingSpawner::new().on("-crf", |_: &[String]| Ok(ok_output("")));
        let transcoder = FfmpegTranscoder::new("ffmpeg", &spawner);
        let result = transcoder.encode(
            Path::new("clip.mov"),
            &dir.path().join("never.mp4"),
            30,
            EncodeMode::Simple,
            None,
        );
        assert!(matches!(result, Err(CoreError::ToolInvocation { .. })));
    }
}
