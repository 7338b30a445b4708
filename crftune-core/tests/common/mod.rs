// crftune-core/tests/common/mod.rs
//
// Stub collaborators shared by the pipeline tests. Nothing here launches a
// process: extracts and encodes are small files written by the stubs, VMAF
// scores come from a function of the CRF.

#![allow(dead_code)]

use crftune_core::config::EncodeMode;
use crftune_core::error::{CoreError, CoreResult};
use crftune_core::events::{Event, EventHandler};
use crftune_core::external::{
    ComplexParams, Prober, QualityScorer, SceneDetector, SyncSearch, Toolset, Transcoder,
};
use crftune_core::processing::{
    EncodedArtifact, ExtractWindow, QualityReport, SceneScore, VideoProperties,
};

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(b"dummy content").expect("Failed to write dummy content");
    file_path
}

/// CRF encoded in a trial file name (`<clip>.crfN.<mode>.mp4`).
pub fn crf_of(path: &Path) -> u8 {
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let start = name.rfind(".crf").expect("trial file name carries a CRF") + 4;
    name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap()
}

pub struct StubDetector {
    pub scores: Vec<SceneScore>,
    pub calls: Cell<usize>,
}

impl SceneDetector for StubDetector {
    fn detect(&self, _video: &Path, _threshold: f64) -> CoreResult<Vec<SceneScore>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.scores.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub crf: u8,
    pub mode: EncodeMode,
    pub complex: bool,
}

pub struct StubTranscoder {
    pub extracts: RefCell<Vec<(PathBuf, ExtractWindow)>>,
    pub encodes: RefCell<Vec<EncodeCall>>,
    /// Encoding at this CRF fails
    pub fail_at: Option<u8>,
}

impl Transcoder for StubTranscoder {
    fn extract(
        &self,
        _input: &Path,
        window: &ExtractWindow,
        output: &Path,
    ) -> CoreResult<EncodedArtifact> {
        fs::write(output, vec![0u8; 1000])?;
        self.extracts
            .borrow_mut()
            .push((output.to_path_buf(), *window));
        Ok(EncodedArtifact {
            path: output.to_path_buf(),
            size_bytes: 1000,
            elapsed: Duration::from_millis(1),
            command: format!("ffmpeg -ss {} -t {} -c copy", window.start, window.duration),
        })
    }

    fn encode(
        &self,
        input: &Path,
        output: &Path,
        crf: u8,
        mode: EncodeMode,
        complex: Option<&ComplexParams>,
    ) -> CoreResult<EncodedArtifact> {
        self.encodes.borrow_mut().push(EncodeCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            crf,
            mode,
            complex: complex.is_some(),
        });
        if self.fail_at == Some(crf) {
            return Err(CoreError::ToolInvocation {
                command: format!("ffmpeg -crf {crf}"),
                status: "exit status: 1".to_string(),
                output: "Conversion failed!".to_string(),
            });
        }
        let size = u64::from(crf) * 10;
        fs::write(output, vec![0u8; size as usize])?;
        Ok(EncodedArtifact {
            path: output.to_path_buf(),
            size_bytes: size,
            elapsed: Duration::from_millis(2),
            command: format!("ffmpeg -i {} -crf {crf} {}", input.display(), output.display()),
        })
    }
}

pub struct StubScorer {
    /// VMAF harmonic mean for a CRF
    pub vmaf: Box<dyn Fn(u8) -> f64>,
    pub calls: Cell<usize>,
    pub synced: Cell<bool>,
}

impl QualityScorer for StubScorer {
    fn score(
        &self,
        _reference: &Path,
        candidate: &Path,
        log_path: &Path,
        sync: Option<&SyncSearch>,
    ) -> CoreResult<QualityReport> {
        self.calls.set(self.calls.get() + 1);
        if sync.is_some() {
            self.synced.set(true);
        }
        assert_eq!(log_path.extension().unwrap(), "json");
        let score = (self.vmaf)(crf_of(candidate));
        Ok(QualityReport {
            mean: Some(score + 0.5),
            ..QualityReport::from_harmonic_mean(score)
        })
    }
}

pub struct StubProber {
    pub props: VideoProperties,
}

impl Prober for StubProber {
    fn probe(&self, _video: &Path) -> CoreResult<VideoProperties> {
        Ok(self.props.clone())
    }
}

pub struct StubTools {
    pub detector: StubDetector,
    pub transcoder: StubTranscoder,
    pub scorer: StubScorer,
    pub prober: StubProber,
}

impl StubTools {
    /// Six scene changes in a 120 s video; VMAF drops by 2 per CRF from 95 at CRF 23.
    pub fn new() -> Self {
        Self::with_vmaf(|crf| 95.0 - 2.0 * (f64::from(crf) - 23.0))
    }

    pub fn with_vmaf(vmaf: impl Fn(u8) -> f64 + 'static) -> Self {
        Self {
            detector: StubDetector {
                scores: vec![
                    SceneScore::new(10.0, 0.15),
                    SceneScore::new(25.0, 0.90),
                    SceneScore::new(40.0, 0.40),
                    SceneScore::new(60.0, 0.55),
                    SceneScore::new(80.0, 0.05),
                    SceneScore::new(100.0, 0.70),
                ],
                calls: Cell::new(0),
            },
            transcoder: StubTranscoder {
                extracts: RefCell::new(Vec::new()),
                encodes: RefCell::new(Vec::new()),
                fail_at: None,
            },
            scorer: StubScorer {
                vmaf: Box::new(vmaf),
                calls: Cell::new(0),
                synced: Cell::new(false),
            },
            prober: StubProber {
                props: VideoProperties {
                    duration_secs: 120.0,
                    width: 1920,
                    height: 1080,
                    frame_rate: Some(25.0),
                    sample_rate: Some(48000),
                    channels: Some(2),
                    ..VideoProperties::default()
                },
            },
        }
    }
}

impl Toolset for StubTools {
    fn detector(&self) -> &dyn SceneDetector {
        &self.detector
    }

    fn transcoder(&self) -> &dyn Transcoder {
        &self.transcoder
    }

    fn scorer(&self) -> &dyn QualityScorer {
        &self.scorer
    }

    fn prober(&self) -> &dyn Prober {
        &self.prober
    }
}

/// Keeps every event emitted during a run.
#[derive(Default)]
pub struct EventCollector {
    pub events: Mutex<Vec<Event>>,
}

impl EventCollector {
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventHandler for EventCollector {
    fn handle(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
