use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EncodeMode, RunMode};
use crate::processing::scene_cache::SceneSource;
use crate::processing::samples::{ExtractWindow, SceneScore};

pub mod json_handler;
pub mod log_handler;

#[derive(Debug, Clone)]
pub enum Event {
    // Run lifecycle
    RunStarted {
        input: PathBuf,
        output_dir: PathBuf,
        run_mode: RunMode,
        video_duration: f64,
        modes: Vec<EncodeMode>,
        threshold: f64,
    },

    // Scene sampling
    ScenesLoaded {
        count: usize,
        source: SceneSource,
        cache_path: PathBuf,
    },
    SamplesSelected {
        samples: Vec<SceneScore>,
        duplicates: bool,
    },
    SampleSkipped {
        timestamp: f64,
        duration: f64,
        reason: String,
    },
    ExtractCreated {
        path: PathBuf,
        window: ExtractWindow,
        size_bytes: u64,
    },

    // Trials
    TrialStarted {
        clip: String,
        crf: u8,
        mode: EncodeMode,
    },
    TrialCompleted {
        clip: String,
        crf: u8,
        mode: EncodeMode,
        vmaf: f64,
        passed: bool,
        size_bytes: u64,
        encode_time: Duration,
        score_time: Duration,
    },
    SearchFinished {
        clip: String,
        mode: EncodeMode,
        found_crf: Option<u8>,
        best_vmaf: Option<f64>,
        trials: usize,
    },

    // Completion
    FinalEncodeComplete {
        output: PathBuf,
        crf: u8,
        mode: EncodeMode,
        size_bytes: u64,
        elapsed: Duration,
    },
    RunComplete {
        recommended_crf: Option<u8>,
        trials: usize,
        log_path: PathBuf,
        elapsed: Duration,
    },

    Warning {
        message: String,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
