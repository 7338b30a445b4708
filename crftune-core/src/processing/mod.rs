//! Core CRF selection logic and orchestration.
//!
//! This module serves as the central hub of the crftune-core library. The
//! tool-independent pieces (sample selection, the search state machine, the
//! scene cache and the trial log) live in their own submodules and are tied
//! together by [`pipeline::process_video`].

/// Run orchestration for one source video
pub mod pipeline;

/// Scene-change sample selection and extract windows
pub mod samples;

/// Scene-score cache on disk
pub mod scene_cache;

/// Threshold-driven CRF search and sweep
pub mod search;

/// Semicolon-delimited trial log
pub mod trial_log;

/// Probed media properties
pub mod video_properties;

pub use pipeline::{RunSummary, SampleOutcome, SkippedSample, process_video, recommend_crf};
pub use samples::{ExtractWindow, SampleSelection, SceneScore, compute_window, select_samples};
pub use search::{
    EncodeTrial, EncodedArtifact, QualityReport, SearchOutcome, SearchParams, SearchResult, search,
    search_with_observer, sweep,
};
pub use video_properties::VideoProperties;
