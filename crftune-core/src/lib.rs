//! Core library for choosing an x264 CRF from a VMAF quality threshold.
//!
//! This crate samples scene changes of a source video, cuts short clips
//! around them, encodes each clip at decreasing CRF values and scores every
//! encode with libvmaf through ffmpeg. The coarsest CRF that keeps every clip
//! at or above the threshold is recommended.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use crftune_core::config::CoreConfigBuilder;
//! use crftune_core::events::EventDispatcher;
//! use crftune_core::external::FfmpegToolset;
//! use crftune_core::process_video;
//! use std::path::Path;
//!
//! let config = CoreConfigBuilder::new()
//!     .output_dir("/tmp/crftune")
//!     .quality_bounds(23, 30)
//!     .vmaf_threshold(85.0)
//!     .build();
//! config.validate().unwrap();
//!
//! FfmpegToolset::verify(&config.tools).unwrap();
//! let tools = FfmpegToolset::new(&config.tools, config.tool_timeout);
//! let events = EventDispatcher::new();
//!
//! let summary = process_video(&config, Path::new("movie.mov"), &tools, &events).unwrap();
//! println!("Recommended CRF: {:?}", summary.recommended_crf);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod external;
pub mod processing;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder, EncodeMode, RunMode, ToolPaths};
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventDispatcher, EventHandler};
pub use external::{FfmpegToolset, Toolset};
pub use processing::{RunSummary, process_video};
pub use temp_files::{create_temp_dir, create_temp_file};
pub use utils::{format_bytes, format_duration};
