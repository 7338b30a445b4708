//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `info`: probe a video and print the derived encode settings
pub mod info;

/// `scenes`: compute or read scene-change scores
pub mod scenes;

/// `search`: stop at the first CRF meeting the threshold
pub mod search;

/// `study`: score every CRF in range
pub mod study;

pub use info::run_info;
pub use scenes::run_scenes;
pub use search::run_search;
pub use study::run_study;
