// crftune-cli/src/lib.rs
//
// Library portion of the crftune CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, InfoArgs, ScenesArgs, SearchArgs, StudyArgs, ToolArgs, TuneArgs};
pub use commands::{run_info, run_scenes, run_search, run_study};
