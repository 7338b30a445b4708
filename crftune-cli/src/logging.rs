// ============================================================================
// crftune-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and file logging through fern
//
// The core library only talks to the `log` facade. This module installs the
// backend: a console sink on stderr with coloured level tags and a plain file
// sink under the log directory.
//
// KEY COMPONENTS:
// - get_timestamp: timestamp used in log file names
// - log_file_path: `<log_dir>/crftune_<command>_<timestamp>.log`
// - init_logging: installs the fern dispatcher
//
// AI-ASSISTANT-INFO: Logging initialization and helper functions

use crate::error::{CliErrorContext, CliResult};

use console::Term;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("crftune_search_{}.log", crftune_cli::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the log file for one invocation of `command`.
pub fn log_file_path(log_dir: &Path, command: &str) -> PathBuf {
    log_dir.join(format!("crftune_{}_{}.log", command, get_timestamp()))
}

fn colored_level(level: Level) -> String {
    match level {
        Level::Error => "ERROR".red().bold().to_string(),
        Level::Warn => "WARN".yellow().bold().to_string(),
        Level::Info => "INFO".green().to_string(),
        Level::Debug => "DEBUG".blue().to_string(),
        Level::Trace => "TRACE".dimmed().to_string(),
    }
}

/// Installs console and file logging. Returns the log file path.
///
/// Console colours are used only when stderr is a terminal and `NO_COLOR`
/// is unset.
pub fn init_logging(log_dir: &Path, command: &str, verbose: bool) -> CliResult<PathBuf> {
    fs::create_dir_all(log_dir)
        .cli_with_context(|| format!("Failed to create log directory '{}'", log_dir.display()))?;
    let log_path = log_file_path(log_dir, command);

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let use_color = Term::stderr().features().colors_supported()
        && Term::stderr().is_term()
        && std::env::var_os("NO_COLOR").is_none();

    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            if use_color {
                out.finish(format_args!("[{}] {}", colored_level(record.level()), message))
            } else {
                out.finish(format_args!("[{}] {}", record.level(), message))
            }
        })
        .chain(std::io::stderr());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(
            fern::log_file(&log_path)
                .cli_with_context(|| format!("Failed to open log file '{}'", log_path.display()))?,
        );

    fern::Dispatch::new()
        .level(level)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| crftune_core::CoreError::OperationFailed(format!("Failed to initialize logging: {e}")))?;

    Ok(log_path)
}
