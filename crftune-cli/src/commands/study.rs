//! Implementation of the `study` subcommand.

use crate::cli::{StudyArgs, ToolArgs};
use crate::commands::search::run_tuning;
use crate::config::study_config;
use crate::error::CliResult;

use crftune_core::RunSummary;

/// Executes `crftune study`: every CRF in range is encoded and scored for
/// every sample and mode, with `--omit-option` flags dropped from the
/// complex encode.
pub fn run_study(tools: &ToolArgs, args: StudyArgs) -> CliResult<RunSummary> {
    let config = study_config(tools, &args);
    run_tuning(config, &args.tune)
}
