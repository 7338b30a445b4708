//! Implementation of the `search` subcommand.
//!
//! Shared with `study`: verifies the tools, wires the event handlers and
//! runs the core pipeline on one input.

use crate::cli::{SearchArgs, ToolArgs, TuneArgs};
use crate::config::search_config;
use crate::error::{CliErrorContext, CliResult};
use crate::output::print_run_summary;
use crate::progress::SpinnerProgress;

use crftune_core::events::json_handler::JsonProgressHandler;
use crftune_core::events::log_handler::LogEventHandler;
use crftune_core::{CoreConfig, EventDispatcher, FfmpegToolset, RunSummary, process_video};

use console::Term;
use log::{debug, info};
use std::io::Write;
use std::sync::Arc;

/// Runs the pipeline described by `config` on `args.input`.
pub(crate) fn run_tuning(config: CoreConfig, args: &TuneArgs) -> CliResult<RunSummary> {
    config.validate()?;
    FfmpegToolset::verify(&config.tools)?;
    debug!("Configuration: {config:?}");

    let tools = FfmpegToolset::new(&config.tools, config.tool_timeout);
    let mut events = EventDispatcher::new();
    if args.json {
        events.add_handler(Arc::new(JsonProgressHandler::new()));
    } else {
        events.add_handler(Arc::new(LogEventHandler));
        let stderr = Term::stderr();
        if stderr.is_term() {
            events.add_handler(Arc::new(SpinnerProgress::new(stderr.features().colors_supported())));
        }
    }

    info!("Processing {}", args.input.display());
    let summary = process_video(&config, &args.input, &tools, &events)?;

    if args.json {
        let json = serde_json::to_string(&serde_json::json!({
            "type": "summary",
            "summary": summary,
        }))?;
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{json}").cli_context("Writing summary")?;
    } else {
        print_run_summary(&summary, config.primary_mode());
    }
    Ok(summary)
}

/// Executes `crftune search`.
pub fn run_search(tools: &ToolArgs, args: SearchArgs) -> CliResult<RunSummary> {
    let config = search_config(tools, &args);
    run_tuning(config, &args.tune)
}
