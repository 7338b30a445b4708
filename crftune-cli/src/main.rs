// crftune-cli/src/main.rs
//
// Entry point of the `crftune` binary.
//
// Responsibilities include:
// - Parsing user-provided arguments.
// - Setting up logging to both console and file.
// - Dispatching to the subcommand implementations.
// - Mapping failures to process exit codes.

use clap::Parser;
use crftune_cli::config::{DEFAULT_OUTPUT_DIR, log_dir};
use crftune_cli::error::{CliResult, exit_code};
use crftune_cli::logging::init_logging;
use crftune_cli::{Cli, Commands, run_info, run_scenes, run_search, run_study};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let cli = Cli::parse();

    let output_dir = match &cli.command {
        Commands::Search(args) => args.tune.output_dir.clone(),
        Commands::Study(args) => args.tune.output_dir.clone(),
        Commands::Scenes(args) => args.output_dir.clone(),
        Commands::Info(_) => PathBuf::from(DEFAULT_OUTPUT_DIR),
    };
    let logs = log_dir(cli.log_dir.as_deref(), Path::new(&output_dir));

    match init_logging(&logs, cli.command.name(), cli.verbose) {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let Cli { command, tools, .. } = cli;
    match command {
        Commands::Search(args) => run_search(&tools, args).map(|_| ()),
        Commands::Study(args) => run_study(&tools, args).map(|_| ()),
        Commands::Scenes(args) => run_scenes(&tools, args).map(|_| ()),
        Commands::Info(args) => run_info(&tools, args).map(|_| ()),
    }
}
