// vidmark-cli/src/main.rs
//
// Entry point for the Vidmark video annotation tool.
//
// Responsibilities include:
// - Parsing user-provided arguments (definitions live in `cli.rs`).
// - Setting up logging to both console and a run log file.
// - Dispatching to the subcommand implementation.
// - Reporting errors and managing process exit codes.

use clap::Parser;
use std::process;

use vidmark_cli::config::{DEFAULT_LOG_SUBDIR, EXIT_FAILURE};
use vidmark_cli::logging::init_logging;
use vidmark_cli::{Cli, Commands, run_annotate};
use vidmark_core::{CoreError, terminal};

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Annotate(args) => {
            let log_dir = args
                .log_dir
                .clone()
                .unwrap_or_else(|| args.output_dir.join(DEFAULT_LOG_SUBDIR));

            match init_logging(args.verbose, Some(&log_dir)) {
                Ok(Some(path)) => log::debug!("Writing run log to {}", path.display()),
                Ok(None) => {}
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(EXIT_FAILURE);
                }
            }

            match run_annotate(args) {
                Ok(code) => code,
                Err(e) => {
                    report_error(&e);
                    EXIT_FAILURE
                }
            }
        }
    };

    process::exit(code);
}

fn report_error(error: &CoreError) {
    let suggestion = match error {
        CoreError::DependencyNotFound(_) => Some("Install ffmpeg and make sure it is on PATH"),
        CoreError::ModelLoad { .. } => {
            Some("Check the model path, or pass --face-model / --license-model / --detectors")
        }
        CoreError::SourceNotFound(_) => Some("Check the --video path"),
        _ => None,
    };
    terminal::print_error("Annotation failed", &error.to_string(), suggestion);
}
