// ============================================================================
// vidmark-cli/src/logging.rs
// ============================================================================
//
// LOGGING: Console and Run-Log Setup
//
// Installs the `fern` dispatcher used by the Vidmark CLI. Console output is
// message-only (the core's terminal helpers format their own lines) with
// warnings and errors colored by level; the run log file gets a timestamp,
// level and target on every line. Console lines are written with the frame
// progress bar suspended so they never tear it.
//
// USAGE:
// - default: info and above
// - --verbose: debug and above
// - RUST_LOG=<level>: overrides both

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};
use vidmark_core::terminal;

// ---- External crate imports ----
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("vidmark_run_{}.log", vidmark_cli::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Returns the log file path for a run started now.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("vidmark_run_{}.log", get_timestamp()))
}

/// Picks the level filter from `RUST_LOG` or the verbose flag.
pub fn level_filter(verbose: bool) -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(if verbose { LevelFilter::Debug } else { LevelFilter::Info })
}

/// Sets up console logging and, when `log_dir` is given, a run log file.
///
/// Returns the path of the run log file, if one was created.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let level = level_filter(verbose);
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::White)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);

    let console = fern::Dispatch::new()
        .format(move |out, message, record| match record.level() {
            log::Level::Info => out.finish(format_args!("{message}")),
            level => out.finish(format_args!(
                "{}: {}",
                colors.color(level).to_string().to_lowercase(),
                message
            )),
        })
        .chain(fern::Output::call(|record| {
            terminal::suspend_progress(|| eprintln!("{}", record.args()));
        }));

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("ort", LevelFilter::Warn)
        .chain(console);

    let mut log_path = None;
    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)
            .cli_with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
        let path = run_log_path(dir);
        let file = fern::log_file(&path)
            .cli_with_context(|| format!("Failed to open log file '{}'", path.display()))?;

        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} [{}] {}: {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
        log_path = Some(path);
    }

    dispatch.apply().map_err(|e| {
        vidmark_core::CoreError::OperationFailed(format!("Failed to initialize logging: {e}"))
    })?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'_');
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_run_log_path_naming() {
        let path = run_log_path(Path::new("assets-json/logs"));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("vidmark_run_"));
        assert!(name.ends_with(".log"));
        assert!(path.starts_with("assets-json/logs"));
    }
}
