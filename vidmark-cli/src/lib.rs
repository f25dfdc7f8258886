// vidmark-cli/src/lib.rs
//
// Library portion of the Vidmark CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{AnnotateArgs, Cli, Commands};
pub use commands::annotate::run_annotate;
