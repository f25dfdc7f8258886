// vidmark-cli/src/commands/mod.rs
//
// Subcommand implementations.

pub mod annotate;
