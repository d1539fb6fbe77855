//! Command-line interface for dag-forge.
//!
//! Provides commands for payload validation, artifact rendering, and
//! project save/load.

mod commands;

pub use commands::{parse_cli, read_payload, run_with_cli, Cli, Commands};
