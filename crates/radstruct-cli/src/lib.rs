//! Radstruct CLI library.
//!
//! This library provides the core functionality for the `radstruct`
//! command-line interface, including configuration loading, report file
//! ingestion, command execution and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
