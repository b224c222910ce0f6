//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Radstruct CLI - Turn free-text radiology reports into structured JSON.
#[derive(Debug, Parser)]
#[command(name = "radstruct")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RADSTRUCT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Structure a batch of report files against a template
    Run(RunArgs),

    /// Print the schema compiled from a template
    Schema(SchemaArgs),

    /// Print the prompt sent for one report
    Prompt(PromptArgs),

    /// Show which AI provider and model are configured
    Provider,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Template JSON file
    #[arg(short, long)]
    pub template: PathBuf,

    /// Batch name
    #[arg(short, long)]
    pub name: String,

    /// Report files (JSON arrays of report texts)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Template JSON file
    #[arg(short, long)]
    pub template: PathBuf,
}

/// Arguments for the prompt command.
#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// Template JSON file
    #[arg(short, long)]
    pub template: PathBuf,

    /// Report text
    #[arg(long)]
    pub text: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
