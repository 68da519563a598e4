//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use contracts::ArtifactRef;
use observability::LogFormat;
use std::path::PathBuf;

/// Rental price pipeline - runs the selected stages in dependency order
#[derive(Parser, Debug)]
#[command(
    name = "rental-pipeline",
    author,
    version,
    about = "Short-term rental price prediction pipeline",
    long_about = "Runs the stages of the rental price pipeline (download, basic_cleaning, \n\
                  data_check, data_split, train, test_regression_model) in canonical order.\n\n\
                  Each stage runs as its own process; stages exchange data only through \n\
                  the versioned artifact store."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PIPELINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PIPELINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Show the stages a run would execute and how
    Plan(PlanArgs),

    /// Attach an alias (e.g. `reference`, `prod`) to an artifact version
    Promote(PromoteArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "PIPELINE_CONFIG")]
    pub config: PathBuf,

    /// Override `main.steps` ("all" or comma-separated stage names)
    #[arg(long)]
    pub steps: Option<String>,

    /// Validate configuration, print the plan and exit without running stages
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PIPELINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "PIPELINE_CONFIG")]
    pub config: PathBuf,

    /// Override `main.steps` before validating
    #[arg(long)]
    pub steps: Option<String>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `plan` command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "PIPELINE_CONFIG")]
    pub config: PathBuf,

    /// Override `main.steps`
    #[arg(long)]
    pub steps: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `promote` command
#[derive(Parser, Debug)]
pub struct PromoteArgs {
    /// Artifact version to promote, e.g. `clean_sample.csv:v3` or `clean_sample.csv:latest`
    pub artifact: ArtifactRef,

    /// Alias to attach
    #[arg(long)]
    pub alias: String,

    /// Configuration file naming the project and store root
    #[arg(short, long, default_value = "config.toml", env = "PIPELINE_CONFIG")]
    pub config: PathBuf,
}
