//! # basic-cleaning
//!
//! Stage entry point: drops price outliers and out-of-area listings from the
//! input artifact and publishes the result.
//!
//! Exits with status 0 on success and non-zero on any error.

use std::path::PathBuf;

use anyhow::{Context, Result};
use artifact_store::{LocalArtifactStore, LocalRunRegistry};
use basic_cleaning::{BasicCleaningStage, CleaningArgs};
use clap::Parser;
use contracts::{ArtifactRef, TrackingSettings};
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;

/// This step cleans the data
#[derive(Parser, Debug)]
#[command(name = "basic-cleaning", version, about = "This step cleans the data")]
struct Args {
    /// Fully-qualified name for the input artifact, i.e. the raw dataset
    #[arg(long = "input_artifact")]
    input_artifact: ArtifactRef,

    /// Name for the output cleaned artifact
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// Type for the artifact
    #[arg(long = "output_type")]
    output_type: String,

    /// Description for the artifact
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price to consider for the analysis
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price to consider for the analysis
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: f64,

    /// Tracking project
    #[arg(long, env = "PIPELINE_PROJECT")]
    project: String,

    /// Run group inside the project
    #[arg(long = "run_group", env = "PIPELINE_RUN_GROUP")]
    run_group: String,

    /// Root directory of the artifact store
    #[arg(long = "store_root", env = "PIPELINE_STORE_ROOT", default_value = "artifacts")]
    store_root: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact", env = "PIPELINE_LOG_FORMAT")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    observability::init_with_config(ObservabilityConfig::from_verbosity(
        args.verbose,
        args.quiet,
        args.log_format,
    ))?;

    let settings = TrackingSettings::new(&args.project, &args.run_group, &args.store_root);
    let stage = BasicCleaningStage::new(
        LocalArtifactStore::new(&settings),
        LocalRunRegistry::new(&settings),
    );

    let cleaning = CleaningArgs {
        input_artifact: args.input_artifact,
        output_artifact: args.output_artifact,
        output_type: args.output_type,
        output_description: args.output_description,
        min_price: args.min_price,
        max_price: args.max_price,
    };

    let result = stage
        .run(&cleaning)
        .with_context(|| format!("basic cleaning of {} failed", cleaning.input_artifact));

    match result {
        Ok(published) => {
            info!(
                artifact = %published.reference(),
                "Finished basic cleaning - cleaned dataset uploaded"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Basic cleaning failed");
            Err(e)
        }
    }
}
