//! `promote` command implementation.

use anyhow::{Context, Result};
use artifact_store::LocalArtifactStore;
use contracts::ArtifactStore;
use tracing::info;

use super::load_config;
use crate::cli::PromoteArgs;
use crate::pipeline::tracking_settings;

/// Execute the `promote` command
pub fn run_promote(args: &PromoteArgs) -> Result<()> {
    let config = load_config(&args.config, None)?;
    let store = LocalArtifactStore::new(&tracking_settings(&config)?);

    let metadata = store
        .add_alias(&args.artifact, &args.alias)
        .with_context(|| format!("Failed to promote {} to '{}'", args.artifact, args.alias))?;

    info!(
        artifact = %metadata.reference(),
        alias = %args.alias,
        "Alias updated"
    );
    println!(
        "✓ {}:{} -> v{}",
        metadata.name, args.alias, metadata.version
    );

    Ok(())
}
