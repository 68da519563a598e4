//! Command implementations.

mod plan;
mod promote;
mod run;
mod validate;

pub use plan::run_plan;
pub use promote::run_promote;
pub use run::run_pipeline;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::PipelineConfig;
use std::path::Path;

/// Load and validate a configuration, applying the `--steps` override
fn load_config(path: &Path, steps: Option<&str>) -> Result<PipelineConfig> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config_loader::ConfigLoader::load_with_overrides(path, steps)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
