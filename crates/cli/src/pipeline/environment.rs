//! Execution environments of the stages
//!
//! Each stage runs in its own process with an explicitly declared environment.
//! Defaults come from here; `[environments.<stage>]` overrides them field by field.

use std::collections::BTreeMap;
use std::path::PathBuf;

use contracts::{ContractError, EnvironmentDescriptor, PipelineConfig, Stage, TrackingSettings};

/// Variables copied from the driver's environment unless overridden
pub const DEFAULT_INHERITED_ENV: [&str; 3] = ["PATH", "HOME", "RUST_LOG"];

/// Default executable of a stage
pub fn default_program(stage: Stage) -> &'static str {
    match stage {
        Stage::Download => "get-data",
        Stage::BasicCleaning => "basic-cleaning",
        Stage::DataCheck => "data-check",
        Stage::DataSplit => "train-val-test-split",
        Stage::Train => "train-random-forest",
        Stage::TestRegressionModel => "test-regression-model",
    }
}

/// Directory under `components_repository` holding a shared component
///
/// Stages without one run in the driver's working directory.
pub fn component_dir(stage: Stage) -> Option<&'static str> {
    match stage {
        Stage::Download => Some("get_data"),
        Stage::DataSplit => Some("train_val_test_split"),
        Stage::TestRegressionModel => Some("test_regression_model"),
        Stage::BasicCleaning | Stage::DataCheck | Stage::Train => None,
    }
}

/// Tracking settings every stage of this configuration reports to
///
/// A relative `storage.root` is resolved against the driver's working directory:
/// stages run from different directories and must all reach the same store.
pub fn tracking_settings(config: &PipelineConfig) -> Result<TrackingSettings, ContractError> {
    let root = &config.storage.root;
    let store_root = if root.is_absolute() {
        root.clone()
    } else {
        std::env::current_dir()?.join(root)
    };

    Ok(TrackingSettings::new(
        &config.main.project_name,
        &config.main.experiment_name,
        store_root,
    ))
}

/// Resolve the environment of `stage`
pub fn resolve_environment(
    stage: Stage,
    config: &PipelineConfig,
    tracking: &TrackingSettings,
) -> EnvironmentDescriptor {
    let mut env: BTreeMap<String, String> = tracking.to_env().into_iter().collect();

    let default_dir = component_dir(stage)
        .map(|dir| PathBuf::from(&config.main.components_repository).join(dir));

    let mut descriptor = EnvironmentDescriptor {
        stage,
        program: default_program(stage).to_string(),
        args: Vec::new(),
        working_dir: default_dir,
        env: BTreeMap::new(),
        inherit_env: DEFAULT_INHERITED_ENV.iter().map(|s| s.to_string()).collect(),
    };

    if let Some(spec) = config.environments.get(&stage) {
        if let Some(program) = &spec.program {
            descriptor.program = program.clone();
        }
        if let Some(args) = &spec.args {
            descriptor.args = args.clone();
        }
        if let Some(dir) = &spec.working_dir {
            descriptor.working_dir = Some(dir.clone());
        }
        if let Some(inherit) = &spec.inherit_env {
            descriptor.inherit_env = inherit.clone();
        }
        env.extend(spec.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    descriptor.env = env;
    descriptor
}
