//! `validate` command implementation.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use contracts::{PipelineConfig, Stage, CLEAN_SAMPLE_ARTIFACT, MODEL_EXPORT_ARTIFACT};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    project: String,
    experiment: String,
    steps: String,
    active_stages: Vec<Stage>,
    store_root: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_with_overrides(&args.config, args.steps.as_deref()) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    project: config.main.project_name.clone(),
                    experiment: config.main.experiment_name.clone(),
                    steps: config.main.steps.to_string(),
                    active_stages: config.active_stages(),
                    store_root: config.storage.root.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
///
/// Mostly inputs the selected stages expect to exist in the store already.
fn collect_warnings(config: &PipelineConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let active = config.active_stages();

    let mut produced = BTreeSet::new();
    for stage in &active {
        for input in stage.inputs() {
            if !produced.contains(input) {
                warnings.push(format!(
                    "Stage '{stage}' reads '{input}' produced by a stage that is not selected; \
                     it must exist from a previous run"
                ));
            }
        }
        produced.extend(stage.outputs().iter().copied());
    }

    if active.contains(&Stage::DataCheck) {
        warnings.push(format!(
            "data_check compares against '{CLEAN_SAMPLE_ARTIFACT}:reference'; \
             promote a cleaned version with `rental-pipeline promote \
             {CLEAN_SAMPLE_ARTIFACT}:<version> --alias reference` before the first check"
        ));
    }

    if active.contains(&Stage::TestRegressionModel) {
        warnings.push(format!(
            "test_regression_model loads '{MODEL_EXPORT_ARTIFACT}:prod'; \
             promote a trained model with `--alias prod` first"
        ));
    }

    if !config.environments.is_empty() {
        let unused: Vec<_> = config
            .environments
            .keys()
            .filter(|stage| !active.contains(stage))
            .map(|stage| stage.as_str())
            .collect();
        if !unused.is_empty() {
            warnings.push(format!(
                "Environment overrides for inactive stages: {}",
                unused.join(", ")
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Project: {}", summary.project);
            println!("  Experiment: {}", summary.experiment);
            println!("  Steps: {}", summary.steps);
            let stages: Vec<_> = summary.active_stages.iter().map(|s| s.as_str()).collect();
            println!("  Active stages: {}", stages.join(" -> "));
            println!("  Store root: {}", summary.store_root);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
