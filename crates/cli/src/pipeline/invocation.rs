//! Stage invocations - the parameters each stage is started with
//!
//! Artifact names here are contractual: each stage's input is the output of an
//! earlier stage in canonical order.

use std::fs;
use std::path::Path;

use contracts::{
    ContractError, DataCheckConfig, EtlConfig, ModelingConfig, PipelineConfig, Stage,
    StageInvocation, CLEAN_SAMPLE_ARTIFACT, MODEL_EXPORT_ARTIFACT, RAW_SAMPLE_ARTIFACT,
    TEST_ARTIFACT, TRAINVAL_ARTIFACT,
};

/// File name of the serialized random forest configuration
pub const RF_CONFIG_FILE: &str = "rf_config.json";

/// Build the invocation of `stage`
///
/// `rf_config` is where the training hyperparameters are (or will be) written.
///
/// # Errors
/// Configuration error when a section the stage reads is missing
pub fn build_invocation(
    stage: Stage,
    config: &PipelineConfig,
    rf_config: &Path,
) -> Result<StageInvocation, ContractError> {
    let invocation = StageInvocation::new(stage);

    let invocation = match stage {
        Stage::Download => {
            let etl = etl(config, stage)?;
            invocation
                .param("sample", &etl.sample)
                .param("artifact_name", RAW_SAMPLE_ARTIFACT)
                .param("artifact_type", "raw_data")
                .param("artifact_description", "Raw file as downloaded")
        }
        Stage::BasicCleaning => {
            let etl = etl(config, stage)?;
            invocation
                .param("input_artifact", format!("{RAW_SAMPLE_ARTIFACT}:latest"))
                .param("output_artifact", CLEAN_SAMPLE_ARTIFACT)
                .param("output_type", "clean_sample")
                .param(
                    "output_description",
                    "Data with outliers and null values removed",
                )
                .param("min_price", etl.min_price)
                .param("max_price", etl.max_price)
        }
        Stage::DataCheck => {
            let etl = etl(config, stage)?;
            let data_check = data_check(config, stage)?;
            invocation
                .param("csv", format!("{CLEAN_SAMPLE_ARTIFACT}:latest"))
                .param("ref", format!("{CLEAN_SAMPLE_ARTIFACT}:reference"))
                .param("kl_threshold", data_check.kl_threshold)
                .param("min_price", etl.min_price)
                .param("max_price", etl.max_price)
        }
        Stage::DataSplit => {
            let modeling = modeling(config, stage)?;
            invocation
                .param("input", format!("{CLEAN_SAMPLE_ARTIFACT}:latest"))
                .param("test_size", modeling.test_size)
                .param("random_seed", modeling.random_seed)
                .param("stratify_by", &modeling.stratify_by)
        }
        Stage::Train => {
            let modeling = modeling(config, stage)?;
            invocation
                .param("trainval_artifact", format!("{TRAINVAL_ARTIFACT}:latest"))
                .param("val_size", modeling.val_size)
                .param("random_seed", modeling.random_seed)
                .param("stratify_by", &modeling.stratify_by)
                .param("rf_config", rf_config.display())
                .param("max_tfidf_features", modeling.max_tfidf_features)
                .param("output_artifact", MODEL_EXPORT_ARTIFACT)
        }
        Stage::TestRegressionModel => invocation
            .param("mlflow_model", format!("{MODEL_EXPORT_ARTIFACT}:prod"))
            .param("test_dataset", format!("{TEST_ARTIFACT}:latest")),
    };

    Ok(invocation)
}

/// Serialize `modeling.random_forest` as JSON for the training stage
pub fn write_rf_config(config: &PipelineConfig, path: &Path) -> Result<(), ContractError> {
    let modeling = modeling(config, Stage::Train)?;
    let json = serde_json::to_string_pretty(&modeling.random_forest)?;
    fs::write(path, json)?;
    Ok(())
}

fn etl(config: &PipelineConfig, stage: Stage) -> Result<&EtlConfig, ContractError> {
    config.etl.as_ref().ok_or_else(|| missing("etl", stage))
}

fn data_check(config: &PipelineConfig, stage: Stage) -> Result<&DataCheckConfig, ContractError> {
    config
        .data_check
        .as_ref()
        .ok_or_else(|| missing("data_check", stage))
}

fn modeling(config: &PipelineConfig, stage: Stage) -> Result<&ModelingConfig, ContractError> {
    config
        .modeling
        .as_ref()
        .ok_or_else(|| missing("modeling", stage))
}

fn missing(section: &str, stage: Stage) -> ContractError {
    ContractError::config_validation(
        section,
        format!("section [{section}] is required by active stage '{stage}'"),
    )
}
