//! Configuration validation
//!
//! Rules:
//! - numeric parameters are finite (NaN slips through range comparisons)
//! - field rules of each section (`validator` derive on the contract types)
//! - etl.min_price <= etl.max_price
//! - modeling.test_size + modeling.val_size < 1
//! - every active stage finds the sections it reads
//! - storage.root is not empty

use std::borrow::Cow;

use contracts::{ContractError, PipelineConfig, Stage};
use validator::{Validate, ValidationError};

/// Validate a PipelineConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &PipelineConfig) -> Result<(), ContractError> {
    validate_finite_numbers(config)?;
    validate_sections(config)?;
    validate_price_bounds(config)?;
    validate_split_sizes(config)?;
    validate_active_stage_requirements(config)?;
    validate_storage(config)?;
    Ok(())
}

/// Every float parameter is a finite number
fn validate_finite_numbers(config: &PipelineConfig) -> Result<(), ContractError> {
    let mut values: Vec<(&str, f64)> = Vec::new();
    if let Some(etl) = &config.etl {
        values.push(("etl.min_price", etl.min_price));
        values.push(("etl.max_price", etl.max_price));
    }
    if let Some(data_check) = &config.data_check {
        values.push(("data_check.kl_threshold", data_check.kl_threshold));
    }
    if let Some(modeling) = &config.modeling {
        values.push(("modeling.test_size", modeling.test_size));
        values.push(("modeling.val_size", modeling.val_size));
    }

    match values.into_iter().find(|(_, value)| !value.is_finite()) {
        Some((field, value)) => Err(ContractError::config_validation(
            field,
            format!("must be a finite number, got {value}"),
        )),
        None => Ok(()),
    }
}

/// Field rules of every present section
fn validate_sections(config: &PipelineConfig) -> Result<(), ContractError> {
    check_section("main", &config.main)?;
    if let Some(etl) = &config.etl {
        check_section("etl", etl)?;
    }
    if let Some(data_check) = &config.data_check {
        check_section("data_check", data_check)?;
    }
    if let Some(modeling) = &config.modeling {
        check_section("modeling", modeling)?;
    }
    Ok(())
}

/// Run derive-based rules and report the first failing field (by name)
fn check_section<T: Validate>(section: &str, value: &T) -> Result<(), ContractError> {
    value.validate().map_err(|errors| {
        let mut fields: Vec<(Cow<'static, str>, &Vec<ValidationError>)> =
            errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first() {
            Some((field, field_errors)) => {
                let message = field_errors
                    .first()
                    .map(describe)
                    .unwrap_or_else(|| "invalid value".to_string());
                ContractError::config_validation(format!("{section}.{field}"), message)
            }
            None => ContractError::config_validation(section, errors.to_string()),
        }
    })
}

fn describe(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|message| message.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

/// Price bounds form a non-empty closed interval
fn validate_price_bounds(config: &PipelineConfig) -> Result<(), ContractError> {
    let Some(etl) = &config.etl else {
        return Ok(());
    };

    if etl.min_price > etl.max_price {
        return Err(ContractError::config_validation(
            "etl.min_price / etl.max_price",
            format!(
                "min_price ({}) must be <= max_price ({})",
                etl.min_price, etl.max_price
            ),
        ));
    }
    Ok(())
}

/// Test and validation fractions leave rows to train on
fn validate_split_sizes(config: &PipelineConfig) -> Result<(), ContractError> {
    let Some(modeling) = &config.modeling else {
        return Ok(());
    };

    if modeling.test_size + modeling.val_size >= 1.0 {
        return Err(ContractError::config_validation(
            "modeling.test_size / modeling.val_size",
            format!(
                "test_size ({}) + val_size ({}) must be < 1",
                modeling.test_size, modeling.val_size
            ),
        ));
    }
    Ok(())
}

/// Every selected stage finds the parameters it needs
fn validate_active_stage_requirements(config: &PipelineConfig) -> Result<(), ContractError> {
    for stage in config.active_stages() {
        for section in required_sections(stage) {
            let present = match *section {
                "etl" => config.etl.is_some(),
                "data_check" => config.data_check.is_some(),
                "modeling" => config.modeling.is_some(),
                _ => true,
            };
            if !present {
                return Err(ContractError::config_validation(
                    *section,
                    format!("section [{section}] is required by active stage '{stage}'"),
                ));
            }
        }
    }
    Ok(())
}

/// Configuration sections a stage reads
pub fn required_sections(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Download | Stage::BasicCleaning => &["etl"],
        Stage::DataCheck => &["data_check", "etl"],
        Stage::DataSplit | Stage::Train => &["modeling"],
        Stage::TestRegressionModel => &[],
    }
}

fn validate_storage(config: &PipelineConfig) -> Result<(), ContractError> {
    if config.storage.root.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "storage.root",
            "storage root cannot be empty",
        ));
    }
    Ok(())
}
