//! Stage - canonical pipeline stages and the step selector
//!
//! The canonical order encodes the data-dependency chain: every artifact a stage
//! consumes is produced by a stage that comes earlier in [`Stage::CANONICAL`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Raw dataset as downloaded
pub const RAW_SAMPLE_ARTIFACT: &str = "sample.csv";
/// Dataset after basic cleaning
pub const CLEAN_SAMPLE_ARTIFACT: &str = "clean_sample.csv";
/// Train + validation split
pub const TRAINVAL_ARTIFACT: &str = "trainval_data.csv";
/// Held-out test split
pub const TEST_ARTIFACT: &str = "test_data.csv";
/// Exported inference pipeline
pub const MODEL_EXPORT_ARTIFACT: &str = "random_forest_export";

/// A pipeline stage
///
/// Variant order is the canonical execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    BasicCleaning,
    DataCheck,
    DataSplit,
    #[serde(alias = "train_random_forest")]
    Train,
    /// Only runs when named explicitly, after a model export was promoted to `prod`
    TestRegressionModel,
}

impl Stage {
    /// Every stage, in canonical order
    pub const CANONICAL: [Stage; 6] = [
        Stage::Download,
        Stage::BasicCleaning,
        Stage::DataCheck,
        Stage::DataSplit,
        Stage::Train,
        Stage::TestRegressionModel,
    ];

    /// Stage name as used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::BasicCleaning => "basic_cleaning",
            Stage::DataCheck => "data_check",
            Stage::DataSplit => "data_split",
            Stage::Train => "train",
            Stage::TestRegressionModel => "test_regression_model",
        }
    }

    /// Whether the `"all"` selector includes this stage
    pub fn included_in_all(&self) -> bool {
        !matches!(self, Stage::TestRegressionModel)
    }

    /// Artifact names this stage consumes
    pub fn inputs(&self) -> &'static [&'static str] {
        match self {
            Stage::Download => &[],
            Stage::BasicCleaning => &[RAW_SAMPLE_ARTIFACT],
            Stage::DataCheck | Stage::DataSplit => &[CLEAN_SAMPLE_ARTIFACT],
            Stage::Train => &[TRAINVAL_ARTIFACT],
            Stage::TestRegressionModel => &[MODEL_EXPORT_ARTIFACT, TEST_ARTIFACT],
        }
    }

    /// Artifact names this stage produces
    pub fn outputs(&self) -> &'static [&'static str] {
        match self {
            Stage::Download => &[RAW_SAMPLE_ARTIFACT],
            Stage::BasicCleaning => &[CLEAN_SAMPLE_ARTIFACT],
            Stage::DataCheck | Stage::TestRegressionModel => &[],
            Stage::DataSplit => &[TRAINVAL_ARTIFACT, TEST_ARTIFACT],
            Stage::Train => &[MODEL_EXPORT_ARTIFACT],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name == "train_random_forest" {
            return Ok(Stage::Train);
        }
        Stage::CANONICAL
            .into_iter()
            .find(|stage| stage.as_str() == name)
            .ok_or_else(|| {
                let known: Vec<&str> = Stage::CANONICAL.iter().map(Stage::as_str).collect();
                ContractError::config_validation(
                    "main.steps",
                    format!("unknown stage '{name}' (expected one of: {})", known.join(", ")),
                )
            })
    }
}

/// Which stages a run executes
///
/// Parsed from `"all"` or a comma-separated list of stage names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StageSelection {
    /// Every stage included in `"all"`
    #[default]
    All,
    /// An explicit set of stages; iteration is canonical order
    Subset(BTreeSet<Stage>),
}

impl StageSelection {
    /// Parse a selector, rejecting unknown or empty stage names
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        let trimmed = s.trim();
        if trimmed == "all" {
            return Ok(Self::All);
        }
        if trimmed.is_empty() {
            return Err(ContractError::config_validation(
                "main.steps",
                "step list cannot be empty",
            ));
        }

        let mut stages = BTreeSet::new();
        for entry in trimmed.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(ContractError::config_validation(
                    "main.steps",
                    format!("empty stage name in '{trimmed}'"),
                ));
            }
            if entry == "all" {
                return Err(ContractError::config_validation(
                    "main.steps",
                    "'all' cannot be combined with other stage names",
                ));
            }
            stages.insert(entry.parse::<Stage>()?);
        }
        Ok(Self::Subset(stages))
    }

    /// Selected stages in canonical order
    pub fn active_stages(&self) -> Vec<Stage> {
        match self {
            Self::All => Stage::CANONICAL
                .into_iter()
                .filter(Stage::included_in_all)
                .collect(),
            Self::Subset(stages) => stages.iter().copied().collect(),
        }
    }

    /// Whether `stage` is selected
    pub fn contains(&self, stage: Stage) -> bool {
        match self {
            Self::All => stage.included_in_all(),
            Self::Subset(stages) => stages.contains(&stage),
        }
    }
}

impl fmt::Display for StageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Subset(stages) => {
                let names: Vec<&str> = stages.iter().map(Stage::as_str).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

impl FromStr for StageSelection {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StageSelection {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StageSelection> for String {
    fn from(selection: StageSelection) -> Self {
        selection.to_string()
    }
}
