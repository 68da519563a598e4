//! PipelineConfig - Config Loader output
//!
//! Describes the whole run: project/experiment grouping, selected stages and the
//! parameters of every stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

use crate::{Stage, StageSelection};

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run grouping and step selection
    pub main: MainConfig,

    /// Download / cleaning parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etl: Option<EtlConfig>,

    /// Data test parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_check: Option<DataCheckConfig>,

    /// Split / training parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modeling: Option<ModelingConfig>,

    /// Local artifact store and run registry location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-stage environment overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environments: BTreeMap<Stage, EnvironmentSpec>,
}

/// `[main]` section
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MainConfig {
    /// Tracking project all runs are filed under
    #[validate(length(min = 1, message = "project_name cannot be empty"))]
    pub project_name: String,

    /// Run group inside the project
    #[validate(length(min = 1, message = "experiment_name cannot be empty"))]
    pub experiment_name: String,

    /// `"all"` or comma-separated stage names
    #[serde(default)]
    pub steps: StageSelection,

    /// Directory holding the reusable component stages
    #[validate(length(min = 1, message = "components_repository cannot be empty"))]
    pub components_repository: String,
}

/// `[etl]` section
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EtlConfig {
    /// Sample file the download stage fetches
    #[validate(length(min = 1, message = "sample cannot be empty"))]
    pub sample: String,

    /// Inclusive lower price bound
    #[validate(range(min = 0.0, message = "min_price must be >= 0"))]
    pub min_price: f64,

    /// Inclusive upper price bound
    pub max_price: f64,
}

/// `[data_check]` section
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DataCheckConfig {
    /// Maximum KL divergence tolerated against the reference dataset
    #[validate(range(exclusive_min = 0.0, message = "kl_threshold must be > 0"))]
    pub kl_threshold: f64,
}

/// `[modeling]` section
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelingConfig {
    /// Fraction of the dataset held out for the final test
    #[validate(range(
        exclusive_min = 0.0,
        exclusive_max = 1.0,
        message = "test_size must be in (0, 1)"
    ))]
    pub test_size: f64,

    /// Fraction of the remaining data used for validation
    #[validate(range(
        exclusive_min = 0.0,
        exclusive_max = 1.0,
        message = "val_size must be in (0, 1)"
    ))]
    pub val_size: f64,

    pub random_seed: u64,

    /// Column to stratify splits on; `"none"` disables stratification
    #[validate(length(min = 1, message = "stratify_by cannot be empty"))]
    pub stratify_by: String,

    /// Random forest hyperparameters, handed to the training stage verbatim
    #[validate(length(min = 1, message = "random_forest cannot be empty"))]
    pub random_forest: BTreeMap<String, serde_json::Value>,

    #[validate(range(min = 1, message = "max_tfidf_features must be >= 1"))]
    pub max_tfidf_features: u32,
}

/// `[storage]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the local artifact store and run registry
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("artifacts")
}

/// `[environments.<stage>]` override; unset fields keep the stage defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Executable to launch
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments placed before the stage parameters
    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Working directory of the stage process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Extra variables declared for the stage
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Variables copied from the driver's environment
    #[serde(default)]
    pub inherit_env: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Stages this configuration executes, in canonical order
    pub fn active_stages(&self) -> Vec<Stage> {
        self.main.steps.active_stages()
    }
}
