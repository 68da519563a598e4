//! StageRunner trait - how the driver executes one stage
//!
//! Decouples sequencing (driver) from execution (a process per stage, each with its
//! own declared environment).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::{ContractError, Stage};

/// Parameters passed to one stage execution
///
/// Kept for provenance; rendered as `--<name> <value>` flags in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInvocation {
    pub stage: Stage,
    pub parameters: BTreeMap<String, String>,
}

impl StageInvocation {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.insert(name.into(), value.to_string());
        self
    }

    /// Command-line flags for the stage process
    pub fn to_args(&self) -> Vec<String> {
        self.parameters
            .iter()
            .flat_map(|(name, value)| [format!("--{name}"), value.clone()])
            .collect()
    }
}

/// Declared execution environment of a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    pub stage: Stage,
    /// Executable to launch
    pub program: String,
    /// Arguments placed before the stage parameters
    pub args: Vec<String>,
    /// Working directory (None = driver's working directory)
    pub working_dir: Option<PathBuf>,
    /// Variables set for the stage; nothing else leaks in except `inherit_env`
    pub env: BTreeMap<String, String>,
    /// Variables copied from the driver's environment when present
    pub inherit_env: Vec<String>,
}

/// Result of a successful stage execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    pub duration: Duration,
}

/// Stage execution backend
#[trait_variant::make(StageRunner: Send)]
pub trait LocalStageRunner {
    /// Run one stage to completion
    ///
    /// # Errors
    /// [`ContractError::StageExecution`] when the stage fails or cannot be started
    async fn run(
        &self,
        invocation: &StageInvocation,
        environment: &EnvironmentDescriptor,
    ) -> Result<StageOutcome, ContractError>;
}
