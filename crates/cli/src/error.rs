//! Error types for pipeline runs.

use contracts::{ContractError, Stage};
use thiserror::Error;

/// Why a pipeline run stopped
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration invalid for the selected stages; nothing ran
    #[error("invalid configuration")]
    Configuration(#[source] ContractError),

    /// A stage failed; later stages were not started
    #[error("stage '{stage}' failed")]
    StageFailed {
        stage: Stage,
        #[source]
        source: ContractError,
    },

    /// Scratch space could not be prepared
    #[error("failed to prepare run directory: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn stage_failed(stage: Stage, source: ContractError) -> Self {
        Self::StageFailed { stage, source }
    }

    /// Stage that failed, if the run got that far
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
