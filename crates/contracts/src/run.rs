//! Run registry contract
//!
//! The registry records provenance only: the configuration a stage ran with and
//! which artifact versions it consumed and produced.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ArtifactMetadata, ContractError};

/// Environment variable carrying the tracking project to stage processes
pub const PROJECT_ENV: &str = "PIPELINE_PROJECT";
/// Environment variable carrying the run group to stage processes
pub const RUN_GROUP_ENV: &str = "PIPELINE_RUN_GROUP";
/// Environment variable carrying the artifact store root to stage processes
pub const STORE_ROOT_ENV: &str = "PIPELINE_STORE_ROOT";

/// Where runs and artifacts are filed
///
/// Passed explicitly to registry and store clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Project every run of the pipeline belongs to
    pub project: String,
    /// Run group (experiment) within the project
    pub group: String,
    /// Root directory of the local store
    pub store_root: PathBuf,
}

impl TrackingSettings {
    pub fn new(
        project: impl Into<String>,
        group: impl Into<String>,
        store_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project: project.into(),
            group: group.into(),
            store_root: store_root.into(),
        }
    }

    /// Variables a stage process needs to reach the same project and group
    pub fn to_env(&self) -> Vec<(String, String)> {
        vec![
            (PROJECT_ENV.to_string(), self.project.clone()),
            (RUN_GROUP_ENV.to_string(), self.group.clone()),
            (
                STORE_ROOT_ENV.to_string(),
                self.store_root.display().to_string(),
            ),
        ]
    }
}

/// Handle of a started run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub id: String,
    pub job_type: String,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Experiment tracking backend
pub trait RunRegistry: Send + Sync {
    /// Start a run of `job_type` recording `config`
    fn start_run(
        &self,
        job_type: &str,
        config: &serde_json::Value,
    ) -> Result<RunHandle, ContractError>;

    /// Record that the run consumed an artifact version
    fn use_artifact(
        &self,
        run: &RunHandle,
        artifact: &ArtifactMetadata,
    ) -> Result<(), ContractError>;

    /// Record that the run produced an artifact version
    fn log_artifact(
        &self,
        run: &RunHandle,
        artifact: &ArtifactMetadata,
    ) -> Result<(), ContractError>;

    /// Close the run
    fn finish_run(&self, run: &RunHandle, status: RunStatus) -> Result<(), ContractError>;
}
