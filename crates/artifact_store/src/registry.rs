//! LocalRunRegistry - one JSON record per run
//!
//! ```text
//! <store_root>/<project>/runs/<run-id>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{
    ArtifactMetadata, ContractError, RunHandle, RunRegistry, RunStatus, TrackingSettings,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Persisted provenance of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub project: String,
    pub group: String,
    pub job_type: String,
    pub config: serde_json::Value,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Consumed artifact versions (`name:vN`)
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Produced artifact versions (`name:vN`)
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Run registry backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalRunRegistry {
    runs_dir: PathBuf,
    project: String,
    group: String,
}

impl LocalRunRegistry {
    pub fn new(settings: &TrackingSettings) -> Self {
        Self {
            runs_dir: settings.store_root.join(&settings.project).join("runs"),
            project: settings.project.clone(),
            group: settings.group.clone(),
        }
    }

    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    /// Load the record of a run
    pub fn record(&self, run_id: &str) -> Result<RunRecord, ContractError> {
        let content = fs::read_to_string(self.record_path(run_id))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All records of this project, ordered by start time
    pub fn records(&self) -> Result<Vec<RunRecord>, ContractError> {
        let entries = match fs::read_dir(&self.runs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let content = fs::read_to_string(&path)?;
                records.push(serde_json::from_str::<RunRecord>(&content)?);
            }
        }
        records.sort_by_key(|record| record.started_at);
        Ok(records)
    }

    fn record_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(format!("{run_id}.json"))
    }

    fn update(
        &self,
        run: &RunHandle,
        apply: impl FnOnce(&mut RunRecord),
    ) -> Result<(), ContractError> {
        let mut record = self.record(&run.id)?;
        apply(&mut record);
        crate::write_json_atomic(&self.record_path(&run.id), &record)
    }
}

impl RunRegistry for LocalRunRegistry {
    fn start_run(
        &self,
        job_type: &str,
        config: &serde_json::Value,
    ) -> Result<RunHandle, ContractError> {
        fs::create_dir_all(&self.runs_dir)?;

        let record = RunRecord {
            id: Uuid::new_v4().to_string(),
            project: self.project.clone(),
            group: self.group.clone(),
            job_type: job_type.to_string(),
            config: config.clone(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        crate::write_json_atomic(&self.record_path(&record.id), &record)?;

        info!(
            run_id = %record.id,
            job_type,
            project = %self.project,
            group = %self.group,
            "Run started"
        );
        Ok(RunHandle {
            id: record.id,
            job_type: record.job_type,
        })
    }

    fn use_artifact(
        &self,
        run: &RunHandle,
        artifact: &ArtifactMetadata,
    ) -> Result<(), ContractError> {
        let reference = artifact.reference().to_string();
        debug!(run_id = %run.id, artifact = %reference, "Artifact used");
        self.update(run, |record| record.inputs.push(reference))
    }

    fn log_artifact(
        &self,
        run: &RunHandle,
        artifact: &ArtifactMetadata,
    ) -> Result<(), ContractError> {
        let reference = artifact.reference().to_string();
        debug!(run_id = %run.id, artifact = %reference, "Artifact logged");
        self.update(run, |record| record.outputs.push(reference))
    }

    fn finish_run(&self, run: &RunHandle, status: RunStatus) -> Result<(), ContractError> {
        info!(run_id = %run.id, job_type = %run.job_type, status = ?status, "Run finished");
        self.update(run, |record| {
            record.status = status;
            record.finished_at = Some(Utc::now());
        })
    }
}
