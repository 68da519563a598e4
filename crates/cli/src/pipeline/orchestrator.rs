//! Pipeline orchestrator - runs the active stages in canonical order.

use std::path::Path;
use std::time::Instant;

use contracts::{
    ContractError, EnvironmentDescriptor, PipelineConfig, Stage, StageInvocation, StageRunner,
};
use serde::Serialize;
use tracing::{error, info, instrument};

use super::environment::{resolve_environment, tracking_settings};
use super::invocation::{build_invocation, write_rf_config, RF_CONFIG_FILE};
use super::stats::PipelineStats;
use crate::error::{PipelineError, Result};

/// One stage as it will be executed
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStage {
    pub invocation: StageInvocation,
    pub environment: EnvironmentDescriptor,
}

/// Sequential stage pipeline
///
/// Stages run one at a time; the first failure stops the run and later stages
/// are not started. Stages already completed are not rolled back.
pub struct Pipeline<R> {
    config: PipelineConfig,
    runner: R,
}

impl<R: StageRunner> Pipeline<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Resolve every active stage without running anything
    ///
    /// `scratch` is the directory generated stage inputs are written to.
    pub fn plan(&self, scratch: &Path) -> std::result::Result<Vec<PlannedStage>, ContractError> {
        let rf_config = scratch.join(RF_CONFIG_FILE);
        let tracking = tracking_settings(&self.config)?;
        self.config
            .active_stages()
            .into_iter()
            .map(|stage| {
                Ok(PlannedStage {
                    invocation: build_invocation(stage, &self.config, &rf_config)?,
                    environment: resolve_environment(stage, &self.config, &tracking),
                })
            })
            .collect()
    }

    /// Run the pipeline to completion or first failure
    ///
    /// The scratch directory lives for the duration of the call and is removed
    /// on every exit path.
    #[instrument(skip(self), fields(project = %self.config.main.project_name))]
    pub async fn run(&self) -> Result<PipelineStats> {
        let start = Instant::now();
        let scratch = tempfile::Builder::new()
            .prefix("rental-pipeline-")
            .tempdir()?;

        let plan = self
            .plan(scratch.path())
            .map_err(PipelineError::Configuration)?;

        info!(
            stages = ?plan.iter().map(|p| p.invocation.stage.as_str()).collect::<Vec<_>>(),
            scratch = %scratch.path().display(),
            "Pipeline starting"
        );

        let mut stats = PipelineStats::default();
        for planned in &plan {
            let stage = planned.invocation.stage;
            self.prepare(stage, scratch.path())
                .map_err(|e| PipelineError::stage_failed(stage, e))?;

            info!(stage = %stage, program = %planned.environment.program, "Starting stage");
            observability::record_stage_started(stage);

            match self.runner.run(&planned.invocation, &planned.environment).await {
                Ok(outcome) => {
                    observability::record_stage_completed(stage, outcome.duration);
                    info!(
                        stage = %stage,
                        duration_secs = outcome.duration.as_secs_f64(),
                        "Stage completed"
                    );
                    stats.record(outcome);
                }
                Err(e) => {
                    observability::record_stage_failed(stage);
                    error!(stage = %stage, error = %e, "Stage failed, aborting pipeline");
                    return Err(PipelineError::stage_failed(stage, e));
                }
            }
        }

        stats.duration = start.elapsed();
        info!(
            stages = stats.stages.len(),
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline finished"
        );
        Ok(stats)
    }

    /// Write inputs a stage expects to find in the scratch directory
    fn prepare(&self, stage: Stage, scratch: &Path) -> std::result::Result<(), ContractError> {
        if stage == Stage::Train {
            write_rf_config(&self.config, &scratch.join(RF_CONFIG_FILE))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::sample_config;
    use contracts::StageOutcome;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records invocations; fails on `fail_on`
    #[derive(Clone, Default)]
    struct RecordingRunner {
        calls: Arc<Mutex<Vec<StageInvocation>>>,
        fail_on: Option<Stage>,
    }

    impl RecordingRunner {
        fn failing_on(stage: Stage) -> Self {
            Self {
                fail_on: Some(stage),
                ..Default::default()
            }
        }

        fn stages(&self) -> Vec<Stage> {
            self.calls.lock().unwrap().iter().map(|i| i.stage).collect()
        }
    }

    impl StageRunner for RecordingRunner {
        async fn run(
            &self,
            invocation: &StageInvocation,
            _environment: &EnvironmentDescriptor,
        ) -> std::result::Result<StageOutcome, ContractError> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.fail_on == Some(invocation.stage) {
                return Err(ContractError::stage_execution(
                    invocation.stage,
                    "exited with status 1",
                ));
            }
            Ok(StageOutcome {
                stage: invocation.stage,
                duration: Duration::from_millis(1),
            })
        }
    }

    #[tokio::test]
    async fn test_single_stage_selection() {
        let runner = RecordingRunner::default();
        let pipeline = Pipeline::new(sample_config("basic_cleaning"), runner.clone());

        let stats = pipeline.run().await.unwrap();
        assert_eq!(runner.stages(), vec![Stage::BasicCleaning]);
        assert_eq!(stats.completed(), vec![Stage::BasicCleaning]);
    }

    #[tokio::test]
    async fn test_all_runs_canonical_order() {
        let runner = RecordingRunner::default();
        let pipeline = Pipeline::new(sample_config("all"), runner.clone());

        pipeline.run().await.unwrap();
        assert_eq!(
            runner.stages(),
            vec![
                Stage::Download,
                Stage::BasicCleaning,
                Stage::DataCheck,
                Stage::DataSplit,
                Stage::Train,
            ]
        );
    }

    #[tokio::test]
    async fn test_listed_order_is_ignored() {
        let runner = RecordingRunner::default();
        let pipeline = Pipeline::new(sample_config("data_split,download"), runner.clone());

        pipeline.run().await.unwrap();
        assert_eq!(runner.stages(), vec![Stage::Download, Stage::DataSplit]);
    }

    #[tokio::test]
    async fn test_failure_stops_pipeline() {
        let runner = RecordingRunner::failing_on(Stage::DataCheck);
        let pipeline = Pipeline::new(sample_config("all"), runner.clone());

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(Stage::DataCheck));
        assert_eq!(
            runner.stages(),
            vec![Stage::Download, Stage::BasicCleaning, Stage::DataCheck]
        );
    }

    #[tokio::test]
    async fn test_rf_config_written_before_train_and_removed_after() {
        let runner = RecordingRunner::default();
        let pipeline = Pipeline::new(sample_config("train"), runner.clone());

        pipeline.run().await.unwrap();

        let calls = runner.calls.lock().unwrap();
        let rf_config = PathBuf::from(&calls[0].parameters["rf_config"]);
        assert_eq!(rf_config.file_name().unwrap(), RF_CONFIG_FILE);
        // scratch directory is gone once the run returns
        assert!(!rf_config.exists());
    }

    #[tokio::test]
    async fn test_scratch_removed_after_failure() {
        let runner = RecordingRunner::failing_on(Stage::Train);
        let pipeline = Pipeline::new(sample_config("train"), runner.clone());

        pipeline.run().await.unwrap_err();
        let calls = runner.calls.lock().unwrap();
        let rf_config = PathBuf::from(&calls[0].parameters["rf_config"]);
        assert!(!rf_config.parent().unwrap().exists());
    }

    #[test]
    fn test_plan_without_running() {
        let runner = RecordingRunner::default();
        let pipeline = Pipeline::new(sample_config("basic_cleaning,data_check"), runner.clone());

        let plan = pipeline.plan(Path::new("/tmp/scratch")).unwrap();
        let stages: Vec<_> = plan.iter().map(|p| p.invocation.stage).collect();
        assert_eq!(stages, vec![Stage::BasicCleaning, Stage::DataCheck]);
        assert_eq!(plan[1].environment.program, "data-check");
        assert!(runner.stages().is_empty());
    }

    /// Relative path from the current directory to `target`
    #[cfg(unix)]
    fn relative_from_cwd(target: &Path) -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        relative.join(target.strip_prefix("/").unwrap())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relative_store_root_reaches_component_stages() {
        use contracts::EnvironmentSpec;

        let tmp = tempfile::TempDir::new().unwrap();
        let component_dir = tmp.path().join("components").join("get_data");
        std::fs::create_dir_all(&component_dir).unwrap();

        let mut config = sample_config("download,basic_cleaning");
        config.storage.root = relative_from_cwd(&tmp.path().join("store"));
        assert!(config.storage.root.is_relative());

        // download runs from the component directory and leaves a marker in the store;
        // basic_cleaning runs elsewhere and must find it
        let shell = |script: &str, working_dir: Option<PathBuf>| EnvironmentSpec {
            program: Some("sh".to_string()),
            args: Some(vec!["-c".to_string(), script.to_string()]),
            working_dir,
            inherit_env: Some(vec!["PATH".to_string()]),
            ..Default::default()
        };
        config.environments.insert(
            Stage::Download,
            shell(
                "mkdir -p \"$PIPELINE_STORE_ROOT\" && touch \"$PIPELINE_STORE_ROOT/marker\"",
                Some(component_dir),
            ),
        );
        config.environments.insert(
            Stage::BasicCleaning,
            shell("test -f \"$PIPELINE_STORE_ROOT/marker\"", None),
        );

        let pipeline = Pipeline::new(config, crate::pipeline::ProcessStageRunner::new());
        let stats = pipeline.run().await.unwrap();

        assert_eq!(stats.completed(), vec![Stage::Download, Stage::BasicCleaning]);
        assert!(tmp.path().join("store").join("marker").is_file());
    }
}
