//! Process-backed stage runner

use std::process::Stdio;
use std::time::Instant;

use contracts::{
    ContractError, EnvironmentDescriptor, StageInvocation, StageOutcome, StageRunner,
};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs each stage as a child process in its declared environment
///
/// The child's environment is cleared; it sees only the variables listed in
/// `inherit_env` plus the declared `env`. Output streams are inherited.
#[derive(Debug, Clone, Default)]
pub struct ProcessStageRunner;

impl ProcessStageRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &StageInvocation, environment: &EnvironmentDescriptor) -> Command {
        let mut cmd = Command::new(&environment.program);
        cmd.args(&environment.args)
            .args(invocation.to_args())
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        for name in &environment.inherit_env {
            if let Some(value) = std::env::var_os(name) {
                cmd.env(name, value);
            }
        }
        cmd.envs(&environment.env);

        if let Some(dir) = &environment.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl StageRunner for ProcessStageRunner {
    #[instrument(skip_all, fields(stage = %invocation.stage, program = %environment.program))]
    async fn run(
        &self,
        invocation: &StageInvocation,
        environment: &EnvironmentDescriptor,
    ) -> Result<StageOutcome, ContractError> {
        let stage = invocation.stage;
        let mut cmd = Self::command(invocation, environment);
        debug!(
            args = ?invocation.to_args(),
            working_dir = ?environment.working_dir,
            "Spawning stage process"
        );

        let start = Instant::now();
        let status = cmd.status().await.map_err(|e| {
            ContractError::stage_execution(
                stage,
                format!("failed to start '{}': {e}", environment.program),
            )
        })?;

        if !status.success() {
            let message = match status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            };
            return Err(ContractError::stage_execution(stage, message));
        }

        Ok(StageOutcome {
            stage,
            duration: start.elapsed(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use contracts::Stage;
    use std::collections::BTreeMap;

    fn environment(program: &str, args: &[&str]) -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            stage: Stage::BasicCleaning,
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            working_dir: None,
            env: BTreeMap::new(),
            inherit_env: vec!["PATH".to_string()],
        }
    }

    #[tokio::test]
    async fn test_successful_process() {
        let invocation = StageInvocation::new(Stage::BasicCleaning);
        let outcome = ProcessStageRunner::new()
            .run(&invocation, &environment("true", &[]))
            .await
            .unwrap();
        assert_eq!(outcome.stage, Stage::BasicCleaning);
    }

    #[tokio::test]
    async fn test_failing_process() {
        let invocation = StageInvocation::new(Stage::BasicCleaning);
        let err = ProcessStageRunner::new()
            .run(&invocation, &environment("false", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::StageExecution { .. }));
        assert!(err.to_string().contains("exited with status 1"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let invocation = StageInvocation::new(Stage::BasicCleaning);
        let err = ProcessStageRunner::new()
            .run(&invocation, &environment("definitely-not-a-stage-binary", &[]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[tokio::test]
    async fn test_declared_env_reaches_process() {
        let script = "test \"$STAGE_MARKER\" = yes && test -z \"$HOME\"";
        let mut env = environment("sh", &["-c", script]);
        env.env.insert("STAGE_MARKER".to_string(), "yes".to_string());
        let invocation = StageInvocation::new(Stage::BasicCleaning);
        ProcessStageRunner::new().run(&invocation, &env).await.unwrap();
    }
}
