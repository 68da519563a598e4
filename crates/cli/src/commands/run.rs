//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::load_config;
use super::plan::print_plan;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, ProcessStageRunner};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let config = load_config(&args.config, args.steps.as_deref())?;

    info!(
        project = %config.main.project_name,
        experiment = %config.main.experiment_name,
        steps = %config.main.steps,
        store_root = %config.storage.root.display(),
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(config, ProcessStageRunner::new());

    // Dry run - resolve every stage and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        let plan = pipeline
            .plan(&std::env::temp_dir())
            .context("Failed to plan pipeline")?;
        print_plan(&plan);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        stages = stats.stages.len(),
                        duration_secs = stats.duration.as_secs_f64(),
                        "Pipeline completed successfully"
                    );
                    stats.print_summary();
                }
                Err(e) => {
                    if let Some(stage) = e.failed_stage() {
                        warn!(stage = %stage, "Later stages were not started");
                    }
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            // dropping the run future kills the running stage process
            anyhow::bail!("Received shutdown signal, pipeline interrupted");
        }
    }

    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
