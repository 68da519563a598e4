//! `plan` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use super::load_config;
use crate::cli::PlanArgs;
use crate::pipeline::{Pipeline, PlannedStage, ProcessStageRunner};

/// Execute the `plan` command
pub fn run_plan(args: &PlanArgs) -> Result<()> {
    info!(config = %args.config.display(), "Planning pipeline");

    let config = load_config(&args.config, args.steps.as_deref())?;
    let pipeline = Pipeline::new(config, ProcessStageRunner::new());

    // Generated files land in a per-run scratch directory; show a placeholder
    let plan = pipeline
        .plan(&std::env::temp_dir().join("<scratch>"))
        .context("Failed to plan pipeline")?;

    if args.json {
        let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{}", json);
    } else {
        print_plan(&plan);
    }

    Ok(())
}

/// Print the stages in execution order
pub(super) fn print_plan(plan: &[PlannedStage]) {
    println!("\n=== Pipeline Plan ===\n");

    if plan.is_empty() {
        println!("No stages selected.\n");
        return;
    }

    for (i, planned) in plan.iter().enumerate() {
        let env = &planned.environment;
        println!("{}. {}", i + 1, planned.invocation.stage);

        let mut command = vec![env.program.clone()];
        command.extend(env.args.iter().cloned());
        println!("   Program: {}", command.join(" "));
        if let Some(ref dir) = env.working_dir {
            println!("   Working dir: {}", dir.display());
        }
        println!("   Parameters:");
        for (name, value) in &planned.invocation.parameters {
            println!("     --{} {}", name, value);
        }
        if !env.inherit_env.is_empty() {
            println!("   Inherits: {}", env.inherit_env.join(", "));
        }
        println!();
    }
}
