//! Pipeline statistics.

use std::time::Duration;

use contracts::{Stage, StageOutcome};

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Completed stages in execution order
    pub stages: Vec<StageOutcome>,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    pub fn record(&mut self, outcome: StageOutcome) {
        self.stages.push(outcome);
    }

    /// Stages that ran, in order
    pub fn completed(&self) -> Vec<Stage> {
        self.stages.iter().map(|o| o.stage).collect()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Summary ===\n");
        println!("Stages completed: {}", self.stages.len());
        for (i, outcome) in self.stages.iter().enumerate() {
            let branch = if i + 1 == self.stages.len() {
                "└─"
            } else {
                "├─"
            };
            println!(
                "   {branch} {:<22} {:>8.2}s",
                outcome.stage,
                outcome.duration.as_secs_f64()
            );
        }
        println!("Total duration: {:.2}s", self.duration.as_secs_f64());
        println!();
    }
}
