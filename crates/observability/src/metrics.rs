//! Pipeline metrics
//!
//! Thin wrappers over the `metrics` facade; without an installed recorder they are
//! no-ops.

use std::time::Duration;

use contracts::Stage;
use metrics::{counter, gauge, histogram};

/// Row counts of one cleaning pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningCounts {
    pub input_rows: usize,
    pub output_rows: usize,
}

impl CleaningCounts {
    /// Rows removed by the filters
    pub fn dropped(&self) -> usize {
        self.input_rows.saturating_sub(self.output_rows)
    }
}

/// A stage is about to run
pub fn record_stage_started(stage: Stage) {
    counter!("pipeline_stage_started_total", "stage" => stage.as_str()).increment(1);
}

/// A stage exited successfully
pub fn record_stage_completed(stage: Stage, duration: Duration) {
    counter!("pipeline_stage_completed_total", "stage" => stage.as_str()).increment(1);
    histogram!("pipeline_stage_duration_seconds", "stage" => stage.as_str())
        .record(duration.as_secs_f64());
}

/// A stage failed; the run aborts
pub fn record_stage_failed(stage: Stage) {
    counter!("pipeline_stage_failed_total", "stage" => stage.as_str()).increment(1);
}

/// Rows kept and dropped by a filtering stage
pub fn record_rows_filtered(stage: Stage, counts: CleaningCounts) {
    gauge!("pipeline_rows_input", "stage" => stage.as_str()).set(counts.input_rows as f64);
    gauge!("pipeline_rows_output", "stage" => stage.as_str()).set(counts.output_rows as f64);
    counter!("pipeline_rows_dropped_total", "stage" => stage.as_str())
        .increment(counts.dropped() as u64);
}
