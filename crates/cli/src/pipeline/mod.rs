//! Pipeline driver: stage planning, environments and sequential execution.

mod environment;
mod invocation;
mod orchestrator;
mod runner;
mod stats;

pub use environment::tracking_settings;
pub use orchestrator::{Pipeline, PlannedStage};
pub use runner::ProcessStageRunner;
