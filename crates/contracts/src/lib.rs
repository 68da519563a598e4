//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the pipeline.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! - The driver reads a [`PipelineConfig`] and turns each active [`Stage`] into a
//!   [`StageInvocation`] executed by a [`StageRunner`]
//! - Stages exchange data exclusively through the [`ArtifactStore`], by
//!   [`ArtifactRef`] (`name:version`)
//! - Provenance goes to the [`RunRegistry`]; it never drives control flow

mod artifact;
mod config;
mod error;
mod run;
mod runner;
mod stage;

pub use artifact::*;
pub use config::*;
pub use error::*;
pub use run::*;
pub use runner::*;
pub use stage::*;
