//! # Artifact Store
//!
//! Local filesystem backends for the two external collaborators of the pipeline:
//!
//! - [`LocalArtifactStore`]: versioned, append-only artifact storage with aliases
//! - [`LocalRunRegistry`]: run provenance (config, consumed and produced artifacts)
//!
//! Both are rooted at `<store_root>/<project>/` as given by
//! [`contracts::TrackingSettings`].

mod local;
mod registry;

pub use local::LocalArtifactStore;
pub use registry::{LocalRunRegistry, RunRecord};

use std::fs;
use std::io::Write;
use std::path::Path;

use contracts::ContractError;
use serde::Serialize;

/// Write JSON next to `path` then rename over it
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ContractError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
