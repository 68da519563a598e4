//! LocalArtifactStore - artifacts as versioned directories
//!
//! ```text
//! <root>/<name>/aliases.json        alias -> version
//! <root>/<name>/v<N>/metadata.json
//! <root>/<name>/v<N>/<file>
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use contracts::{
    ArtifactMetadata, ArtifactRef, ArtifactStore, ArtifactVersion, ContractError,
    FetchedArtifact, PublishRequest, TrackingSettings, LATEST_ALIAS,
    validate_artifact_name,
};
use tracing::{debug, info, instrument};

const METADATA_FILE: &str = "metadata.json";
const ALIASES_FILE: &str = "aliases.json";

/// Artifact store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Store for the project named in `settings`
    pub fn new(settings: &TrackingSettings) -> Self {
        Self::at(settings.store_root.join(&settings.project).join("artifacts"))
    }

    /// Store rooted directly at `root`
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All published versions of `name`, oldest first
    pub fn versions(&self, name: &str) -> Result<Vec<ArtifactMetadata>, ContractError> {
        let mut numbers = self.version_numbers(name)?;
        numbers.sort_unstable();
        numbers
            .into_iter()
            .map(|version| self.read_metadata(name, version))
            .collect()
    }

    /// Alias table of `name`
    pub fn aliases(&self, name: &str) -> Result<BTreeMap<String, u32>, ContractError> {
        let path = self.artifact_dir(name).join(ALIASES_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{version}"))
    }

    fn version_numbers(&self, name: &str) -> Result<Vec<u32>, ContractError> {
        let dir = self.artifact_dir(name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut numbers = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(number) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix('v'))
                .and_then(|n| n.parse::<u32>().ok())
            {
                numbers.push(number);
            }
        }
        Ok(numbers)
    }

    fn read_metadata(&self, name: &str, version: u32) -> Result<ArtifactMetadata, ContractError> {
        let path = self.version_dir(name, version).join(METADATA_FILE);
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Version number a reference points at
    fn resolve(&self, reference: &ArtifactRef) -> Result<u32, ContractError> {
        validate_artifact_name(&reference.name)?;
        let version = match &reference.version {
            ArtifactVersion::Number(number) => Some(*number),
            ArtifactVersion::Latest => self.aliases(&reference.name)?.get(LATEST_ALIAS).copied(),
            ArtifactVersion::Alias(alias) => self.aliases(&reference.name)?.get(alias).copied(),
        };

        version
            .filter(|v| self.version_dir(&reference.name, *v).join(METADATA_FILE).is_file())
            .ok_or_else(|| ContractError::artifact_not_found(reference))
    }

    fn set_alias(&self, name: &str, alias: &str, version: u32) -> Result<(), ContractError> {
        let mut aliases = self.aliases(name)?;
        aliases.insert(alias.to_string(), version);
        crate::write_json_atomic(&self.artifact_dir(name).join(ALIASES_FILE), &aliases)
    }
}

impl ArtifactStore for LocalArtifactStore {
    #[instrument(skip(self, reference), fields(reference = %reference))]
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, ContractError> {
        let version = self.resolve(reference)?;
        let metadata = self.read_metadata(&reference.name, version)?;
        let path = self
            .version_dir(&reference.name, version)
            .join(&metadata.file_name);

        if !path.is_file() {
            return Err(ContractError::artifact_not_found(reference));
        }

        debug!(version, path = %path.display(), "Artifact resolved");
        Ok(FetchedArtifact { metadata, path })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    fn publish(
        &self,
        request: &PublishRequest,
        local_path: &Path,
    ) -> Result<ArtifactMetadata, ContractError> {
        validate_name(&request.name)?;

        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ContractError::artifact_publish(
                    &request.name,
                    format!("invalid file path: {}", local_path.display()),
                )
            })?
            .to_string();

        let size_bytes = fs::metadata(local_path)
            .map_err(|e| {
                ContractError::artifact_publish(
                    &request.name,
                    format!("cannot read {}: {e}", local_path.display()),
                )
            })?
            .len();

        fs::create_dir_all(self.artifact_dir(&request.name))?;
        let version = self
            .version_numbers(&request.name)?
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1;

        // create_dir (not create_dir_all): an existing version is never reused
        let version_dir = self.version_dir(&request.name, version);
        fs::create_dir(&version_dir).map_err(|e| {
            ContractError::artifact_publish(
                &request.name,
                format!("cannot create version v{version}: {e}"),
            )
        })?;

        fs::copy(local_path, version_dir.join(&file_name))?;

        let metadata = ArtifactMetadata {
            name: request.name.clone(),
            artifact_type: request.artifact_type.clone(),
            description: request.description.clone(),
            version,
            created_at: Utc::now(),
            file_name,
            size_bytes,
            source_run: request.source_run.clone(),
        };
        crate::write_json_atomic(&version_dir.join(METADATA_FILE), &metadata)?;
        self.set_alias(&request.name, LATEST_ALIAS, version)?;

        info!(
            version,
            artifact_type = %metadata.artifact_type,
            size_bytes,
            "Artifact published"
        );
        Ok(metadata)
    }

    fn add_alias(
        &self,
        reference: &ArtifactRef,
        alias: &str,
    ) -> Result<ArtifactMetadata, ContractError> {
        match alias.parse::<ArtifactVersion>()? {
            ArtifactVersion::Alias(_) => {}
            ArtifactVersion::Latest => {
                return Err(ContractError::config_validation(
                    "alias",
                    "'latest' is maintained by publish and cannot be assigned",
                ))
            }
            ArtifactVersion::Number(_) => {
                return Err(ContractError::config_validation(
                    "alias",
                    format!("'{alias}' looks like a version number"),
                ))
            }
        }

        let version = self.resolve(reference)?;
        self.set_alias(&reference.name, alias, version)?;
        info!(reference = %reference, alias, version, "Alias updated");
        self.read_metadata(&reference.name, version)
    }
}

fn validate_name(name: &str) -> Result<(), ContractError> {
    validate_artifact_name(name).map_err(|e| ContractError::artifact_publish(name, e.to_string()))
}
