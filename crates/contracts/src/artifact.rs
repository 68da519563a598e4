//! Artifact references, metadata and the ArtifactStore trait
//!
//! Artifacts are immutable once published: every publish creates a new version,
//! aliases (`latest`, `reference`, `prod`) only ever point at existing versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ContractError;

/// Alias moved by every publish
pub const LATEST_ALIAS: &str = "latest";

/// Version selector of an artifact reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactVersion {
    /// Most recently published version
    Latest,
    /// Concrete version number (`v3`)
    Number(u32),
    /// Named alias (`reference`, `prod`, ...)
    Alias(String),
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST_ALIAS),
            Self::Number(n) => write!(f, "v{n}"),
            Self::Alias(alias) => f.write_str(alias),
        }
    }
}

impl FromStr for ArtifactVersion {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ContractError::config_validation(
                "artifact version",
                "version tag cannot be empty",
            ));
        }
        if s == LATEST_ALIAS {
            return Ok(Self::Latest);
        }
        if let Some(number) = s.strip_prefix('v').and_then(|n| n.parse::<u32>().ok()) {
            return Ok(Self::Number(number));
        }
        Ok(Self::Alias(s.to_string()))
    }
}

/// Check that `name` can be used as a single path component
///
/// Stores and stages build file paths from artifact names, so a name is never
/// empty, `.`, `..`, and never contains a path separator or `:`.
pub fn validate_artifact_name(name: &str) -> Result<(), ContractError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', ':']) {
        return Err(ContractError::config_validation(
            "artifact name",
            format!(
                "invalid artifact name '{name}': must be non-empty and contain \
                 no path separators or ':'"
            ),
        ));
    }
    Ok(())
}

/// Reference to an artifact: `name:version`
///
/// A bare name means `name:latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactRef {
    pub name: String,
    pub version: ArtifactVersion,
}

impl ArtifactRef {
    pub fn new(name: impl Into<String>, version: ArtifactVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// `name:latest`
    pub fn latest(name: impl Into<String>) -> Self {
        Self::new(name, ArtifactVersion::Latest)
    }

    /// Parse `name[:version]`
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        let (name, version) = match s.rsplit_once(':') {
            Some((name, version)) => (name, version.parse()?),
            None => (s, ArtifactVersion::Latest),
        };
        if name.is_empty() {
            return Err(ContractError::config_validation(
                "artifact reference",
                format!("missing artifact name in '{s}'"),
            ));
        }
        validate_artifact_name(name)?;
        Ok(Self::new(name, version))
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

impl FromStr for ArtifactRef {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArtifactRef {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactRef> for String {
    fn from(reference: ArtifactRef) -> Self {
        reference.to_string()
    }
}

/// What a stage asks the store to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Artifact name (e.g. `clean_sample.csv`)
    pub name: String,
    /// Artifact type (e.g. `clean_sample`)
    pub artifact_type: String,
    /// Human-readable description
    pub description: String,
    /// Run that produced the artifact, for lineage
    #[serde(default)]
    pub source_run: Option<String>,
}

/// Metadata of one published artifact version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub artifact_type: String,
    pub description: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// File name inside the version directory
    pub file_name: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub source_run: Option<String>,
}

impl ArtifactMetadata {
    /// Reference pinned to this exact version
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef::new(self.name.clone(), ArtifactVersion::Number(self.version))
    }
}

/// A fetched artifact: its metadata and a readable local copy
#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub metadata: ArtifactMetadata,
    pub path: PathBuf,
}

/// Versioned, append-only artifact storage
pub trait ArtifactStore: Send + Sync {
    /// Resolve a reference to a local, read-only file
    ///
    /// # Errors
    /// [`ContractError::ArtifactNotFound`] when the name, version or alias is unknown
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, ContractError>;

    /// Publish `local_path` as a new version of `request.name`
    ///
    /// Existing versions are never overwritten.
    fn publish(
        &self,
        request: &PublishRequest,
        local_path: &Path,
    ) -> Result<ArtifactMetadata, ContractError>;

    /// Point `alias` at the version `reference` resolves to
    fn add_alias(
        &self,
        reference: &ArtifactRef,
        alias: &str,
    ) -> Result<ArtifactMetadata, ContractError>;
}
