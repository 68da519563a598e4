//! Layered error definitions
//!
//! Categorized by source: config / artifact / schema / stage

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Artifact Errors =====
    /// Referenced artifact (or version/alias) does not exist
    #[error("artifact not found: {reference}")]
    ArtifactNotFound { reference: String },

    /// Artifact could not be published
    #[error("failed to publish artifact '{name}': {message}")]
    ArtifactPublish { name: String, message: String },

    // ===== Data Errors =====
    /// Expected column absent from a fetched table
    #[error("schema error: required column '{column}' is missing")]
    Schema { column: String },

    /// Table could not be read or written
    #[error("table error: {message}")]
    Table { message: String },

    // ===== Stage Errors =====
    /// Failure inside a stage's process
    #[error("stage '{stage}' execution error: {message}")]
    StageExecution { stage: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create artifact-not-found error
    pub fn artifact_not_found(reference: impl ToString) -> Self {
        Self::ArtifactNotFound {
            reference: reference.to_string(),
        }
    }

    /// Create artifact publish error
    pub fn artifact_publish(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArtifactPublish {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create schema error for a missing column
    pub fn schema(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
        }
    }

    /// Create table read/write error
    pub fn table(message: impl Into<String>) -> Self {
        Self::Table {
            message: message.into(),
        }
    }

    /// Create stage execution error
    pub fn stage_execution(stage: impl ToString, message: impl Into<String>) -> Self {
        Self::StageExecution {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the configuration class
    ///
    /// Configuration errors abort before any stage runs.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigParse { .. } | Self::ConfigValidation { .. })
    }
}
