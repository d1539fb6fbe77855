//! Error types for dag-forge operations.
//!
//! Defines error types for each subsystem:
//! - Configuration validation and normalization
//! - Artifact generation (companion templates)
//! - Project save/load against the workspace
//! - Settings loaded from the environment

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `pipeline[1].tasks[0].priority`).
    pub field: String,
    /// Description of the violation.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raised when a project payload does not satisfy the configuration model.
///
/// Lists every violated field, not only the first one encountered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid project configuration: {}", format_fields(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Returns true if the given field is among the violations.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while rendering artifacts.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Tera template rendering error: {0}")]
    Tera(#[from] tera::Error),
}

/// Errors that can occur during project save and load.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project '{name}' not found at {}", .path.display())]
    NotFound { name: String, path: PathBuf },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
