//! dag-forge: Airflow project generator.
//!
//! This library turns a declarative pipeline description into a project
//! directory: a `meta.yaml` manifest, an Airflow DAG and a task module.

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod project;
pub mod settings;

// Re-export commonly used types
pub use config::{ProjectConfig, ProjectPayload};
pub use error::{ConfigError, FieldError, GeneratorError, ProjectError, ValidationError};
pub use generator::{generate_project_files, Artifacts};
pub use project::{ProjectStore, SaveStatus};
pub use settings::Settings;
