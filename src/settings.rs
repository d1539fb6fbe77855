//! Generator and workspace settings.
//!
//! Every fixed root or fallback value the generators rely on lives here so
//! that callers inject it instead of the code reaching for the home directory.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::ConfigError;

/// Default root under which projects live and relative I/O paths are resolved.
pub const DEFAULT_WORKSPACE_ROOT: &str = "/home/jovyan/workspaces";

/// Default root of the custom conda environments.
pub const DEFAULT_CONDA_ENVS_ROOT: &str = "/etc/conda/envs/custom";

/// Environment name written into the DAG when conda is disabled.
pub const DEFAULT_ENV_NAME: &str = "airflow-env";

/// Pool used when neither the task nor the project names one.
pub const DEFAULT_POOL: &str = "default_pool";

/// Settings shared by the generators and the project store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root directory of all projects.
    pub workspace_root: PathBuf,
    /// Root directory of the conda environments (informational).
    pub conda_envs_root: PathBuf,
    /// Env name constant emitted when conda is off.
    pub default_env_name: String,
    /// Pool sentinel for tasks without any pool.
    pub default_pool: String,
    /// Fixed start reference of generated DAGs.
    pub start_date: NaiveDate,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            conda_envs_root: PathBuf::from(DEFAULT_CONDA_ENVS_ROOT),
            default_env_name: DEFAULT_ENV_NAME.to_string(),
            default_pool: DEFAULT_POOL.to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        }
    }
}

impl Settings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DAG_FORGE_WORKSPACE_ROOT`: project root (default: /home/jovyan/workspaces)
    /// - `DAG_FORGE_CONDA_ENVS_ROOT`: conda envs root (default: /etc/conda/envs/custom)
    /// - `DAG_FORGE_DEFAULT_ENV`: env name when conda is off (default: airflow-env)
    /// - `DAG_FORGE_DEFAULT_POOL`: fallback pool (default: default_pool)
    /// - `DAG_FORGE_START_DATE`: DAG start date, `YYYY-MM-DD` (default: 2023-01-01)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Ok(val) = std::env::var("DAG_FORGE_WORKSPACE_ROOT") {
            settings.workspace_root = parse_root(&val, "DAG_FORGE_WORKSPACE_ROOT")?;
        }

        if let Ok(val) = std::env::var("DAG_FORGE_CONDA_ENVS_ROOT") {
            settings.conda_envs_root = parse_root(&val, "DAG_FORGE_CONDA_ENVS_ROOT")?;
        }

        if let Ok(val) = std::env::var("DAG_FORGE_DEFAULT_ENV") {
            settings.default_env_name = parse_non_empty(&val, "DAG_FORGE_DEFAULT_ENV")?;
        }

        if let Ok(val) = std::env::var("DAG_FORGE_DEFAULT_POOL") {
            settings.default_pool = parse_non_empty(&val, "DAG_FORGE_DEFAULT_POOL")?;
        }

        if let Ok(val) = std::env::var("DAG_FORGE_START_DATE") {
            settings.start_date = parse_date(&val, "DAG_FORGE_START_DATE")?;
        }

        Ok(settings)
    }

    /// Builder method to set the workspace root.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Builder method to set the conda environments root.
    pub fn with_conda_envs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.conda_envs_root = root.into();
        self
    }

    /// Builder method to set the fallback env name.
    pub fn with_default_env_name(mut self, name: impl Into<String>) -> Self {
        self.default_env_name = name.into();
        self
    }

    /// Builder method to set the fallback pool.
    pub fn with_default_pool(mut self, pool: impl Into<String>) -> Self {
        self.default_pool = pool.into();
        self
    }

    /// Builder method to set the DAG start date.
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self
    }

    /// Resolves a user-supplied data path against the workspace root.
    ///
    /// Absolute paths (leading `/`) are returned unchanged.
    pub fn absolute_data_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            self.workspace_root.join(path).display().to_string()
        }
    }

    /// Directory of the named project.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.workspace_root.join(project)
    }

    /// Root directory of the conda environments.
    pub fn conda_envs_root(&self) -> &Path {
        &self.conda_envs_root
    }
}

fn parse_root(value: &str, key: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = parse_non_empty(value, key)?;
    Ok(PathBuf::from(trimmed))
}

fn parse_non_empty(value: &str, key: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_date(value: &str, key: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected YYYY-MM-DD, got '{}'", value),
    })
}
