//! Saving and loading projects under the workspace root.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::config::{project_name_problem, ProjectConfig, ProjectPayload};
use crate::error::{FieldError, ProjectError, ValidationError};
use crate::generator::manifest::MANIFEST_FILE;
use crate::generator::{generate_project_files, Manifest};
use crate::project::loader::payload_from_manifest;
use crate::settings::Settings;

/// Subdirectories created in every project.
const PROJECT_SUBDIRS: [&str; 2] = ["src", "tests"];

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whether a save created the project directory or reused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveState {
    Created,
    Updated,
}

/// Result of a save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStatus {
    pub status: SaveState,
    /// Project directory.
    pub path: PathBuf,
    /// Written files, relative to `path`, in write order.
    pub files: Vec<PathBuf>,
    pub saved_at: DateTime<Utc>,
}

/// Reads and writes projects below `settings.workspace_root`.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    settings: Settings,
}

impl ProjectStore {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Absolute directory of a project.
    pub fn project_path(&self, name: &str) -> PathBuf {
        self.settings.project_dir(name)
    }

    /// Project directory, refusing names that would leave the workspace root.
    fn checked_project_path(&self, name: &str) -> Result<PathBuf, ProjectError> {
        match project_name_problem(name) {
            Some(problem) => Err(ValidationError {
                errors: vec![FieldError::new("nomprojet", problem)],
            }
            .into()),
            None => Ok(self.project_path(name)),
        }
    }

    /// Validates a payload and writes the full project directory.
    ///
    /// Nothing is written when validation fails.
    #[instrument(skip(self, payload), fields(project = %payload.nomprojet))]
    pub async fn save(&self, payload: ProjectPayload) -> Result<SaveStatus, ProjectError> {
        let config = payload.validate()?;
        self.save_config(&config).await
    }

    /// Writes the full project directory for an already validated config.
    ///
    /// Every file is rendered before the first write. Each file is replaced
    /// atomically, but the set of files is not: an I/O error part way leaves
    /// the files written so far in place.
    pub async fn save_config(&self, config: &ProjectConfig) -> Result<SaveStatus, ProjectError> {
        let project_path = self.checked_project_path(&config.name)?;
        let files = generate_project_files(config, &self.settings)?;

        let existed = fs::try_exists(&project_path).await?;
        for subdir in PROJECT_SUBDIRS {
            fs::create_dir_all(project_path.join(subdir)).await?;
        }

        for file in &files {
            write_atomic(&project_path.join(&file.path), &file.content).await?;
            debug!(file = %file.path.display(), bytes = file.content.len(), "Wrote project file");
        }

        let status = if existed {
            SaveState::Updated
        } else {
            SaveState::Created
        };
        info!(
            path = %project_path.display(),
            files = files.len(),
            ?status,
            "Saved project"
        );

        Ok(SaveStatus {
            status,
            path: project_path,
            files: files.into_iter().map(|f| f.path).collect(),
            saved_at: Utc::now(),
        })
    }

    /// Reconstructs a payload from the project's `meta.yaml`.
    ///
    /// Only the manifest is read; see [`payload_from_manifest`] for what is
    /// lost in that direction.
    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> Result<ProjectPayload, ProjectError> {
        let project_path = self.checked_project_path(name)?;
        let manifest_path = project_path.join(MANIFEST_FILE);

        let text = match fs::read_to_string(&manifest_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %manifest_path.display(), "Manifest not found");
                return Err(ProjectError::NotFound {
                    name: name.to_string(),
                    path: project_path,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let manifest = Manifest::parse(&text)?;
        info!(path = %project_path.display(), "Loaded project manifest");
        Ok(payload_from_manifest(name, &manifest))
    }
}

/// Writes `content` to a sibling temporary file, then renames it over `path`.
async fn write_atomic(path: &Path, content: &str) -> Result<(), ProjectError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp_path, content).await?;
    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}
