//! Raw project payloads and the validation gate.
//!
//! A [`ProjectPayload`] mirrors the wire record sent by callers: enum-valued
//! fields stay plain strings so that a bad value becomes a field error in the
//! report rather than a deserialization failure.

use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::model::{
    PipelineStep, PoolSlots, Priority, ProjectConfig, Stage, Task, TaskKind,
};
use crate::error::{FieldError, ValidationError};
use crate::generator::{sanitize_symbol, symbol_problem};

/// Conda environment used when the payload names none.
pub const DEFAULT_CONDA_ENV: &str = "airflow-ml-3.11";

/// Vertica silot used when the payload names none.
pub const DEFAULT_SILOT: &str = "BANK";

/// Body given to tasks created without code.
pub const DEFAULT_TASK_CODE: &str = "# Add your logic here...";

/// Maximum length of the robin code.
pub const ROBIN_MAX_LEN: usize = 4;

/// Project payload as supplied by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPayload {
    pub nomprojet: String,
    pub coderobin: String,
    pub git_remote: String,
    pub persoid: String,
    pub lddata: String,
    pub use_conda: bool,
    pub condaenv: String,
    pub stage: String,
    pub use_vertica: bool,
    pub silot: String,
    pub use_input: bool,
    pub datalab_in: String,
    pub use_output: bool,
    pub datalab_out: String,
    pub use_nas: bool,
    pub use_gpu: bool,
    pub cron: String,
    pub bundle_base: String,
    pub prepare_tests: bool,
    pub pipeline: Vec<StepPayload>,
    pub pools: Vec<String>,
}

impl Default for ProjectPayload {
    fn default() -> Self {
        Self {
            nomprojet: String::new(),
            coderobin: String::new(),
            git_remote: String::new(),
            persoid: String::new(),
            lddata: String::new(),
            use_conda: false,
            condaenv: DEFAULT_CONDA_ENV.to_string(),
            stage: Stage::default().as_str().to_string(),
            use_vertica: false,
            silot: DEFAULT_SILOT.to_string(),
            use_input: false,
            datalab_in: String::new(),
            use_output: false,
            datalab_out: String::new(),
            use_nas: false,
            use_gpu: false,
            cron: String::new(),
            bundle_base: String::new(),
            prepare_tests: false,
            pipeline: Vec::new(),
            pools: Vec::new(),
        }
    }
}

/// One sequential step of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepPayload {
    pub id: String,
    pub tasks: Vec<TaskPayload>,
}

/// One task of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPayload {
    pub id: String,
    pub name: String,
    pub imports: String,
    pub code: String,
    pub priority: String,
    pub pool_slots: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_pool: Option<String>,
}

impl Default for TaskPayload {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            imports: String::new(),
            code: DEFAULT_TASK_CODE.to_string(),
            priority: Priority::default().as_str().to_string(),
            pool_slots: i64::from(PoolSlots::MIN),
            kind: TaskKind::default().as_str().to_string(),
            selected_pool: None,
        }
    }
}

impl TaskPayload {
    /// Creates a task payload with default metadata.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Collects field errors while walking a payload.
#[derive(Debug, Default)]
struct Report {
    errors: Vec<FieldError>,
}

impl Report {
    fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Unwraps a parse result, recording the failure under `field`.
    fn check<T>(&mut self, field: impl Into<String>, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }
}

impl ProjectPayload {
    /// Parses a payload from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parses a payload from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Validates and normalizes the payload.
    ///
    /// Every violation is collected before failing, so the returned error
    /// names all offending fields at once.
    pub fn validate(self) -> Result<ProjectConfig, ValidationError> {
        let mut report = Report::default();

        if self.nomprojet.trim().is_empty() {
            report.add("nomprojet", "project name must not be empty");
        } else if let Some(problem) =
            project_name_problem(&normalize_project_name(&self.nomprojet))
        {
            report.add("nomprojet", problem);
        }
        if self.coderobin.trim().is_empty() {
            report.add("coderobin", "robin code must not be empty");
        }
        let stage = report.check("stage", self.stage.parse::<Stage>());

        if self.pipeline.is_empty() {
            report.add("pipeline", "pipeline must contain at least one step");
        }

        let mut pipeline = Vec::with_capacity(self.pipeline.len());
        let mut seen_symbols: HashMap<String, String> = HashMap::new();

        for (i, step) in self.pipeline.into_iter().enumerate() {
            if step.tasks.is_empty() {
                report.add(
                    format!("pipeline[{}].tasks", i),
                    "step must contain at least one task",
                );
            }

            let mut tasks = Vec::with_capacity(step.tasks.len());
            for (j, task) in step.tasks.into_iter().enumerate() {
                let path = format!("pipeline[{}].tasks[{}]", i, j);
                if let Some(task) = validate_task(task, &path, &mut report, &mut seen_symbols) {
                    tasks.push(task);
                }
            }
            pipeline.push(PipelineStep::new(step.id, tasks));
        }

        if !report.errors.is_empty() {
            return Err(ValidationError {
                errors: report.errors,
            });
        }

        Ok(ProjectConfig {
            name: normalize_project_name(&self.nomprojet),
            robin: normalize_robin(&self.coderobin),
            git_remote: self.git_remote,
            owner: self.persoid,
            data_domain: self.lddata,
            use_conda: self.use_conda,
            conda_env: self.condaenv,
            stage: stage.unwrap_or_default(),
            use_vertica: self.use_vertica,
            silot: self.silot,
            use_input: self.use_input,
            input_path: self.datalab_in,
            use_output: self.use_output,
            output_path: self.datalab_out,
            use_nas: self.use_nas,
            use_gpu: self.use_gpu,
            cron: self.cron,
            bundle_base: self.bundle_base,
            prepare_tests: self.prepare_tests,
            pipeline,
            pools: dedupe_pools(self.pools),
        })
    }
}

fn validate_task(
    task: TaskPayload,
    path: &str,
    report: &mut Report,
    seen_symbols: &mut HashMap<String, String>,
) -> Option<Task> {
    let priority = report.check(format!("{}.priority", path), task.priority.parse::<Priority>());
    let kind = report.check(format!("{}.type", path), task.kind.parse::<TaskKind>());
    let pool_slots = report.check(
        format!("{}.pool_slots", path),
        PoolSlots::try_from(task.pool_slots),
    );

    if task.name.trim().is_empty() {
        report.add(format!("{}.name", path), "task name must not be empty");
    } else {
        let symbol = sanitize_symbol(&task.name);
        if let Some(problem) = symbol_problem(&symbol) {
            report.add(format!("{}.name", path), problem);
        } else if let Some(first) = seen_symbols.get(&symbol) {
            report.add(
                format!("{}.name", path),
                format!(
                    "task '{}' sanitizes to '{}', which is already used by {}",
                    task.name, symbol, first
                ),
            );
        } else {
            seen_symbols.insert(symbol, format!("'{}' ({})", task.name, path));
        }
    }

    Some(Task {
        id: task.id,
        name: task.name,
        imports: task.imports,
        code: task.code,
        priority: priority?,
        pool_slots: pool_slots?,
        kind: kind?,
        selected_pool: task.selected_pool.filter(|p| !p.is_empty()),
    })
}

/// Lowercases the project name and replaces spaces with underscores.
pub fn normalize_project_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Explains why a normalized project name cannot name a project directory.
///
/// The name becomes a directory under the workspace root, the DAG file name
/// and the `dag_id`, so only ASCII letters, digits, `_` and `-` are allowed.
pub fn project_name_problem(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("project name must not be empty".to_string());
    }
    if name.contains(['/', '\\']) {
        return Some(format!("project name '{}' must not contain path separators", name));
    }
    if name == "." || name == ".." {
        return Some(format!("project name '{}' is not a directory name", name));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Some(format!(
            "project name '{}' contains '{}'; use letters, digits, '_', '-' or spaces",
            name, c
        ));
    }
    None
}

/// Lowercases the robin code and keeps its first four characters.
pub fn normalize_robin(robin: &str) -> String {
    robin.to_lowercase().chars().take(ROBIN_MAX_LEN).collect()
}

fn dedupe_pools(pools: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    pools
        .into_iter()
        .filter(|pool| seen.insert(pool.clone()))
        .collect()
}

impl From<&Task> for TaskPayload {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            imports: task.imports.clone(),
            code: task.code.clone(),
            priority: task.priority.as_str().to_string(),
            pool_slots: i64::from(task.pool_slots),
            kind: task.kind.as_str().to_string(),
            selected_pool: task.selected_pool.clone(),
        }
    }
}

impl From<&ProjectConfig> for ProjectPayload {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            nomprojet: config.name.clone(),
            coderobin: config.robin.clone(),
            git_remote: config.git_remote.clone(),
            persoid: config.owner.clone(),
            lddata: config.data_domain.clone(),
            use_conda: config.use_conda,
            condaenv: config.conda_env.clone(),
            stage: config.stage.as_str().to_string(),
            use_vertica: config.use_vertica,
            silot: config.silot.clone(),
            use_input: config.use_input,
            datalab_in: config.input_path.clone(),
            use_output: config.use_output,
            datalab_out: config.output_path.clone(),
            use_nas: config.use_nas,
            use_gpu: config.use_gpu,
            cron: config.cron.clone(),
            bundle_base: config.bundle_base.clone(),
            prepare_tests: config.prepare_tests,
            pipeline: config
                .pipeline
                .iter()
                .map(|step| StepPayload {
                    id: step.id.clone(),
                    tasks: step.tasks.iter().map(TaskPayload::from).collect(),
                })
                .collect(),
            pools: config.pools.clone(),
        }
    }
}
