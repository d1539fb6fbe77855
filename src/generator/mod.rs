//! Artifact generation for dag-forge projects.
//!
//! This module turns a validated [`ProjectConfig`] into the text of every file
//! a project directory holds:
//!
//! 1. **Manifest** - `meta.yaml` with the project level settings
//! 2. **DAG** - `dag_<project>.py`, operators plus the dependency chain
//! 3. **Task module** - `src/treatment.py`, one callable per task
//! 4. **Companion files** - README, CI pipeline, ignore list and friends
//!
//! All generators are pure: the same config and settings always produce the
//! same bytes. Writing to disk is the job of [`crate::project`].
//!
//! # Example
//!
//! ```ignore
//! use dag_forge::generator::{DagGenerator, ArtifactGenerator};
//! use dag_forge::settings::Settings;
//!
//! let settings = Settings::default();
//! let dag = DagGenerator::new(&settings).generate(&config);
//! ```

pub mod companion;
pub mod dag;
pub mod manifest;
pub mod treatment;

pub use companion::CompanionGenerator;
pub use dag::{link_steps, DagGenerator, DagRenderer, DagStatement, Edge, Node, OperatorDecl};
pub use manifest::{Manifest, ManifestGenerator};
pub use treatment::TreatmentGenerator;

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{ProjectConfig, Task};
use crate::error::GeneratorError;
use crate::settings::Settings;

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Indentation unit of generated Python.
pub const INDENT: &str = "    ";

/// Names bound at module level by the generated DAG file.
pub const RESERVED_SYMBOLS: [&str; 10] = [
    "DAG",
    "DummyOperator",
    "PythonOperator",
    "custom_env_name",
    "dag",
    "datetime",
    "default_args",
    "end",
    "schedule_interval",
    "start",
];

const PYTHON_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Trait for single-file artifact generators.
pub trait ArtifactGenerator {
    /// Path of the artifact relative to the project directory.
    fn relative_path(&self, config: &ProjectConfig) -> PathBuf;

    /// Renders the artifact content.
    fn generate(&self, config: &ProjectConfig) -> String;
}

/// A rendered file, ready to be written under the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
///
/// Shared by the task module and the DAG so both sides agree on symbols.
pub fn sanitize_symbol(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Explains why a sanitized symbol cannot be used in the generated code.
pub fn symbol_problem(symbol: &str) -> Option<String> {
    match symbol.chars().next() {
        None => Some("sanitizes to an empty symbol".to_string()),
        Some(c) if c.is_ascii_digit() => {
            Some(format!("symbol '{}' must not start with a digit", symbol))
        }
        _ if PYTHON_KEYWORDS.contains(&symbol) => {
            Some(format!("symbol '{}' is a Python keyword", symbol))
        }
        _ if RESERVED_SYMBOLS.contains(&symbol) => Some(format!(
            "symbol '{}' is reserved by the generated DAG",
            symbol
        )),
        _ => None,
    }
}

/// Deduplicated, sorted import lines across the whole pipeline.
pub fn collect_imports(config: &ProjectConfig) -> Vec<String> {
    config
        .tasks()
        .flat_map(|task| task.imports.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Pool a task runs in: its own, else the project's first, else `default_pool`.
pub fn resolve_pool<'a>(task: &'a Task, pools: &'a [String], default_pool: &'a str) -> &'a str {
    task.selected_pool
        .as_deref()
        .or_else(|| pools.first().map(String::as_str))
        .unwrap_or(default_pool)
}

/// Quotes a value as a Python string literal.
pub fn py_quote(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// The three core artifacts of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub manifest: String,
    pub dag: String,
    pub treatment: String,
}

impl Artifacts {
    /// Runs the three core generators. They are independent of each other.
    pub fn generate(config: &ProjectConfig, settings: &Settings) -> Self {
        let artifacts = Self {
            manifest: ManifestGenerator::new(settings).generate(config),
            dag: DagGenerator::new(settings).generate(config),
            treatment: TreatmentGenerator::new().generate(config),
        };
        debug!(
            project = %config.name,
            manifest_bytes = artifacts.manifest.len(),
            dag_bytes = artifacts.dag.len(),
            treatment_bytes = artifacts.treatment.len(),
            "Generated core artifacts"
        );
        artifacts
    }
}

/// Renders every file of a project directory, in write order.
pub fn generate_project_files(
    config: &ProjectConfig,
    settings: &Settings,
) -> Result<Vec<GeneratedFile>> {
    let manifest = ManifestGenerator::new(settings);
    let dag = DagGenerator::new(settings);
    let treatment = TreatmentGenerator::new();

    let mut files = vec![
        GeneratedFile::new(manifest.relative_path(config), manifest.generate(config)),
        GeneratedFile::new(dag.relative_path(config), dag.generate(config)),
        GeneratedFile::new(treatment.relative_path(config), treatment.generate(config)),
    ];
    files.extend(CompanionGenerator::new().generate(config)?);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineStep, ProjectPayload, StepPayload, TaskPayload};

    fn config_with(tasks: Vec<TaskPayload>, pools: Vec<&str>) -> ProjectConfig {
        ProjectPayload {
            nomprojet: "demo".to_string(),
            coderobin: "rbta".to_string(),
            pipeline: vec![StepPayload {
                id: "s1".to_string(),
                tasks,
            }],
            pools: pools.into_iter().map(String::from).collect(),
            ..ProjectPayload::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_sanitize_symbol() {
        assert_eq!(sanitize_symbol("extract"), "extract");
        assert_eq!(sanitize_symbol("load-a"), "load_a");
        assert_eq!(sanitize_symbol("load b!"), "load_b_");
        assert_eq!(sanitize_symbol("été"), "_t_");
        assert_eq!(sanitize_symbol("A_1"), "A_1");
    }

    #[test]
    fn test_symbol_problem() {
        assert!(symbol_problem("extract").is_none());
        assert!(symbol_problem("").is_some());
        assert!(symbol_problem("1st_step").is_some());
        assert!(symbol_problem("class").is_some());
        assert!(symbol_problem("start").is_some());
        assert!(symbol_problem("dag").is_some());
    }

    #[test]
    fn test_collect_imports_dedupes_and_sorts() {
        let mut a = TaskPayload::new("t1", "a");
        a.imports = "import pandas as pd\n\n  import os  \n".to_string();
        let mut b = TaskPayload::new("t2", "b");
        b.imports = "import os\nfrom pathlib import Path".to_string();

        let config = config_with(vec![a, b], vec![]);
        assert_eq!(
            collect_imports(&config),
            vec!["from pathlib import Path", "import os", "import pandas as pd"]
        );
    }

    #[test]
    fn test_resolve_pool() {
        let pools = vec!["first".to_string(), "second".to_string()];
        let explicit = Task::new("t1", "a").with_pool("second");
        let implicit = Task::new("t2", "b");

        assert_eq!(resolve_pool(&explicit, &pools, "default_pool"), "second");
        assert_eq!(resolve_pool(&implicit, &pools, "default_pool"), "first");
        assert_eq!(resolve_pool(&implicit, &[], "default_pool"), "default_pool");
    }

    #[test]
    fn test_py_quote() {
        assert_eq!(py_quote("jovyan", '\''), "'jovyan'");
        assert_eq!(py_quote("o'neil", '\''), "'o\\'neil'");
        assert_eq!(py_quote("0 5 * * *", '"'), "\"0 5 * * *\"");
        assert_eq!(py_quote("a\\b", '"'), "\"a\\\\b\"");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = config_with(
            vec![TaskPayload::new("t1", "a"), TaskPayload::new("t2", "b")],
            vec!["p"],
        );
        let settings = Settings::default();
        assert_eq!(
            Artifacts::generate(&config, &settings),
            Artifacts::generate(&config, &settings)
        );
    }

    #[test]
    fn test_project_files_layout() {
        let mut config = config_with(vec![TaskPayload::new("t1", "a")], vec![]);
        config.pipeline.push(PipelineStep::new("s2", vec![Task::new("t2", "b")]));

        let files = generate_project_files(&config, &Settings::default()).unwrap();
        let paths: Vec<String> = files.iter().map(|f| f.path.display().to_string()).collect();

        assert_eq!(&paths[..5], &[
            "meta.yaml",
            "dag_demo.py",
            "src/treatment.py",
            "src/__init__.py",
            "README.md",
        ]);
        assert!(paths.contains(&".gitignore".to_string()));
        assert!(paths.contains(&".cicd/pipeline.cicd.yaml".to_string()));
    }
}
