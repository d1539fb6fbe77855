//! Validated, normalized project model.
//!
//! Values of these types only come out of [`ProjectPayload::validate`]
//! (or are built directly in tests), so the generators never re-check them.
//!
//! [`ProjectPayload::validate`]: crate::config::ProjectPayload::validate

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generator::sanitize_symbol;

/// Scheduling priority of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Mid,
    #[default]
    Low,
}

impl Priority {
    /// Numeric Airflow priority weight.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Mid => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Mid => "mid",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "mid" => Ok(Priority::Mid),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}', expected high, mid or low", other)),
        }
    }
}

/// Deployment stage of the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    #[serde(rename = "LIL")]
    Lil,
    #[serde(rename = "SXB")]
    Sxb,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Lil => "LIL",
            Stage::Sxb => "SXB",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIL" => Ok(Stage::Lil),
            "SXB" => Ok(Stage::Sxb),
            other => Err(format!("unknown stage '{}', expected LIL or SXB", other)),
        }
    }
}

/// Kind of task body. Generation currently treats every kind as Python.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    Python,
    Bash,
    Dummy,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Python => "python",
            TaskKind::Bash => "bash",
            TaskKind::Dummy => "dummy",
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(TaskKind::Python),
            "bash" => Ok(TaskKind::Bash),
            "dummy" => Ok(TaskKind::Dummy),
            other => Err(format!(
                "unknown task type '{}', expected python, bash or dummy",
                other
            )),
        }
    }
}

/// Number of pool slots a task occupies, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PoolSlots(u8);

impl PoolSlots {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for PoolSlots {
    fn default() -> Self {
        PoolSlots(Self::MIN)
    }
}

impl TryFrom<i64> for PoolSlots {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            // Bounded above by MAX, so the cast cannot truncate.
            Ok(PoolSlots(value as u8))
        } else {
            Err(format!(
                "pool_slots must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<PoolSlots> for i64 {
    fn from(slots: PoolSlots) -> Self {
        i64::from(slots.0)
    }
}

impl fmt::Display for PoolSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of generated work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    /// Display name; the generated symbol is derived from it.
    pub name: String,
    /// Newline separated import statements.
    pub imports: String,
    pub code: String,
    pub priority: Priority,
    pub pool_slots: PoolSlots,
    pub kind: TaskKind,
    /// Explicit pool, overriding the project's first pool.
    pub selected_pool: Option<String>,
}

impl Task {
    /// Creates a python task with default scheduling metadata.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            imports: String::new(),
            code: String::new(),
            priority: Priority::default(),
            pool_slots: PoolSlots::default(),
            kind: TaskKind::default(),
            selected_pool: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_imports(mut self, imports: impl Into<String>) -> Self {
        self.imports = imports.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.selected_pool = Some(pool.into());
        self
    }

    pub fn with_pool_slots(mut self, slots: PoolSlots) -> Self {
        self.pool_slots = slots;
        self
    }

    /// Symbol used for both the callable and the DAG node.
    pub fn symbol(&self) -> String {
        sanitize_symbol(&self.name)
    }
}

/// Tasks that run in parallel; steps run one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub id: String,
    pub tasks: Vec<Task>,
}

impl PipelineStep {
    pub fn new(id: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: id.into(),
            tasks,
        }
    }

    /// Sanitized symbols of this step's tasks, in task order.
    pub fn symbols(&self) -> Vec<String> {
        self.tasks.iter().map(Task::symbol).collect()
    }
}

/// The root of a validated pipeline description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Lowercase, spaces replaced by underscores.
    pub name: String,
    /// Lowercase, at most four characters.
    pub robin: String,
    pub git_remote: String,
    pub owner: String,
    pub data_domain: String,
    pub use_conda: bool,
    pub conda_env: String,
    pub stage: Stage,
    pub use_vertica: bool,
    pub silot: String,
    pub use_input: bool,
    pub input_path: String,
    pub use_output: bool,
    pub output_path: String,
    pub use_nas: bool,
    pub use_gpu: bool,
    /// Empty means the DAG is triggered manually.
    pub cron: String,
    pub bundle_base: String,
    pub prepare_tests: bool,
    pub pipeline: Vec<PipelineStep>,
    /// Ordered, duplicate free.
    pub pools: Vec<String>,
}

impl ProjectConfig {
    /// Iterates every task in step-then-task order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.pipeline.iter().flat_map(|step| step.tasks.iter())
    }

    /// `<project>/r_<robin>_<project>`
    pub fn folder(&self) -> String {
        format!("{}/r_{}_{}", self.name, self.robin, self.name)
    }

    /// Name of the DAG file written at the project root.
    pub fn dag_file_name(&self) -> String {
        format!("dag_{}.py", self.name)
    }

    /// Airflow `dag_id`.
    pub fn dag_id(&self) -> String {
        format!("dag_{}", self.name.replace('-', "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_weights() {
        assert_eq!(Priority::High.weight(), 3);
        assert_eq!(Priority::Mid.weight(), 2);
        assert_eq!(Priority::Low.weight(), 1);
        assert_eq!(Priority::default().weight(), 1);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("mid".parse::<Priority>().unwrap(), Priority::Mid);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!("SXB".parse::<Stage>().unwrap(), Stage::Sxb);
        assert!("sxb".parse::<Stage>().is_err());
        assert_eq!("bash".parse::<TaskKind>().unwrap(), TaskKind::Bash);
        assert!("java".parse::<TaskKind>().is_err());
    }

    #[test]
    fn test_pool_slots_bounds() {
        assert!(PoolSlots::try_from(0).is_err());
        assert_eq!(PoolSlots::try_from(1).unwrap().get(), 1);
        assert_eq!(PoolSlots::try_from(5).unwrap().get(), 5);
        assert!(PoolSlots::try_from(6).is_err());
        assert!(PoolSlots::try_from(-1).is_err());
    }

    #[test]
    fn test_stage_serde_wire_form() {
        assert_eq!(serde_json::to_string(&Stage::Lil).unwrap(), "\"LIL\"");
        let stage: Stage = serde_json::from_str("\"SXB\"").unwrap();
        assert_eq!(stage, Stage::Sxb);
    }

    #[test]
    fn test_folder_and_dag_id() {
        let config = ProjectConfig {
            name: "my-proj".to_string(),
            robin: "rbta".to_string(),
            git_remote: String::new(),
            owner: String::new(),
            data_domain: String::new(),
            use_conda: false,
            conda_env: String::new(),
            stage: Stage::Lil,
            use_vertica: false,
            silot: String::new(),
            use_input: false,
            input_path: String::new(),
            use_output: false,
            output_path: String::new(),
            use_nas: false,
            use_gpu: false,
            cron: String::new(),
            bundle_base: String::new(),
            prepare_tests: false,
            pipeline: Vec::new(),
            pools: Vec::new(),
        };

        assert_eq!(config.folder(), "my-proj/r_rbta_my-proj");
        assert_eq!(config.dag_id(), "dag_my_proj");
        assert_eq!(config.dag_file_name(), "dag_my-proj.py");
    }

    #[test]
    fn test_step_symbols() {
        let step = PipelineStep::new(
            "s1",
            vec![Task::new("t1", "load-a"), Task::new("t2", "load b!")],
        );
        assert_eq!(step.symbols(), vec!["load_a", "load_b_"]);
    }
}
