//! Project configuration model.
//!
//! [`ProjectPayload`] is the raw record callers send; [`ProjectPayload::validate`]
//! is the single gate that turns it into a normalized [`ProjectConfig`].
//! Generators only ever see the latter.
//!
//! # Example
//!
//! ```ignore
//! use dag_forge::config::ProjectPayload;
//!
//! let payload = ProjectPayload::from_json(&std::fs::read_to_string("project.json")?)?;
//! let config = payload.validate()?;
//! println!("folder: {}", config.folder());
//! ```

pub mod model;
pub mod payload;

pub use model::{PipelineStep, PoolSlots, Priority, ProjectConfig, Stage, Task, TaskKind};
pub use payload::{
    normalize_project_name, normalize_robin, project_name_problem, ProjectPayload, StepPayload,
    TaskPayload, DEFAULT_CONDA_ENV, DEFAULT_SILOT, DEFAULT_TASK_CODE,
};
