//! Project orchestration: writes generated artifacts into a project
//! directory and recovers a best-effort payload from an existing manifest.
//!
//! # Layout
//!
//! ```text
//! <workspace_root>/<project>/
//!   meta.yaml
//!   dag_<project>.py
//!   README.md
//!   .gitignore
//!   .cicd/pipeline.cicd.yaml
//!   src/__init__.py
//!   src/treatment.py
//!   tests/
//! ```
//!
//! Loading is lossy: only `meta.yaml` is read, so the pipeline comes back as
//! a single placeholder step and the cron expression is empty.

pub mod loader;
pub mod store;

pub use loader::{payload_from_manifest, robin_from_folder, PLACEHOLDER_TASK_NAME, UNKNOWN_ROBIN};
pub use store::{ProjectStore, SaveState, SaveStatus};
