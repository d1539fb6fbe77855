//! `src/treatment.py` generation: one callable per task.

use std::path::PathBuf;

use crate::config::{ProjectConfig, Task};
use crate::generator::{collect_imports, ArtifactGenerator, INDENT};

/// Path of the task module inside the project directory.
pub const TREATMENT_FILE: &str = "src/treatment.py";

/// Generator for the task implementation module.
#[derive(Debug, Clone, Default)]
pub struct TreatmentGenerator;

impl TreatmentGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Renders one `def <symbol>(**context):` block, newline terminated.
    pub fn render_callable(task: &Task) -> String {
        let mut lines = vec![
            format!("def {}(**context):", task.symbol()),
            format!("{}\"\"\"", INDENT),
            format!("{}Task: {}", INDENT, docstring_text(&task.name)),
            format!("{}Priority: {}", INDENT, task.priority),
            format!("{}Pool Slots: {}", INDENT, task.pool_slots),
            format!("{}\"\"\"", INDENT),
        ];
        lines.extend(indent_body(&task.code));
        lines.join("\n") + "\n"
    }
}

impl ArtifactGenerator for TreatmentGenerator {
    fn relative_path(&self, _config: &ProjectConfig) -> PathBuf {
        PathBuf::from(TREATMENT_FILE)
    }

    fn generate(&self, config: &ProjectConfig) -> String {
        let mut content = String::new();

        let imports = collect_imports(config);
        if !imports.is_empty() {
            content.push_str(&imports.join("\n"));
            content.push_str("\n\n");
        }

        let callables: Vec<String> = config.tasks().map(Self::render_callable).collect();
        content.push_str(&callables.join("\n\n"));
        content
    }
}

/// Indents the body by one unit. Blank lines stay empty and an empty body
/// becomes `pass`.
fn indent_body(code: &str) -> Vec<String> {
    if code.trim().is_empty() {
        return vec![format!("{}pass", INDENT)];
    }
    code.trim_end()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect()
}

/// Keeps a display name from closing the docstring early.
fn docstring_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}
