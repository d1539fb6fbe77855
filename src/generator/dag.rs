//! Airflow DAG file generation.
//!
//! The DAG is first built as a list of [`DagStatement`] records and then
//! rendered by [`DagRenderer`]. The dependency chain comes from
//! [`link_steps`], which walks the steps keeping a *frontier*: the node (or
//! parallel group) that must finish before the next step starts.
//!
//! For steps `[[A], [B, C], [D]]` the chain is:
//!
//! ```text
//! start >> A
//! A >> [B, C]
//! [B, C] >> D
//! D >> end
//! ```

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};

use crate::config::{ProjectConfig, Task};
use crate::generator::{py_quote, resolve_pool, ArtifactGenerator, INDENT};
use crate::settings::Settings;

/// Variable and task id of the opening sentinel.
pub const START_NODE: &str = "start";

/// Variable and task id of the closing sentinel.
pub const END_NODE: &str = "end";

/// Module the DAG imports task callables from.
pub const TREATMENT_MODULE: &str = "src.treatment";

/// A node reference on either side of `>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Single(String),
    /// Tasks of one step; downstream edges attach to the whole group.
    Group(Vec<String>),
}

impl Node {
    /// A single node for one symbol, a group otherwise.
    pub fn from_symbols(mut symbols: Vec<String>) -> Option<Self> {
        match symbols.len() {
            0 => None,
            1 => symbols.pop().map(Node::Single),
            _ => Some(Node::Group(symbols)),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Single(name) => f.write_str(name),
            Node::Group(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

/// A `from >> to` dependency statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: Node,
    pub to: Node,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} >> {}", self.from, self.to)
    }
}

/// Links steps (given as their task symbols) into a linear chain of edges
/// between the `start` and `end` sentinels.
///
/// Steps without tasks are skipped; no steps at all yields `start >> end`.
pub fn link_steps(steps: &[Vec<String>]) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(steps.len() + 1);
    let mut frontier = Node::Single(START_NODE.to_string());

    for symbols in steps {
        let Some(node) = Node::from_symbols(symbols.clone()) else {
            continue;
        };
        edges.push(Edge {
            from: frontier,
            to: node.clone(),
        });
        frontier = node;
    }

    edges.push(Edge {
        from: frontier,
        to: Node::Single(END_NODE.to_string()),
    });
    edges
}

/// A `PythonOperator` construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorDecl {
    /// Variable, task id and callable share this symbol.
    pub symbol: String,
    pub priority_weight: u8,
    pub pool: String,
    pub pool_slots: u8,
}

impl OperatorDecl {
    pub fn for_task(task: &Task, pools: &[String], default_pool: &str) -> Self {
        Self {
            symbol: task.symbol(),
            priority_weight: task.priority.weight(),
            pool: resolve_pool(task, pools, default_pool).to_string(),
            pool_slots: task.pool_slots.get(),
        }
    }
}

/// One statement of the generated DAG file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DagStatement {
    /// Raw import line.
    Import(String),
    Blank,
    Comment(String),
    /// `target = expr`
    Assign { target: String, expr: String },
    /// The `default_args` dict.
    DefaultArgs { owner: String, start_date: NaiveDate },
    /// Opens the `with DAG(...)` block; later statements are indented.
    OpenDag { dag_id: String, schedule_var: String },
    /// `name = DummyOperator(task_id='name')`
    Sentinel(String),
    Operator(OperatorDecl),
    Edge(Edge),
}

/// Renders statements into Python source.
#[derive(Debug, Clone, Default)]
pub struct DagRenderer;

impl DagRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, statements: &[DagStatement]) -> String {
        let mut out = String::new();
        let mut indent = "";

        for statement in statements {
            match statement {
                DagStatement::Blank => out.push('\n'),
                DagStatement::Import(line) => push_line(&mut out, indent, line),
                DagStatement::Comment(text) => push_line(&mut out, indent, &format!("# {}", text)),
                DagStatement::Assign { target, expr } => {
                    push_line(&mut out, indent, &format!("{} = {}", target, expr));
                }
                DagStatement::DefaultArgs { owner, start_date } => {
                    push_line(&mut out, indent, "default_args = {");
                    push_line(
                        &mut out,
                        indent,
                        &format!("{}'owner': {},", INDENT, py_quote(owner, '\'')),
                    );
                    push_line(
                        &mut out,
                        indent,
                        &format!(
                            "{}'start_date': datetime({}, {}, {}),",
                            INDENT,
                            start_date.year(),
                            start_date.month(),
                            start_date.day()
                        ),
                    );
                    push_line(&mut out, indent, "}");
                }
                DagStatement::OpenDag {
                    dag_id,
                    schedule_var,
                } => {
                    let head = format!("with DAG({},", py_quote(dag_id, '\''));
                    let align = " ".repeat("with DAG(".len());
                    push_line(&mut out, indent, &head);
                    push_line(&mut out, indent, &format!("{}default_args=default_args,", align));
                    push_line(
                        &mut out,
                        indent,
                        &format!("{}schedule_interval={},", align, schedule_var),
                    );
                    push_line(&mut out, indent, &format!("{}catchup=False) as dag:", align));
                    indent = INDENT;
                }
                DagStatement::Sentinel(name) => push_line(
                    &mut out,
                    indent,
                    &format!("{} = DummyOperator(task_id={})", name, py_quote(name, '\'')),
                ),
                DagStatement::Operator(op) => {
                    let inner = format!("{}{}", indent, INDENT);
                    push_line(&mut out, indent, &format!("{} = PythonOperator(", op.symbol));
                    push_line(&mut out, &inner, &format!("task_id={},", py_quote(&op.symbol, '\'')));
                    push_line(&mut out, &inner, &format!("python_callable={},", op.symbol));
                    push_line(&mut out, &inner, &format!("priority_weight={},", op.priority_weight));
                    push_line(&mut out, &inner, &format!("pool={},", py_quote(&op.pool, '\'')));
                    push_line(&mut out, &inner, &format!("pool_slots={},", op.pool_slots));
                    push_line(&mut out, &inner, "dag=dag");
                    push_line(&mut out, indent, ")");
                }
                DagStatement::Edge(edge) => push_line(&mut out, indent, &edge.to_string()),
            }
        }

        out
    }
}

fn push_line(out: &mut String, indent: &str, line: &str) {
    out.push_str(indent);
    out.push_str(line);
    out.push('\n');
}

/// Generator for `dag_<project>.py`.
#[derive(Debug, Clone)]
pub struct DagGenerator<'a> {
    settings: &'a Settings,
}

impl<'a> DagGenerator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Builds the statement list for a project.
    pub fn statements(&self, config: &ProjectConfig) -> Vec<DagStatement> {
        let symbols: Vec<String> = config.tasks().map(Task::symbol).collect();

        let mut statements = vec![
            DagStatement::Import("from airflow import DAG".to_string()),
            DagStatement::Import("from airflow.operators.dummy import DummyOperator".to_string()),
            DagStatement::Import("from airflow.operators.python import PythonOperator".to_string()),
            DagStatement::Import("from datetime import datetime".to_string()),
        ];
        if !symbols.is_empty() {
            statements.push(DagStatement::Import(format!(
                "from {} import {}",
                TREATMENT_MODULE,
                symbols.join(", ")
            )));
        }

        let env_name = if config.use_conda {
            config.conda_env.as_str()
        } else {
            self.settings.default_env_name.as_str()
        };
        let schedule = if config.cron.is_empty() {
            "None".to_string()
        } else {
            py_quote(&config.cron, '"')
        };

        statements.extend([
            DagStatement::Blank,
            DagStatement::Comment("--- Configuration ---".to_string()),
            DagStatement::Assign {
                target: "custom_env_name".to_string(),
                expr: py_quote(env_name, '"'),
            },
            DagStatement::Assign {
                target: "schedule_interval".to_string(),
                expr: schedule,
            },
            DagStatement::Blank,
            DagStatement::DefaultArgs {
                owner: config.owner.clone(),
                start_date: self.settings.start_date,
            },
            DagStatement::Blank,
            DagStatement::OpenDag {
                dag_id: config.dag_id(),
                schedule_var: "schedule_interval".to_string(),
            },
            DagStatement::Blank,
            DagStatement::Sentinel(START_NODE.to_string()),
            DagStatement::Sentinel(END_NODE.to_string()),
            DagStatement::Blank,
        ]);

        for task in config.tasks() {
            statements.push(DagStatement::Operator(OperatorDecl::for_task(
                task,
                &config.pools,
                &self.settings.default_pool,
            )));
            statements.push(DagStatement::Blank);
        }

        statements.push(DagStatement::Comment("Pipeline Flow".to_string()));
        let steps: Vec<Vec<String>> = config.pipeline.iter().map(|s| s.symbols()).collect();
        statements.extend(link_steps(&steps).into_iter().map(DagStatement::Edge));

        statements
    }
}

impl ArtifactGenerator for DagGenerator<'_> {
    fn relative_path(&self, config: &ProjectConfig) -> PathBuf {
        PathBuf::from(config.dag_file_name())
    }

    fn generate(&self, config: &ProjectConfig) -> String {
        DagRenderer::new().render(&self.statements(config))
    }
}
