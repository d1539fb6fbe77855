//! End-to-end tests for project generation.
//!
//! These drive the public API from a JSON payload through validation,
//! the three generators and the project store.

use dag_forge::config::{ProjectPayload, StepPayload, TaskPayload};
use dag_forge::generator::{
    sanitize_symbol, ArtifactGenerator, Artifacts, DagGenerator, TreatmentGenerator,
};
use dag_forge::project::{ProjectStore, SaveState};
use dag_forge::{ProjectError, Settings};
use tempfile::TempDir;

const DEMO_PAYLOAD: &str = r#"{
    "nomprojet": "demo",
    "coderobin": "RBTA",
    "git_remote": "git@example.com:team/demo.git",
    "persoid": "jovyan",
    "lddata": "marketing",
    "pipeline": [
        {"id": "s1", "tasks": [
            {"id": "t1", "name": "extract", "priority": "low", "pool_slots": 1,
             "imports": "import pandas as pd", "code": "df = pd.DataFrame()"}
        ]},
        {"id": "s2", "tasks": [
            {"id": "t2", "name": "load-a", "priority": "mid", "imports": "import os\nimport pandas as pd"},
            {"id": "t3", "name": "load b!", "priority": "mid"}
        ]}
    ],
    "pools": ["marketing_std_pool"]
}"#;

fn demo_artifacts() -> Artifacts {
    let config = ProjectPayload::from_json(DEMO_PAYLOAD)
        .unwrap()
        .validate()
        .unwrap();
    Artifacts::generate(&config, &Settings::default())
}

/// Returns the position of each needle, asserting they appear in order.
fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        let pos = haystack[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("'{}' not found after byte {}", needle, from));
        from += pos + needle.len();
    }
}

#[test]
fn test_demo_manifest_folder() {
    let artifacts = demo_artifacts();
    assert!(artifacts.manifest.starts_with("folder: demo/r_rbta_demo\n"));
    assert!(artifacts.manifest.contains("pools:\n  - marketing_std_pool\n"));
    assert!(artifacts.manifest.ends_with('\n') && !artifacts.manifest.ends_with("\n\n"));
}

#[test]
fn test_demo_treatment_callables() {
    let artifacts = demo_artifacts();
    assert!(artifacts
        .treatment
        .starts_with("import os\nimport pandas as pd\n\ndef extract(**context):\n"));
    assert_in_order(
        &artifacts.treatment,
        &["def extract(**context):", "def load_a(**context):", "def load_b_(**context):"],
    );
    assert!(artifacts.treatment.contains("    Task: load b!\n"));
    assert!(artifacts.treatment.contains("    df = pd.DataFrame()\n"));
}

#[test]
fn test_demo_dag_chain_and_weights() {
    let artifacts = demo_artifacts();
    let dag = &artifacts.dag;

    assert!(dag.contains("from src.treatment import extract, load_a, load_b_\n"));
    assert_in_order(
        dag,
        &[
            "start >> extract",
            "extract >> [load_a, load_b_]",
            "[load_a, load_b_] >> end",
        ],
    );
    assert_in_order(
        dag,
        &[
            "task_id='load_a',",
            "priority_weight=2,",
            "pool='marketing_std_pool',",
            "task_id='load_b_',",
            "priority_weight=2,",
        ],
    );
    assert_in_order(dag, &["task_id='extract',", "priority_weight=1,"]);
}

#[test]
fn test_three_step_linearization() {
    let payload = ProjectPayload {
        nomprojet: "chain".to_string(),
        coderobin: "abcd".to_string(),
        pipeline: vec![
            StepPayload { id: "1".into(), tasks: vec![TaskPayload::new("a", "A")] },
            StepPayload {
                id: "2".into(),
                tasks: vec![TaskPayload::new("b", "B"), TaskPayload::new("c", "C")],
            },
            StepPayload { id: "3".into(), tasks: vec![TaskPayload::new("d", "D")] },
        ],
        ..ProjectPayload::default()
    };
    let config = payload.validate().unwrap();
    let dag = DagGenerator::new(&Settings::default()).generate(&config);

    let edges: Vec<&str> = dag.lines().map(str::trim).filter(|l| l.contains(">>")).collect();
    assert_eq!(edges, vec!["start >> A", "A >> [B, C]", "[B, C] >> D", "D >> end"]);
}

#[test]
fn test_symbols_agree_between_module_and_dag() {
    let config = ProjectPayload::from_json(DEMO_PAYLOAD)
        .unwrap()
        .validate()
        .unwrap();
    let treatment = TreatmentGenerator::new().generate(&config);
    let dag = DagGenerator::new(&Settings::default()).generate(&config);

    for task in config.tasks() {
        let symbol = sanitize_symbol(&task.name);
        assert!(treatment.contains(&format!("def {}(**context):", symbol)));
        assert!(dag.contains(&format!("python_callable={},", symbol)));
    }
}

#[test]
fn test_generation_is_byte_for_byte_stable() {
    assert_eq!(demo_artifacts(), demo_artifacts());
}

#[tokio::test]
async fn test_save_then_load_round_trips_manifest_fields() {
    let dir = TempDir::new().unwrap();
    let store = ProjectStore::new(Settings::new().with_workspace_root(dir.path()));

    let mut payload = ProjectPayload::from_json(DEMO_PAYLOAD).unwrap();
    payload.use_conda = true;
    payload.condaenv = "X".to_string();
    payload.use_vertica = true;
    payload.silot = "EIT".to_string();
    payload.use_gpu = true;
    payload.use_input = true;
    payload.datalab_in = "/data/in".to_string();
    payload.use_output = true;
    payload.datalab_out = "exports".to_string();

    let status = store.save(payload).await.unwrap();
    assert_eq!(status.status, SaveState::Created);

    let dag = std::fs::read_to_string(status.path.join("dag_demo.py")).unwrap();
    assert!(dag.contains("custom_env_name = \"X\""));

    let loaded = store.load("demo").await.unwrap();
    assert!(loaded.use_conda);
    assert_eq!(loaded.condaenv, "X");
    assert!(loaded.use_vertica);
    assert_eq!(loaded.silot, "EIT");
    assert!(loaded.use_gpu);
    assert!(!loaded.use_nas);
    assert!(loaded.use_input);
    assert_eq!(loaded.datalab_in, "/data/in");
    assert!(loaded.use_output);
    assert_eq!(
        loaded.datalab_out,
        dir.path().join("exports").display().to_string()
    );
    assert_eq!(loaded.coderobin, "rbta");
    assert_eq!(loaded.pools, vec!["marketing_std_pool"]);
}

#[tokio::test]
async fn test_yaml_significant_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = ProjectStore::new(Settings::new().with_workspace_root(dir.path()));

    let mut payload = ProjectPayload::from_json(DEMO_PAYLOAD).unwrap();
    payload.persoid = "team: data".to_string();
    payload.use_conda = true;
    payload.condaenv = "env #1".to_string();
    payload.use_vertica = true;
    payload.silot = "null".to_string();
    payload.use_input = true;
    payload.datalab_in = "/data/~".to_string();
    payload.use_output = true;
    payload.datalab_out = "/data/out #final".to_string();
    payload.pools = vec!["null".to_string(), "gpu: large".to_string()];

    store.save(payload).await.unwrap();
    let loaded = store.load("demo").await.unwrap();

    assert_eq!(loaded.persoid, "team: data");
    assert!(loaded.use_conda);
    assert_eq!(loaded.condaenv, "env #1");
    assert!(loaded.use_vertica);
    assert_eq!(loaded.silot, "null");
    assert_eq!(loaded.datalab_in, "/data/~");
    assert_eq!(loaded.datalab_out, "/data/out #final");
    assert_eq!(loaded.pools, vec!["null", "gpu: large"]);
    assert_eq!(loaded.coderobin, "rbta");
}

#[tokio::test]
async fn test_save_rejects_escaping_project_name() {
    let dir = TempDir::new().unwrap();
    let store = ProjectStore::new(Settings::new().with_workspace_root(dir.path().join("ws")));

    let mut payload = ProjectPayload::from_json(DEMO_PAYLOAD).unwrap();
    payload.nomprojet = "../escaped".to_string();

    match store.save(payload).await {
        Err(ProjectError::Validation(err)) => assert!(err.has_field("nomprojet")),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(!dir.path().join("escaped").exists());
}

#[tokio::test]
async fn test_load_unknown_project_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = ProjectStore::new(Settings::new().with_workspace_root(dir.path()));
    assert!(matches!(
        store.load("ghost").await,
        Err(ProjectError::NotFound { .. })
    ));
}
