//! Reconstruction of a project payload from its manifest.

use crate::config::{
    normalize_robin, ProjectPayload, StepPayload, TaskPayload, DEFAULT_CONDA_ENV, DEFAULT_SILOT,
};
use crate::generator::Manifest;

/// Robin code reported when the manifest folder cannot be parsed.
pub const UNKNOWN_ROBIN: &str = "unkn";

/// Owner reported when the manifest has no `persoid`.
pub const DEFAULT_OWNER: &str = "jovyan";

/// Name of the single task synthesized on load.
pub const PLACEHOLDER_TASK_NAME: &str = "extract_data";

const PLACEHOLDER_TASK_CODE: &str = "# Loaded from treatment.py";

/// Extracts the robin code from a `<project>/r_<robin>_<project>` folder.
pub fn robin_from_folder(folder: &str) -> Option<String> {
    let (project, rest) = folder.split_once("/r_")?;
    let robin = rest
        .strip_suffix(&format!("_{}", project))
        .or_else(|| rest.split('_').next())
        .filter(|robin| !robin.is_empty())?;
    Some(normalize_robin(robin))
}

/// Builds a payload from what a manifest records.
///
/// Toggles are inferred from key presence. The pipeline graph, task code and
/// cron expression are not part of the manifest; a single placeholder step is
/// returned instead.
pub fn payload_from_manifest(name: &str, manifest: &Manifest) -> ProjectPayload {
    let coderobin = manifest
        .folder
        .as_deref()
        .and_then(robin_from_folder)
        .unwrap_or_else(|| UNKNOWN_ROBIN.to_string());

    let mut placeholder = TaskPayload::new("t1", PLACEHOLDER_TASK_NAME);
    placeholder.code = PLACEHOLDER_TASK_CODE.to_string();

    ProjectPayload {
        nomprojet: name.to_string(),
        coderobin,
        git_remote: String::new(),
        persoid: manifest
            .persoid
            .clone()
            .filter(|owner| !owner.is_empty())
            .unwrap_or_else(|| DEFAULT_OWNER.to_string()),
        lddata: manifest
            .ld_data
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default(),
        use_conda: manifest.env_name.is_some(),
        condaenv: manifest
            .env_name
            .clone()
            .unwrap_or_else(|| DEFAULT_CONDA_ENV.to_string()),
        stage: manifest.stage.clone().unwrap_or_else(|| "LIL".to_string()),
        use_vertica: manifest.silot.is_some(),
        silot: manifest
            .silot
            .clone()
            .unwrap_or_else(|| DEFAULT_SILOT.to_string()),
        use_input: manifest.input_folder.is_some(),
        datalab_in: manifest.input_folder.clone().unwrap_or_default(),
        use_output: manifest.output_folder.is_some(),
        datalab_out: manifest.output_folder.clone().unwrap_or_default(),
        use_nas: manifest.nas,
        use_gpu: manifest.gpu,
        cron: String::new(),
        bundle_base: String::new(),
        prepare_tests: false,
        pipeline: vec![StepPayload {
            id: "s1".to_string(),
            tasks: vec![placeholder],
        }],
        pools: manifest.pools.clone(),
    }
}
