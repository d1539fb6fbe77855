//! `meta.yaml` generation and parsing.
//!
//! The manifest carries project level settings only. Keys are written in a
//! fixed order; optional keys appear only when their toggle is on and their
//! value is non-empty, and boolean flags are written only when true.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_yaml::Value;

use crate::config::ProjectConfig;
use crate::generator::ArtifactGenerator;
use crate::settings::Settings;

/// File name of the manifest inside the project directory.
pub const MANIFEST_FILE: &str = "meta.yaml";

/// Generator for `meta.yaml`.
#[derive(Debug, Clone)]
pub struct ManifestGenerator<'a> {
    settings: &'a Settings,
}

impl<'a> ManifestGenerator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl ArtifactGenerator for ManifestGenerator<'_> {
    fn relative_path(&self, _config: &ProjectConfig) -> PathBuf {
        PathBuf::from(MANIFEST_FILE)
    }

    fn generate(&self, config: &ProjectConfig) -> String {
        let mut lines = Vec::new();

        lines.push(format!("folder: {}", yaml_scalar(&config.folder(), "")));
        lines.push(format!("stage: {}", config.stage));
        lines.push(format!(
            "ld_data: {}",
            yaml_scalar(&config.data_domain.to_uppercase(), "")
        ));
        lines.push(format!("persoid: {}", yaml_scalar(&config.owner, "")));

        if !config.pools.is_empty() {
            lines.push("pools:".to_string());
            for pool in &config.pools {
                lines.push(format!("  - {}", yaml_scalar(pool, "    ")));
            }
        }

        if config.use_vertica && !config.silot.is_empty() {
            lines.push(format!("silot: {}", yaml_scalar(&config.silot, "")));
        }

        if config.use_conda && !config.conda_env.is_empty() {
            lines.push(format!("env_name: {}", yaml_scalar(&config.conda_env, "")));
        }

        if config.use_input && !config.input_path.is_empty() {
            lines.push(format!(
                "input_folder: {}",
                yaml_scalar(&self.settings.absolute_data_path(&config.input_path), "")
            ));
        }

        if config.use_output && !config.output_path.is_empty() {
            lines.push(format!(
                "output_folder: {}",
                yaml_scalar(&self.settings.absolute_data_path(&config.output_path), "")
            ));
        }

        if config.use_nas {
            lines.push("NAS: true".to_string());
        }

        if config.use_gpu {
            lines.push("GPU: true".to_string());
        }

        lines.join("\n") + "\n"
    }
}

/// Renders a string as a YAML scalar.
///
/// Plain strings stay plain; anything YAML would read back differently
/// (`null`, `#`, `: `, leading quotes, numbers) comes out quoted.
/// Continuation lines of block scalars get `indent`.
fn yaml_scalar(value: &str, indent: &str) -> String {
    match serde_yaml::to_string(&Value::String(value.to_string())) {
        Ok(text) => text
            .trim_start_matches("--- ")
            .trim_end_matches('\n')
            .replace('\n', &format!("\n{}", indent)),
        // Serializing a lone string does not fail in practice.
        Err(_) => format!("{:?}", value),
    }
}

/// Settings recovered from a previously written manifest.
///
/// Absent keys stay `None` / empty / false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub folder: Option<String>,
    pub stage: Option<String>,
    pub ld_data: Option<String>,
    pub persoid: Option<String>,
    pub pools: Vec<String>,
    pub silot: Option<String>,
    pub env_name: Option<String>,
    pub input_folder: Option<String>,
    pub output_folder: Option<String>,
    pub nas: bool,
    pub gpu: bool,
}

impl Manifest {
    /// Parses manifest text.
    ///
    /// Scalars are read leniently: an owner written as `persoid: 1234` comes
    /// back as the string `"1234"`.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        let map: BTreeMap<String, Value> = if text.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_yaml::from_str(text)?
        };

        let scalar = |key: &str| map.get(key).and_then(scalar_string);
        let flag = |key: &str| matches!(map.get(key), Some(Value::Bool(true)));

        let pools = match map.get("pools") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            folder: scalar("folder"),
            stage: scalar("stage"),
            ld_data: scalar("ld_data"),
            persoid: scalar("persoid"),
            pools,
            silot: scalar("silot"),
            env_name: scalar("env_name"),
            input_folder: scalar("input_folder"),
            output_folder: scalar("output_folder"),
            nas: flag("NAS"),
            gpu: flag("GPU"),
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
