//! Static and lightly templated files written next to the core artifacts.

use tera::{Context, Tera};

use crate::config::ProjectConfig;
use crate::generator::{GeneratedFile, Result};

const README_TEMPLATE: &str = "\
# {{ name }}

Generated by dag-forge

## Project Info
- Owner: {{ owner }}
- Stage: {{ stage }}
- LD Data: {{ data_domain }}

## Deployment
Follow the GitOps workflow in the Deployment Cockpit.
";

const CICD_TEMPLATE: &str = "\
stages:
  - build
  - deploy

build:
  stage: build
  script: echo \"Building...\"

deploy:
  stage: deploy
  component: {{ name }}
  script: echo \"Deploying...\"
";

const GITIGNORE: &str = "\
.DS_Store
__pycache__/
*.pyc
.env
.ipynb_checkpoints/
";

const CONDA_REQUIREMENTS: &str = "# Conda requirements\npandas\nnumpy\n";

const AIRFLOW_TEST_CFG: &str = "load_examples = False\n";

/// Generator for the README, CI pipeline and environment stubs.
#[derive(Debug, Clone, Default)]
pub struct CompanionGenerator;

impl CompanionGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Renders companion files in write order.
    ///
    /// `airflow-python-311.txt` is written when conda is on, otherwise
    /// `BUNDLE_AIRFLOW.txt` when a bundle base is set. `airflow.cfg` only
    /// exists for projects that prepare tests.
    pub fn generate(&self, config: &ProjectConfig) -> Result<Vec<GeneratedFile>> {
        let context = Self::context(config);

        let mut files = vec![
            GeneratedFile::new("src/__init__.py", ""),
            GeneratedFile::new("README.md", Tera::one_off(README_TEMPLATE, &context, false)?),
            GeneratedFile::new(".gitignore", GITIGNORE),
            GeneratedFile::new(
                ".cicd/pipeline.cicd.yaml",
                Tera::one_off(CICD_TEMPLATE, &context, false)?,
            ),
        ];

        if config.use_conda {
            files.push(GeneratedFile::new("airflow-python-311.txt", CONDA_REQUIREMENTS));
        } else if !config.bundle_base.is_empty() {
            files.push(GeneratedFile::new(
                "BUNDLE_AIRFLOW.txt",
                format!("{}\n", config.bundle_base),
            ));
        }

        if config.prepare_tests {
            files.push(GeneratedFile::new("airflow.cfg", AIRFLOW_TEST_CFG));
        }

        Ok(files)
    }

    fn context(config: &ProjectConfig) -> Context {
        let mut context = Context::new();
        context.insert("name", &config.name);
        context.insert("owner", &config.owner);
        context.insert("stage", config.stage.as_str());
        context.insert("data_domain", &config.data_domain);
        context
    }
}
