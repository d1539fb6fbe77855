//! CLI command definitions for dag-forge.
//!
//! Each subcommand reads a project payload (JSON or YAML, chosen by file
//! extension) or a project name and drives the library.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use crate::config::ProjectPayload;
use crate::generator::{ArtifactGenerator, DagGenerator, ManifestGenerator, TreatmentGenerator};
use crate::project::ProjectStore;
use crate::settings::Settings;

/// Airflow project generator.
#[derive(Parser)]
#[command(name = "dag-forge")]
#[command(about = "Generate Airflow DAG projects from declarative pipeline descriptions")]
#[command(version)]
#[command(
    long_about = "dag-forge turns a project payload (steps of parallel tasks plus environment flags) into meta.yaml, an Airflow DAG and a task module.\n\nExample usage:\n  dag-forge save project.json --root ./workspaces\n  dag-forge render project.yaml --artifact dag"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Validate a payload and print the normalized configuration.
    Validate(PayloadArgs),

    /// Print one generated artifact to stdout.
    Render(RenderArgs),

    /// Validate a payload and write the project directory.
    Save(SaveArgs),

    /// Reconstruct a payload from an existing project's manifest.
    Load(LoadArgs),
}

/// Arguments naming a payload file.
#[derive(Parser, Debug)]
pub struct PayloadArgs {
    /// Payload file (.json, .yaml or .yml).
    pub payload: PathBuf,
}

/// Artifact selector for `render`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Meta,
    Dag,
    Treatment,
}

/// Arguments for `dag-forge render`.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Payload file (.json, .yaml or .yml).
    pub payload: PathBuf,

    /// Artifact to print.
    #[arg(short, long, value_enum, default_value = "dag")]
    pub artifact: ArtifactKind,
}

/// Arguments for `dag-forge save`.
#[derive(Parser, Debug)]
pub struct SaveArgs {
    /// Payload file (.json, .yaml or .yml).
    pub payload: PathBuf,

    /// Workspace root (overrides DAG_FORGE_WORKSPACE_ROOT).
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Arguments for `dag-forge load`.
#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Project name (directory under the workspace root).
    pub name: String,

    /// Workspace root (overrides DAG_FORGE_WORKSPACE_ROOT).
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run with already parsed CLI arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    match cli.command {
        Commands::Validate(args) => run_validate_command(args),
        Commands::Render(args) => run_render_command(args, &settings),
        Commands::Save(args) => run_save_command(args, settings).await,
        Commands::Load(args) => run_load_command(args, settings).await,
    }
}

fn run_validate_command(args: PayloadArgs) -> anyhow::Result<()> {
    let config = read_payload(&args.payload)?.validate()?;
    let normalized = ProjectPayload::from(&config);
    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}

fn run_render_command(args: RenderArgs, settings: &Settings) -> anyhow::Result<()> {
    let config = read_payload(&args.payload)?.validate()?;
    let text = match args.artifact {
        ArtifactKind::Meta => ManifestGenerator::new(settings).generate(&config),
        ArtifactKind::Dag => DagGenerator::new(settings).generate(&config),
        ArtifactKind::Treatment => TreatmentGenerator::new().generate(&config),
    };
    print!("{}", text);
    Ok(())
}

async fn run_save_command(args: SaveArgs, settings: Settings) -> anyhow::Result<()> {
    let settings = apply_root(settings, args.root);
    let payload = read_payload(&args.payload)?;
    let status = ProjectStore::new(settings).save(payload).await?;
    info!(path = %status.path.display(), "Project saved");
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn run_load_command(args: LoadArgs, settings: Settings) -> anyhow::Result<()> {
    let settings = apply_root(settings, args.root);
    let payload = ProjectStore::new(settings).load(&args.name).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn apply_root(settings: Settings, root: Option<PathBuf>) -> Settings {
    match root {
        Some(root) => settings.with_workspace_root(root),
        None => settings,
    }
}

/// Reads a payload file, picking the format from its extension.
pub fn read_payload(path: &Path) -> anyhow::Result<ProjectPayload> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

    let payload = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ProjectPayload::from_yaml(&text)?,
        _ => ProjectPayload::from_json(&text)?,
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_args() {
        let cli = Cli::try_parse_from(["dag-forge", "render", "p.json", "--artifact", "meta"]).unwrap();
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.artifact, ArtifactKind::Meta);
                assert_eq!(args.payload, PathBuf::from("p.json"));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_read_payload_by_extension() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("p.json");
        let yaml = dir.path().join("p.yml");
        fs::write(&json, r#"{"nomprojet": "a", "coderobin": "b"}"#).unwrap();
        fs::write(&yaml, "nomprojet: a\ncoderobin: b\n").unwrap();

        assert_eq!(read_payload(&json).unwrap(), read_payload(&yaml).unwrap());
        assert!(read_payload(&dir.path().join("missing.json")).is_err());
    }
}
