// SPDX-License-Identifier: MIT OR Apache-2.0
//! `vrscene` - writes a .vrscene file from a RON scene description
//!
//! Usage: `vrscene <scene.ron> <out.vrscene> [--settings <file>]
//! [--catalog <file>] [--frames <start>..<end>]`
//!
//! Without `--settings`, `vrscene_export.ron` next to the scene is used if
//! present. Extra catalogs are merged over the builtin plugin schemas.

use std::fs::File;
use std::io::BufWriter;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vrscene_export::settings::SETTINGS_FILE_NAME;
use vrscene_export::{ExportError, ExportSettings, Exporter, ExternalGeometry, VrsceneWriter};
use vrscene_graph::{PluginCatalog, Scene};

const USAGE: &str =
    "usage: vrscene <scene.ron> <out.vrscene> [--settings <file>] [--catalog <file>] [--frames <start>..<end>]";

/// Command line failure
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n{USAGE}")]
    Usage(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Default, PartialEq)]
struct Cli {
    scene: PathBuf,
    output: PathBuf,
    settings: Option<PathBuf>,
    catalogs: Vec<PathBuf>,
    frames: Option<RangeInclusive<i32>>,
}

fn parse_frames(text: &str) -> Option<RangeInclusive<i32>> {
    let (start, end) = text.split_once("..")?;
    let start = start.trim().parse().ok()?;
    let end = end.trim().parse().ok()?;
    (start <= end).then_some(start..=end)
}

fn parse_cli(args: &[String]) -> Result<Cli, CliError> {
    let mut cli = Cli::default();
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" | "--catalog" | "--frames" => {
                let flag = args[i].as_str();
                let Some(value) = args.get(i + 1) else {
                    return Err(CliError::Usage(format!("missing value for {flag}")));
                };
                match flag {
                    "--settings" => cli.settings = Some(PathBuf::from(value)),
                    "--catalog" => cli.catalogs.push(PathBuf::from(value)),
                    _ => {
                        let frames = parse_frames(value)
                            .ok_or_else(|| CliError::Usage(format!("invalid frame range: {value}")))?;
                        cli.frames = Some(frames);
                    }
                }
                i += 2;
            }
            other if other.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown argument: {other}")));
            }
            other => {
                positional.push(PathBuf::from(other));
                i += 1;
            }
        }
    }

    let [scene, output] = <[PathBuf; 2]>::try_from(positional)
        .map_err(|_| CliError::Usage("expected a scene file and an output file".to_string()))?;
    cli.scene = scene;
    cli.output = output;
    Ok(cli)
}

fn load_settings(cli: &Cli) -> Result<ExportSettings, ExportError> {
    let scene_dir = cli.scene.parent().unwrap_or(Path::new("."));
    let mut settings = match &cli.settings {
        Some(path) => ExportSettings::load(path)?,
        None => {
            let default_path = scene_dir.join(SETTINGS_FILE_NAME);
            if default_path.exists() {
                ExportSettings::load(&default_path)?
            } else {
                ExportSettings::default()
            }
        }
    };
    if settings.base_dir.is_none() {
        settings.base_dir = Some(scene_dir.to_path_buf());
    }
    Ok(settings)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let scene = Scene::load(&cli.scene).map_err(ExportError::from)?;
    let mut catalog = PluginCatalog::builtin();
    for path in &cli.catalogs {
        catalog.extend(PluginCatalog::load(path).map_err(ExportError::from)?);
    }
    let settings = load_settings(cli)?;

    tracing::info!(
        "Loaded {}: {} trees, {} materials, {} objects",
        cli.scene.display(),
        scene.node_trees.len(),
        scene.materials.len(),
        scene.objects.len()
    );

    let exporter = Exporter::new(scene, catalog, settings);
    let file = File::create(&cli.output).map_err(ExportError::from)?;
    let mut writer = VrsceneWriter::new(BufWriter::new(file));
    let mut geometry = ExternalGeometry;

    match &cli.frames {
        Some(frames) => {
            exporter.export_animation(frames.clone(), &mut writer, &mut geometry)?;
        }
        None => {
            exporter.export(&mut writer, &mut geometry)?;
        }
    }

    let records = writer.records();
    writer.into_inner().map_err(ExportError::from)?;
    tracing::info!("Wrote {} records to {}", records, cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = parse_cli(&args).and_then(|cli| run(&cli));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ CliError::Usage(_)) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("Export failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_cli() {
        let cli = parse_cli(&args(&[
            "scene.ron",
            "--catalog",
            "extra.ron",
            "out.vrscene",
            "--frames",
            "1..24",
        ]))
        .unwrap();
        assert_eq!(cli.scene, PathBuf::from("scene.ron"));
        assert_eq!(cli.output, PathBuf::from("out.vrscene"));
        assert_eq!(cli.catalogs, [PathBuf::from("extra.ron")]);
        assert_eq!(cli.frames, Some(1..=24));
        assert!(cli.settings.is_none());
    }

    #[test]
    fn test_parse_cli_errors() {
        assert!(matches!(parse_cli(&args(&["scene.ron"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_cli(&args(&["a", "b", "--settings"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_cli(&args(&["a", "b", "--verbose"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_cli(&args(&["a", "b", "--frames", "9..2"])), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_parse_frames() {
        assert_eq!(parse_frames("3..5"), Some(3..=5));
        assert_eq!(parse_frames("-2..0"), Some(-2..=0));
        assert_eq!(parse_frames("7"), None);
    }
}
