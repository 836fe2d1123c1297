use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use manifest_merge::{
    AssemblerConfig, AssemblyReport, LoaderId, ManifestFiles, ManifestProcessor, Requirement,
    RequirementProvider,
};

#[derive(Debug, Parser)]
#[command(
    name = "manifest-merge",
    version,
    about = "Merge loader requirements into Android manifest files"
)]
struct Args {
    /// Exported project directory holding src/main/AndroidManifest.xml
    #[arg(short, long, value_name = "DIR")]
    project: PathBuf,
    /// Package directory holding xrmanifest.androidlib (defaults to the project)
    #[arg(long, value_name = "DIR")]
    package: Option<PathBuf>,
    /// XR library manifest template (overrides --package)
    #[arg(short, long, value_name = "FILE")]
    template: Option<PathBuf>,
    /// Requirement JSON file, one object or an array; `-` reads stdin
    #[arg(short, long = "requirements", value_name = "FILE")]
    requirements: Vec<PathBuf>,
    /// Active loader identifier
    #[arg(short, long = "loader", value_name = "ID")]
    loaders: Vec<String>,
    /// Settings JSON file; command-line flags take precedence
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Write every entry into the library manifest
    #[arg(long)]
    single: bool,
    /// Add the classic activity entry
    #[arg(long, overrides_with = "no_classic")]
    classic: bool,
    #[arg(long, overrides_with = "classic")]
    no_classic: bool,
    /// Add the alternate (game activity) entry
    #[arg(long)]
    alternate: bool,
    /// Delete the library manifest and exit
    #[arg(long)]
    cleanup: bool,
    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Settings {
    active_loaders: Option<BTreeSet<LoaderId>>,
    split_manifest_supported: Option<bool>,
    use_classic_activity_entry: Option<bool>,
    use_alternate_activity_entry: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequirementFile {
    Many(Vec<Requirement>),
    One(Requirement),
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let package = args.package.as_deref().unwrap_or(&args.project);
    let mut files = ManifestFiles::new(&args.project, package);
    if let Some(template) = &args.template {
        files = files.with_template(template);
    }

    if args.cleanup {
        if files.cleanup() {
            println!("removed {}", files.library_manifest().display());
        } else {
            println!("nothing removed");
        }
        return Ok(());
    }

    let settings = match &args.settings {
        Some(path) => read_settings(path)?,
        None => Settings::default(),
    };
    let config = resolve_config(&args, &settings);
    let active_loaders = resolve_loaders(&args.loaders, settings.active_loaders);
    debug!(?config, ?active_loaders, "resolved configuration");

    let requirements = read_requirements(&args.requirements)?;
    let providers: Vec<&dyn RequirementProvider> = requirements
        .iter()
        .map(|requirement| requirement as &dyn RequirementProvider)
        .collect();

    let report = ManifestProcessor::new(files, config)
        .process(&providers, active_loaders.as_ref())
        .context("failed to process manifests")?;

    print_report(&report);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve_config(args: &Args, settings: &Settings) -> AssemblerConfig {
    let defaults = AssemblerConfig::default();
    let classic = if args.classic {
        Some(true)
    } else if args.no_classic {
        Some(false)
    } else {
        settings.use_classic_activity_entry
    };

    AssemblerConfig {
        split_manifest_supported: !args.single
            && settings
                .split_manifest_supported
                .unwrap_or(defaults.split_manifest_supported),
        use_classic_activity_entry: classic.unwrap_or(defaults.use_classic_activity_entry),
        use_alternate_activity_entry: args.alternate
            || settings
                .use_alternate_activity_entry
                .unwrap_or(defaults.use_alternate_activity_entry),
        ..defaults
    }
}

/// Loaders named on the command line win; no source at all means unresolved
fn resolve_loaders(cli: &[String], settings: Option<BTreeSet<LoaderId>>) -> Option<BTreeSet<LoaderId>> {
    if cli.is_empty() {
        return settings;
    }
    Some(cli.iter().map(LoaderId::new).collect())
}

fn read_settings(path: &Path) -> Result<Settings> {
    let data = read_input(path)?;
    serde_json::from_str(&data).with_context(|| format!("invalid settings in {}", path.display()))
}

fn read_requirements(paths: &[PathBuf]) -> Result<Vec<Requirement>> {
    let mut requirements = Vec::new();
    for path in paths {
        let data = read_input(path)?;
        let file: RequirementFile = serde_json::from_str(&data)
            .with_context(|| format!("invalid requirements in {}", path.display()))?;
        match file {
            RequirementFile::Many(list) => requirements.extend(list),
            RequirementFile::One(requirement) => requirements.push(requirement),
        }
    }
    Ok(requirements)
}

fn read_input(path: &Path) -> Result<String> {
    if path != Path::new("-") {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    if buffer.trim().is_empty() {
        bail!("no input provided on stdin");
    }
    Ok(buffer)
}

fn print_report(report: &AssemblyReport) {
    if report.skipped {
        println!("skipped: no active loader state, manifests left unchanged");
        return;
    }
    println!(
        "applied {} requirement(s): {} activities, {} created, {} overridden, {} removed",
        report.requirements, report.activities, report.created, report.overridden, report.removed
    );
}
