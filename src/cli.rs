//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::InsightError;
use crate::domain::insight::InsightMap;
use crate::domain::pipeline::{PipelineSpec, build_manager, check_insights, parse_pipeline};
use crate::domain::registry::{DEFAULT_NAMESPACE, Registry};

#[derive(Parser, Debug)]
#[command(name = "tradeinsight", about = "Diagnostic insights for composite trading instruments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every insight in a pipeline config
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Do not print the generated insights
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate a pipeline config without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List registered insight kinds
    List {
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// Show the options and defaults of an insight kind
    Describe {
        kind: String,
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let registry = Registry::with_builtins();
    match cli.command {
        Command::Run { config, quiet } => run_insights(&config, !quiet, &registry),
        Command::Validate { config } => run_validate(&config, &registry),
        Command::List { namespace } => run_list(namespace.as_deref(), &registry),
        Command::Describe { kind, namespace } => {
            run_describe(&kind, namespace.as_deref(), &registry)
        }
    }
}

fn fail(err: &InsightError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, InsightError> {
    FileConfigAdapter::from_file(path).map_err(|e| InsightError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Relative data paths are resolved against the config file's directory.
fn resolve_data_path(spec: &PipelineSpec, config_path: &Path) -> PathBuf {
    if spec.data_path.is_absolute() {
        return spec.data_path.clone();
    }
    config_path
        .parent()
        .map(|dir| dir.join(&spec.data_path))
        .unwrap_or_else(|| spec.data_path.clone())
}

/// Loads, validates and runs a pipeline config end to end.
pub fn run_pipeline(
    config_path: &Path,
    display: bool,
    registry: &Registry,
) -> Result<InsightMap, InsightError> {
    let adapter = load_config(config_path)?;
    let spec = parse_pipeline(&adapter)?;
    check_insights(&spec, registry)?;

    let data_path = resolve_data_path(&spec, config_path);
    tracing::info!(
        derivative = %spec.derivative,
        data = %data_path.display(),
        insights = spec.insights.len(),
        "running pipeline"
    );
    let data = CsvAdapter::new(data_path);
    let manager = build_manager(&spec, &data, registry)?;
    manager.run(display)
}

fn run_insights(config_path: &Path, display: bool, registry: &Registry) -> ExitCode {
    match run_pipeline(config_path, display, registry) {
        Ok(results) => {
            tracing::info!(count = results.len(), "insights complete");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path, registry: &Registry) -> ExitCode {
    let result = load_config(config_path)
        .and_then(|adapter| parse_pipeline(&adapter))
        .and_then(|spec| check_insights(&spec, registry).map(|()| spec));
    match result {
        Ok(spec) => {
            println!(
                "Config OK: derivative {} with {} insight(s)",
                spec.derivative,
                spec.insights.len()
            );
            for insight in &spec.insights {
                println!("  {} ({})", insight.name, insight.kind);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_list(namespace: Option<&str>, registry: &Registry) -> ExitCode {
    match registry.kinds(namespace) {
        Ok(kinds) => {
            println!("{}:", namespace.unwrap_or(DEFAULT_NAMESPACE));
            for kind in kinds {
                println!("  {kind}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_describe(kind: &str, namespace: Option<&str>, registry: &Registry) -> ExitCode {
    match registry.describe(kind, namespace) {
        Ok(defaults) => {
            println!("{kind}");
            if defaults.is_empty() {
                println!("  (no options)");
            }
            for (key, value) in &defaults {
                println!("  {key} = {value}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
