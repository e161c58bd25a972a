use crate::config::load_config;
use crate::ir::{Task, parse_tasks};
use crate::output::write_render_graph;
use crate::pipeline::LayoutPipeline;
use crate::theme::ThemeMode;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "wfgl",
    version,
    about = "Lay out a workflow task graph and route its dependency edges"
)]
pub struct Args {
    /// Task list (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Edge palette; overrides the config file
    #[arg(short = 't', long = "theme", value_enum)]
    pub theme: Option<ThemeArg>,

    /// Pretty-print the JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Log stage timings and routing fallbacks to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for ThemeMode {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => ThemeMode::Light,
            ThemeArg::Dark => ThemeMode::Dark,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("failed to load config {}", path.display()),
        None => "failed to load default config".to_string(),
    })?;
    let mode = args.theme.map(ThemeMode::from).unwrap_or(config.theme_mode);

    let tasks = read_tasks(args.input.as_deref())?;
    tracing::debug!(tasks = tasks.len(), ?mode, "rendering workflow graph");

    let mut pipeline = LayoutPipeline::new(config);
    let graph = pipeline.render(&tasks, mode);
    write_render_graph(args.output.as_deref(), &graph, args.pretty)
        .context("failed to write layout output")?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_tasks(path: Option<&Path>) -> Result<Vec<Task>> {
    let input = read_input(path)?;
    if input.trim().is_empty() {
        return Err(anyhow::anyhow!("No tasks found in input"));
    }
    parse_tasks(&input).context("failed to parse task list")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_theme_and_output_flags() {
        let args = Args::parse_from(["wfgl", "-i", "tasks.json", "--theme", "dark", "--pretty"]);
        assert_eq!(args.input.as_deref(), Some(Path::new("tasks.json")));
        assert!(matches!(args.theme, Some(ThemeArg::Dark)));
        assert!(args.pretty);
        assert!(args.output.is_none());
    }

    #[test]
    fn missing_input_file_is_reported() {
        let err = read_tasks(Some(Path::new("/nonexistent/tasks.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
