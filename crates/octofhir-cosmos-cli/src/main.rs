mod cli;
mod config;
mod observability;
mod output;

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use octofhir_cosmos_search::{QueryBuilder, SearchRequest};

use cli::{Cli, Commands};
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref()).map_err(anyhow::Error::msg)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    observability::init_tracing_with_level(level);
    tracing::debug!(
        config = ?cli.config,
        max_expression_depth = config.query.max_expression_depth,
        max_parameters = config.query.max_parameters,
        "configuration loaded"
    );

    let input = cli.command.args().file.as_deref();
    let request = read_request(input)?;
    let builder = QueryBuilder::new(config.query);
    let (mode, result) = match &cli.command {
        Commands::Search(_) => ("search", builder.compile_search(&request)),
        Commands::History(_) => ("history", builder.compile_history(&request)),
    };
    let spec = result.context("Failed to compile query")?;
    tracing::info!(
        mode,
        input = ?input,
        bindings = spec.bindings().len(),
        "query compiled"
    );

    output::print_json(&spec)
}

/// Read a search request from `path`, or stdin when absent or `-`.
fn read_request(path: Option<&Path>) -> Result<SearchRequest> {
    let raw = match path {
        Some(p) if p != Path::new("-") => fs::read_to_string(p)
            .with_context(|| format!("Failed to read request file {}", p.display()))?,
        _ => io::read_to_string(io::stdin()).context("Failed to read request from stdin")?,
    };
    parse_request(&raw)
}

fn parse_request(raw: &str) -> Result<SearchRequest> {
    serde_json::from_str(raw).context("Invalid search request JSON")
}
