use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "octofhir-cosmos")]
#[command(about = "Compile FHIR search requests into Cosmos DB SQL queries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to octofhir-cosmos.toml when present)
    #[arg(short, long, global = true, env = "OCTOFHIR_COSMOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (overrides the config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a search over current resources
    Search(RequestArgs),
    /// Compile a history search over all versions
    History(RequestArgs),
}

impl Commands {
    pub fn args(&self) -> &RequestArgs {
        match self {
            Commands::Search(args) | Commands::History(args) => args,
        }
    }
}

#[derive(Args)]
pub struct RequestArgs {
    /// JSON search request file; reads stdin when omitted or "-"
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_with_file() {
        let cli = Cli::try_parse_from(["octofhir-cosmos", "search", "request.json"]).unwrap();

        assert!(matches!(cli.command, Commands::Search(_)));
        assert_eq!(
            cli.command.args().file.as_deref(),
            Some(std::path::Path::new("request.json"))
        );
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_parse_history_with_global_flags() {
        let cli = Cli::try_parse_from([
            "octofhir-cosmos",
            "history",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::History(_)));
        assert!(cli.command.args().file.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["octofhir-cosmos"]).is_err());
    }
}
