mod commands;
mod core;
mod ui;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use crate::commands::{
    AnalyzeCommand, BayesCommand, ScenariosCommand, SimulateCommand, StatusCommand,
};
use crate::core::{CliError, Session};

#[derive(Parser)]
#[command(name = "topocause", version)]
#[command(about = "Topology-aware root-cause inference for network alarm storms", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (defaults to $TOPOCAUSE_CONFIG, then ./topocause.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the alarm storm of an outage and optionally analyze it
    Simulate(SimulateCommand),
    /// Rank root-cause candidates for an alarm file
    Analyze(AnalyzeCommand),
    /// Query the Bayesian engine trained on historical incidents
    Bayes(BayesCommand),
    /// Browse the failure scenario catalog
    Scenarios(ScenariosCommand),
    /// Run one analysis cycle on every tenant network
    Status(StatusCommand),
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session = Session::load(cli.config.as_deref(), cli.json)?;
    match cli.command {
        Commands::Simulate(cmd) => cmd.execute(&session),
        Commands::Analyze(cmd) => cmd.execute(&session),
        Commands::Bayes(cmd) => cmd.execute(&session),
        Commands::Scenarios(cmd) => cmd.execute(&session),
        Commands::Status(cmd) => cmd.execute(&session).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CliError::from(err).render();
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["topocause", "scenarios", "list", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Scenarios(_)));
    }

    #[test]
    fn test_simulate_requires_root_or_scenario() {
        assert!(Cli::try_parse_from(["topocause", "simulate", "-t", "topo.yaml"]).is_err());
        assert!(Cli::try_parse_from([
            "topocause", "simulate", "-t", "topo.yaml", "--root", "CORE", "--scenario", "wan_outage"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["topocause", "simulate", "-t", "topo.yaml", "--root", "CORE"]).is_ok());
    }
}
