//! buck-sources launcher
//!
//! Resolves Buck targets to built Python link-tree directories:
//! - **resolve**: scan, normalize, build and rescan until every target has a link-tree
//! - **normalize**: show the concrete targets buck expands a pattern to
//! - **config**: show the effective configuration

use buck_sources_logging::{init_logging, LogConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "buck-sources",
    version,
    about = "Resolve Buck targets to built link-tree source directories"
)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Directory for log files (default: $BUCK_SOURCES_HOME/logs)
    #[arg(long, global = true, env = "BUCK_SOURCES_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    config: cli::config::GlobalConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve targets to link-tree directories, building them if needed
    Resolve(cli::resolve::ResolveArgs),

    /// Expand targets with `buck targets --show-output`
    Normalize(cli::normalize::NormalizeArgs),

    /// Show the effective configuration
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Resolve(args) => args.json,
        Commands::Normalize(args) => args.json,
        Commands::Config(args) => args.json,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "buck-sources",
        verbose: cli.verbose,
        quiet: json_mode,
        log_dir: cli.log_dir.clone(),
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    let result = run_command(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                cli::error::print_error(&err);
            }
            ExitCode::from(1)
        }
    }
}

fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config.to_config();
    debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Resolve(args) => cli::resolve::run(args, config),
        Commands::Normalize(args) => cli::normalize::run(args, config),
        Commands::Config(args) => cli::config::run(args, &config),
    }
}
