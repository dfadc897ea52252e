mod cli;
mod commands;
mod config;
mod output;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ListCommands};
use config::Config;
use pullpo::query_builder::ObjectKind;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");

        // Show error chain if verbose flag was passed
        if std::env::args().any(|arg| arg == "--verbose" || arg == "-v") {
            for cause in e.chain().skip(1) {
                eprintln!("Caused by: {cause}");
            }
        }

        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with command output. `PULLPO_LOG`
/// overrides the level chosen by `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "pullpo=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PULLPO_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_format(cli.output_format());
    output::set_quiet(cli.quiet);

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "pullpo", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load()?;

    match cli.command {
        Commands::Api(args) => commands::api::run(&config, args).await?,
        Commands::Features { hostname } => commands::features::run(&config, hostname.as_deref()).await?,
        Commands::Resolve(args) => commands::resolve::run(&config, args).await?,
        Commands::Issue {
            action: ListCommands::List(args),
        } => commands::list::run(&config, ObjectKind::Issue, args).await?,
        Commands::Pr {
            action: ListCommands::List(args),
        } => commands::list::run(&config, ObjectKind::PullRequest, args).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
