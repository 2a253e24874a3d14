//! CookieGate command-line host
//!
//! Runs the consent engine against one request's `Cookie` header and
//! prints the `Set-Cookie` headers that carry out the decision.

use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;
mod state;

use cli::{Cli, Commands};
use commands::{consent, inventory, CommandResult};
use state::AppState;

fn main() -> anyhow::Result<()> {
    cookiegate_core::init_logging();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(()) => Ok(()),
        Err(e) if json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&CommandResult::<()>::err(format!("{:#}", e)))?
            );
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    tracing::debug!(database = %config.database_path.display(), "Starting");

    let state = AppState::open(config, &cli.cookies).context("failed to start consent engine")?;
    let json = cli.json;

    match &cli.command {
        Commands::Status => consent::status(&state, json),
        Commands::Scan => inventory::scan(&state, json),
        Commands::Stats => inventory::stats(&state, json),
        Commands::Enforce => consent::enforce(&state, json),
        Commands::AcceptAll => consent::accept_all(&state, json),
        Commands::RejectAll => consent::reject_all(&state, json),
        Commands::Custom { allow, deny } => consent::custom(&state, json, allow, deny),
        Commands::Reset => consent::reset(&state, json),
        Commands::History { limit } => consent::history(&state, json, *limit),
    }
}
