//! mdeoff - Defender for Endpoint offboarding console
//!
//! Signs in to the Microsoft identity platform, lists the tenant's
//! onboarded devices with their logon users, and offboards devices one at a
//! time or in bulk.

mod auth;
mod cli;
mod client;
mod config;
mod directory;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, Context};
use crate::config::settings::env;
use crate::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL)
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (config, config_path) = match cli.config {
        Some(path) => (config::load_config_from(&path)?, path),
        None => (config::load_config()?, config::config_file()?),
    };

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => {
            let mut ctx = Context::new(config, config_path, cli.no_browser)?;
            cli::commands::run_console(&mut ctx).await
        }
        Commands::Devices { csv, with_users } => {
            let mut ctx = Context::new(config, config_path, cli.no_browser)?;
            cli::commands::handle_devices(&mut ctx, csv.as_deref(), with_users).await
        }
        Commands::Users { device } => {
            let mut ctx = Context::new(config, config_path, cli.no_browser)?;
            cli::commands::handle_device_users(&mut ctx, &device).await
        }
        Commands::Offboard { devices, yes } => {
            let mut ctx = Context::new(config, config_path, cli.no_browser)?;
            cli::commands::handle_offboard_command(&mut ctx, &devices, yes).await
        }
        Commands::Config => {
            cli::commands::handle_config(&config, &config_path);
            Ok(())
        }
        Commands::Completions { shell } => cli::commands::handle_completions(shell),
    }
}
