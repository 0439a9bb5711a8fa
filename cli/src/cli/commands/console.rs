//! Interactive console loop.

use std::io::{self, BufRead, Write};

use clap::Parser;

use crate::cli::args::{ConsoleCommand, ConsoleLine};
use crate::cli::commands::{auth, devices, favorites, offboard};
use crate::cli::Context;
use crate::error::{ConsoleError, Result};

const PROMPT: &str = "mdeoff> ";

/// Runs the console until `quit` or end of input.
///
/// Signs in and loads the device list first. A failure there is reported
/// and the console still starts, so `login` can be retried from inside.
pub async fn run_console(ctx: &mut Context) -> Result<()> {
    println!("mdeoff {} - Defender for Endpoint offboarding console", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands, 'quit' to exit.");
    println!();

    match auth::handle_login(ctx).await {
        Ok(()) => {
            if let Err(e) = devices::handle_refresh(ctx).await {
                report(&e);
            }
        }
        Err(e) => report(&e),
    }

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match ConsoleLine::try_parse_from(words.iter().copied()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        if matches!(command, ConsoleCommand::Quit) {
            break;
        }

        tracing::debug!(command = words[0], "console command");
        if let Err(e) = dispatch(ctx, command).await {
            report(&e);
        }
    }

    Ok(())
}

async fn dispatch(ctx: &mut Context, command: ConsoleCommand) -> Result<()> {
    match command {
        ConsoleCommand::Login => auth::handle_login(ctx).await?,
        ConsoleCommand::Logout => auth::handle_logout(ctx),
        ConsoleCommand::Status => auth::handle_status(ctx),
        ConsoleCommand::Refresh => devices::handle_refresh(ctx).await?,
        ConsoleCommand::List { limit } => devices::handle_list(ctx, limit),
        ConsoleCommand::Search { name } => devices::handle_search(ctx, &name).await?,
        ConsoleCommand::Users { device } => devices::handle_users(ctx, &device).await?,
        ConsoleCommand::LoadUsers { devices: refs } => {
            devices::handle_load_users(ctx, &refs).await?;
        }
        ConsoleCommand::Fav { device } => favorites::handle_fav(ctx, &device)?,
        ConsoleCommand::Favorites { clear } => favorites::handle_favorites(ctx, clear),
        ConsoleCommand::Recent { clear } => favorites::handle_recent(ctx, clear),
        ConsoleCommand::Offboard { devices: refs, yes } => {
            offboard::handle_offboard(ctx, &refs, yes).await?;
        }
        ConsoleCommand::Export { path } => devices::handle_export(ctx, &path)?,
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn report(error: &ConsoleError) {
    eprintln!("Error: {error}");
    if error.requires_reauth() {
        eprintln!("Sign in again with: login");
    } else if error.is_auth_failure() {
        eprintln!("Retry with: login");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_console_command_is_rejected() {
        assert!(ConsoleLine::try_parse_from(["reboot", "web-01"]).is_err());
    }
}
