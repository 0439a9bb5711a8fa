//! Configuration and shell-integration command handlers.

use std::path::Path;

use crate::cli::args::ShellType;
use crate::config::ConsoleConfig;
use crate::error::Result;

/// Handles `mdeoff config`.
pub fn handle_config(config: &ConsoleConfig, path: &Path) {
    println!("Current configuration:\n");
    println!("  auth.authority = {}", config.auth.authority);
    println!("  auth.tenant_id = {}", config.auth.tenant_id);
    println!("  auth.client_id = {}", config.auth.client_id);
    println!("  auth.redirect_uri = {}", config.auth.redirect_uri);
    println!("  auth.scopes = {}", config.auth.scopes.join(" "));
    println!("  api.base_url = {}", config.api.base_url);
    match config.api.timeout_secs {
        Some(secs) => println!("  api.timeout_secs = {secs}"),
        None => println!("  api.timeout_secs = (client default)"),
    }
    println!();

    let state = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("Config file: {}{state}", path.display());

    if config.uses_placeholder_client_id() {
        println!();
        println!("Warning: auth.client_id is a placeholder. Set it to your app registration's");
        println!("client id in the config file or with MDE_CLIENT_ID.");
    }
}

/// Handles `mdeoff completions <shell>`.
pub fn handle_completions(shell: ShellType) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell};

    let mut cmd = crate::cli::Cli::command();
    let shell = match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
        ShellType::PowerShell => Shell::PowerShell,
    };

    generate(shell, &mut cmd, "mdeoff", &mut std::io::stdout());

    Ok(())
}
