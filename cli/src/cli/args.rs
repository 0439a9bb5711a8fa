//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Terminal console for Microsoft Defender for Endpoint offboarding.
///
/// Sign in with your Entra ID account, browse managed devices and their
/// logon users, and offboard devices one at a time or in bulk.
#[derive(Parser, Debug)]
#[command(name = "mdeoff")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to the interactive console).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the sign-in URL and paste the redirect instead of opening a browser.
    #[arg(long, global = true)]
    pub no_browser: bool,

    /// Use this config file instead of the default location.
    #[arg(long, global = true, env = "MDE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive session (the default).
    Console,

    /// Sign in and list all devices.
    Devices {
        /// Also write the list to a CSV file.
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Load logon users for every device before listing.
        #[arg(long)]
        with_users: bool,
    },

    /// Sign in and show the logon users of one device.
    Users {
        /// Device id or host name.
        device: String,
    },

    /// Sign in and offboard one or more devices.
    ///
    /// All requests are sent at once; a summary is printed when every
    /// request has finished.
    Offboard {
        /// Device ids or host names.
        #[arg(required = true)]
        devices: Vec<String>,

        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show the effective configuration.
    Config,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// Supported shells for completion scripts.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// One line typed into the interactive console.
#[derive(Parser, Debug)]
#[command(name = "mdeoff", no_binary_name = true, disable_version_flag = true)]
pub struct ConsoleLine {
    #[command(subcommand)]
    pub command: ConsoleCommand,
}

/// Commands available inside the interactive console.
#[derive(Subcommand, Debug)]
pub enum ConsoleCommand {
    /// Sign in (again). Clears the loaded device list.
    Login,

    /// Discard the access token.
    Logout,

    /// Show sign-in state and what is loaded.
    Status,

    /// Fetch the full device list.
    Refresh,

    /// Show loaded devices.
    List {
        /// Show at most this many devices.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Find a device by host name and show its logon users.
    Search {
        /// Host name (case-insensitive, exact).
        name: String,
    },

    /// Fetch and show the current logon users of a device.
    Users {
        /// Device id or host name.
        device: String,
    },

    /// Load logon users for several devices at once.
    LoadUsers {
        /// Device ids or host names.
        #[arg(required = true)]
        devices: Vec<String>,
    },

    /// Add a device to favorites, or remove it.
    Fav {
        /// Device id or host name.
        device: String,
    },

    /// Show favorite devices.
    Favorites {
        /// Remove all favorites.
        #[arg(long)]
        clear: bool,
    },

    /// Show recent searches.
    Recent {
        /// Forget all recent searches.
        #[arg(long)]
        clear: bool,
    },

    /// Offboard one or more devices.
    Offboard {
        /// Device ids or host names.
        #[arg(required = true)]
        devices: Vec<String>,

        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Write the loaded device list to a CSV file.
    Export {
        /// Output file path.
        path: PathBuf,
    },

    /// Leave the console.
    #[command(alias = "exit")]
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_console() {
        let cli = Cli::try_parse_from(["mdeoff"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn offboard_requires_a_device() {
        assert!(Cli::try_parse_from(["mdeoff", "offboard"]).is_err());

        let cli = Cli::try_parse_from(["mdeoff", "offboard", "web-01", "db-01", "-y"]).unwrap();
        match cli.command {
            Some(Commands::Offboard { devices, yes }) => {
                assert_eq!(devices, ["web-01", "db-01"]);
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn console_lines_parse_without_binary_name() {
        let line = ConsoleLine::try_parse_from("load-users d1 d2".split_whitespace()).unwrap();
        assert!(matches!(
            line.command,
            ConsoleCommand::LoadUsers { ref devices } if devices.len() == 2
        ));

        let line = ConsoleLine::try_parse_from(["exit"]).unwrap();
        assert!(matches!(line.command, ConsoleCommand::Quit));

        let line = ConsoleLine::try_parse_from(["list", "--limit", "5"]).unwrap();
        assert!(matches!(line.command, ConsoleCommand::List { limit: Some(5) }));
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
        ConsoleLine::command().debug_assert();
    }
}
