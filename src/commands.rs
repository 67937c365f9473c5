//! CLI command definitions
//!
//! Defines the clap commands for bwnote.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Keep one server running and read commands from stdin
    ///
    /// The vault stays unlocked between commands until `lock` or exit.
    Shell,

    /// Unlock the vault (prompts for the master password)
    Unlock,

    /// Lock the vault
    Lock,

    /// Show whether the vault is locked
    Status,

    /// Reveal an item by id
    Show {
        /// Bitwarden item id
        item_id: String,

        /// Item type to reveal
        #[arg(long = "type", default_value = "login")]
        kind: String,
    },

    /// List bitwarden directives in a markdown note
    Scan {
        /// Markdown file to scan
        path: PathBuf,

        /// Reveal each supported directive after listing it
        #[arg(long)]
        reveal: bool,
    },

    /// View or change settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings and where they are stored
    Show,

    /// Set the path to the Bitwarden CLI executable
    SetCliPath {
        /// e.g. /usr/local/bin/bw
        path: PathBuf,
    },

    /// Remove the configured CLI path
    ClearCliPath,
}
