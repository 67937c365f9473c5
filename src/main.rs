//! bwnote - reveal Bitwarden credentials referenced from markdown notes
//!
//! Runs the Bitwarden CLI as a local `bw serve` server for the duration of a
//! command, or of a `shell` session, and talks to it over its REST API.

use bwnote::{cli, common::logging, commands::Commands};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bwnote", about = "Unlock Bitwarden and reveal items referenced from notes")]
#[command(version, long_about = None)]
struct Cli {
    /// Also write logs to the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(path) = logging::init_cli(cli.log_file) {
        tracing::debug!(path = %path.display(), "Logging to file");
    }

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
