//! CLI command handling
//!
//! Each one-shot vault command runs against its own `bw serve` session that is
//! started before the action and torn down after it. `bw serve` keeps the
//! unlocked vault only in memory, so `shell` is the way to unlock once and
//! reveal several items.

pub mod shell;
pub mod terminal;

use std::path::Path;

use colored::Colorize;

use crate::api::{LockStatus, StatusEnvelope};
use crate::app::{scan, Notifier, Outcome, Ui, VaultActions, VaultHost};
use crate::commands::{Commands, ConfigCommands};
use crate::common::config::Config;
use crate::common::{paths, Error, Result};

use terminal::{TerminalItemView, TerminalNotifier, TerminalPrompt};

/// Vault actions that need a running session
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SessionAction {
    Unlock,
    Lock,
    Status,
    Reveal(Vec<(String, String)>),
}

/// Dispatch a CLI command
///
/// Returns whether the action succeeded. Action failures have already been
/// reported as notices; only host-level errors are returned as `Err`.
pub async fn dispatch(command: Commands) -> Result<bool> {
    let config = Config::load()?;

    let action = match command {
        Commands::Config(cmd) => {
            config_command(config, cmd)?;
            return Ok(true);
        }
        Commands::Shell => return shell::run_shell(config).await,
        Commands::Unlock => SessionAction::Unlock,
        Commands::Lock => SessionAction::Lock,
        Commands::Status => SessionAction::Status,
        Commands::Show { item_id, kind } => SessionAction::Reveal(vec![(kind, item_id)]),
        Commands::Scan { path, reveal } => {
            let targets = scan_note(&path)?;
            if !reveal || targets.is_empty() {
                return Ok(true);
            }
            SessionAction::Reveal(targets)
        }
    };

    run_session(config, action).await
}

/// Print the directives of a note and return the revealable ones
pub(crate) fn scan_note(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let directives = scan(&content);
    if directives.is_empty() {
        println!("No bitwarden directives in {}", path.display());
    }

    let mut targets = Vec::new();
    for directive in directives {
        if directive.supported_kind().is_none() {
            TerminalNotifier.notice(&Error::UnsupportedItemType(directive.kind).to_string());
            continue;
        }
        println!(
            "{}:{}  [{}]  {}",
            path.display(),
            directive.line,
            directive.button_label(),
            directive.item_id
        );
        targets.push((directive.kind, directive.item_id));
    }
    Ok(targets)
}

/// Start a session, run one action, tear the session down
async fn run_session(config: Config, action: SessionAction) -> Result<bool> {
    let host = VaultHost::new(config)?;
    host.start().await;

    let ok = run_action(&host.actions(terminal_ui()), action).await;

    host.shutdown().await;
    Ok(ok)
}

/// UI capabilities backed by the terminal
pub(crate) fn terminal_ui() -> Ui<'static> {
    Ui {
        notifier: &TerminalNotifier,
        prompt: &TerminalPrompt,
        view: &TerminalItemView,
    }
}

/// Run one action against an already started host
pub(crate) async fn run_action(actions: &VaultActions<'_>, action: SessionAction) -> bool {
    match action {
        SessionAction::Unlock => actions.unlock().await.is_success(),
        SessionAction::Lock => actions.lock().await.is_success(),
        SessionAction::Status => match actions.status().await {
            Some(status) => {
                print_status(&status);
                true
            }
            None => false,
        },
        SessionAction::Reveal(targets) => {
            let mut all_revealed = true;
            for (index, (kind, item_id)) in targets.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                all_revealed &= actions.reveal(kind, item_id).await == Outcome::Revealed;
            }
            all_revealed
        }
    }
}

fn print_status(status: &StatusEnvelope) {
    let state = status.lock_status().unwrap_or(LockStatus::Unknown);
    let label = match state {
        LockStatus::Locked => state.to_string().red(),
        LockStatus::Unlocked => state.to_string().green(),
        _ => state.to_string().normal(),
    };
    match status.user_email() {
        Some(email) => println!("Vault {} ({})", label, email),
        None => println!("Vault {}", label),
    }
}

fn config_command(mut config: Config, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            match paths::config_path() {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: (no config directory)"),
            }
            match config.cli_path() {
                Some(path) => println!("CLI path:    {}", path.display()),
                None => match config.suggested_cli_path() {
                    Some(found) => println!(
                        "CLI path:    (not set, found {} on PATH)",
                        found.display()
                    ),
                    None => println!("CLI path:    (not set)"),
                },
            }
            println!("Startup timeout: {}s", config.timeouts.startup_secs);
            match config.timeouts.request() {
                Some(t) => println!("Request timeout: {}s", t.as_secs()),
                None => println!("Request timeout: none"),
            }
            Ok(())
        }

        ConfigCommands::SetCliPath { path } => {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "CLI path does not exist yet");
            }
            config.cli_path = path.display().to_string();
            let saved = config.save()?;
            println!("Saved CLI path to {}", saved.display());
            Ok(())
        }

        ConfigCommands::ClearCliPath => {
            config.cli_path.clear();
            let saved = config.save()?;
            println!("Cleared CLI path in {}", saved.display());
            Ok(())
        }
    }
}
