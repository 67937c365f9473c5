//! Interactive session: one `bw serve` for many actions
//!
//! Commands are read line by line from stdin until EOF or `quit`, and all of
//! them share the same gateway, so an unlock lasts until `lock` or the end of
//! the shell.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{Notifier, VaultHost};
use crate::common::config::Config;
use crate::common::Result;

use super::terminal::TerminalNotifier;
use super::{run_action, scan_note, terminal_ui, SessionAction};

const HELP: &str = "\
Commands:
  status                 Show whether the vault is locked
  unlock                 Unlock the vault
  lock                   Lock the vault
  show [type] <item-id>  Reveal an item (type defaults to login)
  scan <file.md>         List and reveal the directives of a note
  help                   Show this help
  quit                   Stop the server and leave
";

/// One line of shell input
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    Action(SessionAction),
    Scan(PathBuf),
    Help,
    Quit,
}

/// Parse a non-empty input line
pub(crate) fn parse_line(line: &str) -> std::result::Result<ShellCommand, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["status"] => Ok(ShellCommand::Action(SessionAction::Status)),
        ["unlock"] => Ok(ShellCommand::Action(SessionAction::Unlock)),
        ["lock"] => Ok(ShellCommand::Action(SessionAction::Lock)),
        ["show", item_id] => Ok(ShellCommand::Action(SessionAction::Reveal(vec![(
            "login".to_string(),
            item_id.to_string(),
        )]))),
        ["show", kind, item_id] => Ok(ShellCommand::Action(SessionAction::Reveal(vec![(
            kind.to_string(),
            item_id.to_string(),
        )]))),
        ["scan", path] => Ok(ShellCommand::Scan(PathBuf::from(path))),
        ["help"] | ["?"] => Ok(ShellCommand::Help),
        ["quit"] | ["exit"] => Ok(ShellCommand::Quit),
        _ => Err(format!("Unknown command '{}', try 'help'", line.trim())),
    }
}

/// Run the shell against one host
///
/// Returns whether every command succeeded.
pub async fn run_shell(config: Config) -> Result<bool> {
    let host = VaultHost::new(config)?;
    host.start().await;

    let result = read_commands(&host).await;

    host.shutdown().await;
    result
}

async fn read_commands(host: &VaultHost) -> Result<bool> {
    let actions = host.actions(terminal_ui());
    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut all_ok = true;

    loop {
        if interactive {
            print!("bwnote> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let ok = match parse_line(line) {
            Ok(ShellCommand::Quit) => break,
            Ok(ShellCommand::Help) => {
                print!("{HELP}");
                true
            }
            Ok(ShellCommand::Action(action)) => run_action(&actions, action).await,
            Ok(ShellCommand::Scan(path)) => match scan_note(&path) {
                Ok(targets) if targets.is_empty() => true,
                Ok(targets) => run_action(&actions, SessionAction::Reveal(targets)).await,
                Err(e) => {
                    TerminalNotifier.notice(&e.to_string());
                    false
                }
            },
            Err(message) => {
                TerminalNotifier.notice(&message);
                false
            }
        };
        tracing::debug!(command = line, ok, "Shell command finished");
        all_ok &= ok;
    }

    Ok(all_ok)
}
