//! Interactive surface
//!
//! Reads one line at a time from stdin. Plain lines are citations; lines
//! starting with `:` are commands.

use std::io::Write;

use anyhow::{Context, Result};
use doi_conductor::{Conductor, ResolutionBackend, SubmitError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render::{render_history, render_view};

const HELP: &str = "\
Paste a citation and press Enter to look up its DOI.

Commands:
  :history     list past searches, newest first
  :use <n>     copy citation <n> from the history into the input
  :submit      search the current input again
  :help        show this help
  :quit        exit";

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    /// Resolve this citation
    Resolve(String),
    /// Show history
    History,
    /// Copy a history entry (1-based) into the input
    Use(usize),
    /// Resubmit the pending input
    Submit,
    /// Show help
    Help,
    /// Leave the loop
    Quit,
    /// Blank line
    Nothing,
    /// Unrecognized command
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line of input
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return if line.is_empty() {
                Self::Nothing
            } else {
                Self::Resolve(line.to_string())
            };
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("history" | "h"), None) => Self::History,
            (Some("use" | "u"), Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Use(n),
                _ => Self::Unknown(line.to_string()),
            },
            (Some("submit" | "s"), None) => Self::Submit,
            (Some("help" | "?"), None) => Self::Help,
            (Some("quit" | "q" | "exit"), None) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Run the interactive loop until `:quit` or end of input
pub async fn run<B: ResolutionBackend + 'static>(conductor: &mut Conductor<B>) -> Result<()> {
    println!("doi-finder {} - type :help for commands", env!("CARGO_PKG_VERSION"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(conductor.pending_input())?;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match ReplCommand::parse(&line) {
            ReplCommand::Resolve(citation) => {
                conductor.set_input(citation);
                resolve_pending(conductor).await;
            }
            ReplCommand::Submit => resolve_pending(conductor).await,
            ReplCommand::History => println!("{}", render_history(conductor.history())),
            ReplCommand::Use(n) => match conductor.history().nth(n - 1).cloned() {
                Some(entry) => {
                    conductor.select_entry(&entry);
                    println!("Input set to entry {n}. Use :submit to search again.");
                }
                None => println!("No history entry {n}."),
            },
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
            ReplCommand::Nothing => {}
            ReplCommand::Unknown(text) => println!("Unknown command: {text} (try :help)"),
        }
        prompt(conductor.pending_input())?;
    }

    Ok(())
}

async fn resolve_pending<B: ResolutionBackend + 'static>(conductor: &mut Conductor<B>) {
    match conductor.submit_pending() {
        Ok(()) => {
            println!("{}", render_view(&conductor.view()));
            conductor.wait_for_resolution().await;
            println!("{}", render_view(&conductor.view()));
        }
        Err(SubmitError::EmptyCitation) => println!("Nothing to search for."),
        Err(e) => debug!(error = %e, "Submission ignored"),
    }
}

fn prompt(pending: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    if pending.is_empty() {
        write!(stdout, "> ")?;
    } else {
        write!(stdout, "[{}] > ", crate::render::truncate(pending, 30))?;
    }
    stdout.flush().context("Failed to flush stdout")
}
