//! Control words for the chat loop.
//!
//! `bye` (any case) ends the session; slash commands cover the rest.

use std::io::Write;

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Exit,
    /// Drop the current thread and start a fresh one.
    New,
    Unknown(String),
}

/// Parse user input as a control command.
///
/// Returns `None` for ordinary messages.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("bye") {
        return Some(ChatCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        _ => Some(ChatCommand::Unknown(cmd)),
    }
}

pub fn print_help(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Commands").bold())?;
    writeln!(out, "  {}  start a new conversation thread", style("/new ").cyan())?;
    writeln!(out, "  {}  show this help", style("/help").cyan())?;
    writeln!(out, "  {}  end the session (also /exit, Ctrl+D)", style("bye  ").cyan())?;
    writeln!(out)
}
