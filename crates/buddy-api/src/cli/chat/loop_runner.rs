//! Main chat loop.
//!
//! Reads lines, sends each through the orchestrator under the current thread
//! id, and prints the reply. A failed turn is reported and the loop carries on.

use std::io::Write;
use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

fn new_thread_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn print_banner(out: &mut impl Write, thread_id: &str) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {} {}", style("Buddy").cyan().bold(), style("ready").dim())?;
    writeln!(out, "  {} {}", style("thread").dim(), style(thread_id).dim())?;
    writeln!(
        out,
        "  {}",
        style("Type a message, /new for a fresh thread, /help for commands, bye to quit.").dim()
    )?;
    writeln!(out)
}

/// Run the interactive chat loop.
///
/// `thread` resumes an existing thread id; otherwise a UUID v7 is generated.
pub async fn run_chat_loop(state: &AppState, thread: Option<String>) -> anyhow::Result<()> {
    let mut thread_id = thread
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(new_thread_id);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, mut out) = ChatInput::new(prompt)?;

    print_banner(&mut out, &thread_id)?;

    loop {
        let line = match input.read_line().await {
            InputEvent::Message(line) => line,
            InputEvent::Eof | InputEvent::Interrupted => break,
        };
        if line.is_empty() {
            continue;
        }

        if let Some(command) = commands::parse(&line) {
            match command {
                ChatCommand::Exit => break,
                ChatCommand::Help => commands::print_help(&mut out)?,
                ChatCommand::New => {
                    if let Err(e) = state.orchestrator.reset(&thread_id).await {
                        warn!(thread_id = %thread_id, "Failed to drop thread: {e}");
                    }
                    thread_id = new_thread_id();
                    writeln!(
                        out,
                        "\n  {} New thread {}\n",
                        style("*").cyan().bold(),
                        style(&thread_id).dim()
                    )?;
                }
                ChatCommand::Unknown(cmd) => {
                    writeln!(
                        out,
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(cmd).dim()
                    )?;
                }
            }
            continue;
        }

        let spinner = thinking_spinner();
        let started = Instant::now();
        let result = state.orchestrator.respond(&thread_id, &line).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => {
                debug!(
                    thread_id = %thread_id,
                    iterations = reply.iterations,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Turn complete"
                );
                writeln!(out, "\n  {} {}\n", style("Buddy >").cyan().bold(), reply.text)?;
            }
            Err(e) => {
                warn!(thread_id = %thread_id, "Turn failed: {e}");
                writeln!(out, "\n  {} {e}", style("!").red().bold())?;
                writeln!(out, "  {}\n", style("Type a message to retry, bye to quit.").dim())?;
            }
        }
    }

    writeln!(out, "\n  {}", style("Session ended.").dim())?;
    input.flush()?;
    Ok(())
}
