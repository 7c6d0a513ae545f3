//! CLI command definitions for the `buddy` binary.

pub mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use buddy_infra::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE};

/// A web-searching chat assistant, over HTTP or in the terminal.
#[derive(Parser)]
#[command(name = "buddy", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = CONFIG_ENV, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP chat endpoint.
    Serve {
        /// Port to listen on (defaults to `server.port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host`).
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with the assistant in the terminal.
    Chat {
        /// Continue an existing thread instead of starting a new one.
        #[arg(long)]
        thread: Option<String>,
    },
}
