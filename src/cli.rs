//! Command-line interface for strictly_replica.

use clap::{Parser, Subcommand};

/// Strictly Replica - server-authoritative tic-tac-toe over TCP
#[derive(Parser, Debug)]
#[command(name = "strictly_replica")]
#[command(about = "Server-authoritative tic-tac-toe with replicated state", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the authoritative session server
    Server {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Connect to a server and play from the terminal
    Client {
        /// Server address (host:port)
        #[arg(long, default_value = "127.0.0.1:7777")]
        server_addr: String,
    },
}
