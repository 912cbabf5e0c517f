//! Strictly Replica - Unified CLI
//!
//! Runs either the authoritative session server or a terminal client.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use strictly_replica::replication::{ReplicaClient, ReplicaServer, ServerMessage};
use strictly_replica::{GameSession, Position, ServerConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Server { config, port, bind } => {
            let config = ServerConfig::load(config.as_deref())?.with_overrides(bind, port);
            initialize_tracing(config.log_filter());
            run_server(config).await
        }
        Command::Client { server_addr } => {
            initialize_tracing("warn,strictly_replica=info");
            run_client(server_addr).await
        }
    }
}

fn initialize_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the authoritative server until Ctrl+C.
#[instrument(skip(config), fields(session_id = %config.session_id()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting Strictly Replica server");

    let session = GameSession::new(config.session_id().clone());
    let server = ReplicaServer::bind(&config.listen_addr(), session).await?;
    info!(addr = %server.local_addr()?, "Waiting for two players");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down server"),
    }
    Ok(())
}

/// Run the terminal client: reads "row col" lines, prints replicated state.
#[instrument]
async fn run_client(server_addr: String) -> Result<()> {
    let mut client = ReplicaClient::connect(&server_addr).await?;
    if let Some(seat) = client.seat() {
        println!("You are player {} ({})", seat, seat.mark());
    }
    println!("Enter moves as \"row col\" (0-2). Waiting for opponent...");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            message = client.next_message() => {
                let Some(message) = message? else {
                    println!("Server closed the connection.");
                    return Ok(());
                };
                if print_update(&client, &message) {
                    return Ok(());
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, leaving game");
                    return Ok(client.close().await?);
                };
                let Some(position) = Position::parse(&line) else {
                    println!("Could not read a square from {:?}", line.trim());
                    continue;
                };
                if !client.mirror().can_propose(position) {
                    warn!(%position, "Proposal will likely be rejected");
                }
                client.propose(position.row(), position.col()).await?;
            }
        }
    }
}

/// Prints a frame; returns true when the game is over.
fn print_update(client: &ReplicaClient, message: &ServerMessage) -> bool {
    let mirror = client.mirror();
    match message {
        ServerMessage::GameStarted => println!("Game started. Player A moves first."),
        ServerMessage::BoardChanged { .. } => println!("\n{}\n", mirror.board().display()),
        ServerMessage::TurnChanged { player } if Some(*player) == mirror.seat() => {
            println!("Your turn.")
        }
        ServerMessage::TurnChanged { player } => println!("Waiting for player {}.", player),
        ServerMessage::GameEnded { outcome } => {
            println!("Game over: {}", outcome);
            return true;
        }
        ServerMessage::Welcome { .. } | ServerMessage::SessionFull => {}
    }
    false
}
