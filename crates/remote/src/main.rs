// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tb-remote: authoritative card store for the test board.
//!
//! Keeps every card in a SQLite database, answers list and mutation requests
//! over WebSocket, and pushes a change event to subscribed clients after
//! every mutation.

mod server;
#[cfg(test)]
mod server_tests;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// tb-remote: card store server for the test board
#[derive(Parser, Debug)]
#[command(name = "tb-remote")]
#[command(about = "WebSocket card store for the test board")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the card database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    info!("Starting tb-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = state::ServerState::open(&args.data)?;
    server::run(args.bind, state).await?;

    Ok(())
}
