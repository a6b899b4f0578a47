// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tboard - client engine for a shared board of test findings.
//!
//! Testers record findings as cards against the issues currently under test.
//! The cards live in a remote store shared by every tester; this crate keeps
//! a local view of them in sync.
//!
//! # Main Components
//!
//! - [`SyncEngine`] - keeps the card cache in sync by polling and by
//!   listening to the store's change feed
//! - [`MutationGuard`] - holds background refreshes off while a card is
//!   being edited
//! - [`Board`] - one board view: engine, issue tracker and image store
//! - [`RemoteStore`] / [`WebSocketStore`] - the authoritative card store
//! - [`Config`] - client configuration
//!
//! ```rust,ignore
//! use tboard::{Board, Config, commands};
//!
//! let config = Config::load(None)?;
//! let mut board = commands::open_board(&config)?;
//! board.start();
//! board.engine().ready().await?;
//! println!("{} cards", board.snapshot().len());
//! ```

mod cli;
mod commands;
mod display;
mod env;

pub mod board;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod images;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod test_helpers;

pub use board::{Board, BoardConfig, BoardContext};
pub use cache::{CardCache, Snapshot, TrackedKeys};
pub use cli::{Cli, Command, EditFields};
pub use commands::open_board;
pub use config::Config;
pub use engine::{Refresh, SyncConfig, SyncEngine, SyncState};
pub use error::{Error, Result};
pub use guard::{GuardSession, MutationGuard};
pub use images::{FsImageStore, ImageStore};
pub use store::{RemoteStore, WebSocketStore};
pub use tracker::{HttpTracker, IssueTracker};

use commands::new::NewCard;

/// Runtime the `tb` binary drives commands on.
///
/// A board's engine and its editors share one thread, so nothing can open
/// an editor between the engine's last guard check and its cache commit.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Watch { tester } => {
            let tester = tester.or_else(|| config.tester.clone());
            commands::watch::run(&config, tester.as_deref()).await
        }
        Command::List { keys, tester } => {
            commands::list::run(&config, &keys, tester.as_deref()).await
        }
        Command::New {
            key,
            reference,
            kind,
            summary,
            detail,
            status,
        } => {
            let card = NewCard {
                key,
                reference,
                kind,
                summary,
                detail,
                status,
            };
            commands::new::run(&config, card).await
        }
        Command::Edit { id, fields } => commands::edit::run(&config, id, fields).await,
        Command::Move { card, status } => commands::lifecycle::run(&config, &card, status).await,
        Command::Delete { id, yes } => commands::delete::run(&config, id, yes).await,
        Command::Export { key, dry_run, yes } => {
            commands::export::run(&config, &key, dry_run, yes).await
        }
        Command::Attach { id, file, issue } => {
            commands::image::attach(&config, id, &file, issue.as_deref()).await
        }
        Command::Detach { id, url, issue } => {
            commands::image::detach(&config, id, &url, issue.as_deref()).await
        }
    }
}
