// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod delete;
pub mod edit;
pub mod export;
pub mod image;
pub mod list;
pub mod lifecycle;
pub mod new;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::board::Board;
use crate::config::Config;
use crate::error::Result;
use crate::images::FsImageStore;
use crate::store::{RemoteStore, WebSocketStore};
use crate::tracker::HttpTracker;

/// Builds a board wired to the configured store, tracker and image directory.
pub fn open_board(config: &Config) -> Result<Board> {
    let store = Arc::new(WebSocketStore::new(config.store_url.clone()));
    let tracker = Arc::new(HttpTracker::new(config.tracker_url.clone())?);
    let images = Arc::new(FsImageStore::new(config.images_root()));
    Ok(Board::new(store, tracker, images, config.board_config()))
}

/// Tracks the given issue, or every issue under test when `issue` is `None`,
/// and waits for the first load.
pub async fn load<S: RemoteStore>(board: &Board<S>, issue: Option<&str>) -> Result<()> {
    match issue {
        Some(key) => {
            board.engine().track([key]).await;
        }
        None => {
            board.load_issues().await?;
        }
    }
    board.engine().ready().await
}

/// Asks a yes/no question on stderr and reads the answer from stdin.
///
/// Anything but `y` or `yes` declines, including end of input.
pub fn prompt(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub(crate) fn stdout() -> impl Write {
    io::stdout().lock()
}
