// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::io::Write;

use tracing::info;

use crate::board::Board;
use crate::config::Config;
use crate::display::format_board;
use crate::error::Result;
use crate::store::RemoteStore;

use super::{open_board, stdout};

pub async fn run(config: &Config, tester: Option<&str>) -> Result<()> {
    let mut board = open_board(config)?;
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let result = run_impl(&mut board, tester, shutdown, &mut stdout()).await;
    board.stop().await;
    result
}

/// Runs the board and prints it after every committed refresh until
/// `shutdown` completes. Sync errors are printed and watching continues.
pub(crate) async fn run_impl<S: RemoteStore>(
    board: &mut Board<S>,
    tester: Option<&str>,
    shutdown: impl Future<Output = ()>,
    out: &mut impl Write,
) -> Result<()> {
    let mut snapshots = board.engine().subscribe();
    let mut state = board.engine().state();
    let mut reported: Option<String> = None;
    board.start();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.keys().next().is_none() {
                    continue;
                }
                let issues = board.issues().borrow().clone();
                writeln!(out, "{}\n", format_board(&snapshot, &issues, tester))?;
                out.flush()?;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let error = state.borrow_and_update().last_error.clone();
                if error != reported {
                    if let Some(message) = &error {
                        writeln!(out, "sync error: {message}\n")?;
                    }
                    reported = error;
                }
            }
        }
    }
    info!("stopped watching");
    Ok(())
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
