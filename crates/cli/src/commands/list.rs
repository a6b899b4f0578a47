// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::board::Board;
use crate::config::Config;
use crate::display::format_board;
use crate::error::Result;
use crate::store::RemoteStore;

use super::{open_board, stdout};

pub async fn run(config: &Config, keys: &[String], tester: Option<&str>) -> Result<()> {
    let board = open_board(config)?;
    let result = run_impl(&board, keys, tester, &mut stdout()).await;
    board.engine().untrack().await;
    result
}

/// Loads the given issues once and prints their columns.
pub(crate) async fn run_impl<S: RemoteStore>(
    board: &Board<S>,
    keys: &[String],
    tester: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    board.engine().track(keys.iter().cloned()).await;
    board.engine().ready().await?;

    let issues = board.issues().borrow().clone();
    writeln!(out, "{}", format_board(&board.snapshot(), &issues, tester))?;
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
