// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tb_core::export::render;

use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::RemoteStore;

use super::{load, open_board, prompt, stdout};

pub async fn run(config: &Config, key: &str, dry_run: bool, yes: bool) -> Result<()> {
    let board = open_board(config)?;
    let confirm = |key: &str| yes || prompt(&format!("Post the test report to {key}?"));
    let result = run_impl(&board, key, dry_run, confirm, &mut stdout()).await;
    board.engine().untrack().await;
    result
}

/// Loads the issue's cards and posts the rendered report as a comment.
///
/// With `dry_run` the report is only printed.
pub(crate) async fn run_impl<S, F>(
    board: &Board<S>,
    key: &str,
    dry_run: bool,
    confirm: F,
    out: &mut impl Write,
) -> Result<()>
where
    S: RemoteStore,
    F: FnOnce(&str) -> bool,
{
    load(board, Some(key)).await?;

    if dry_run {
        writeln!(out, "{}", render(board.snapshot().cards_for(key)))?;
        return Ok(());
    }
    if !confirm(key) {
        return Err(Error::Cancelled);
    }
    board.export(key).await?;
    writeln!(out, "Posted test report to {key}")?;
    Ok(())
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
